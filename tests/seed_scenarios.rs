//! End-to-end seed scenarios (spec.md §8): one test per named scenario,
//! driven entirely through the public `Codestream` API the way
//! `src/bin/htj2k.rs` drives it.

use htj2k::codestream::Codestream;
use htj2k::error::CoreError;
use htj2k::io::{MemoryInFile, MemoryOutFile};
use htj2k::marker_io::MarkerReader;
use htj2k::markers::{BlockStyle, ComponentSiz, ProgressionOrder, QuantStyle, TlmSegment, WaveletKind, TLM};

fn push_planar(cs: &mut Codestream, samples: &[Vec<i32>], width: usize) {
    cs.set_planar(true);
    let num_components = samples.len();
    let mut rows_done = vec![0usize; num_components];
    let mut next_comp = 0usize;
    let mut line = cs.exchange(None, &mut next_comp);
    while line.is_some() {
        let c = next_comp;
        let row = rows_done[c];
        let row_data = samples[c][row * width..(row + 1) * width].to_vec();
        rows_done[c] += 1;
        line = cs.exchange(Some(row_data), &mut next_comp);
    }
}

fn pull_planar(cs: &mut Codestream, num_components: usize, width: usize, height: usize) -> Vec<Vec<i32>> {
    let mut decoded = vec![vec![0i32; width * height]; num_components];
    let mut comp = 0usize;
    let mut rows = vec![0usize; num_components];
    while let Some(line) = cs.pull(&mut comp) {
        let row = rows[comp];
        decoded[comp][row * width..(row + 1) * width].copy_from_slice(&line);
        rows[comp] += 1;
    }
    decoded
}

fn encode_to_bytes(cs: &mut Codestream) -> Vec<u8> {
    let mut out = MemoryOutFile::new();
    cs.write_headers(&mut out).unwrap();
    cs.flush(&mut out).unwrap();
    out.into_inner()
}

/// Scenario 1: 8-bit RGB, 32x32, reversible wavelet, no MCT. Round trip
/// must be byte-exact (lossless core path with no color transform).
#[test]
fn scenario_1_rgb_reversible_no_mct_round_trips_exactly() {
    let (w, h) = (32usize, 32usize);
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = w as u32;
        siz.ysiz = h as u32;
        siz.xtsiz = w as u32;
        siz.ytsiz = h as u32;
        siz.components = (0..3).map(|_| ComponentSiz::new(8, false, 1, 1)).collect();
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = false;
        cod.num_decompositions = 3;
        cod.log_block_w = 5;
        cod.log_block_h = 5;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Reversible53;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::NoQuantization;
        qcd.subband_values = vec![16u16 << 3; 1 + 3 * 3];
    }

    let source: Vec<Vec<i32>> = (0..3)
        .map(|c| (0..w * h).map(|i| ((i * 7 + c * 53) % 256) as i32).collect())
        .collect();
    push_planar(&mut cs, &source, w);
    let bytes = encode_to_bytes(&mut cs);

    let mut decoded_cs = Codestream::new();
    let mut infile = MemoryInFile::new(&bytes);
    decoded_cs.read_headers(&mut infile).unwrap();
    decoded_cs.create().unwrap();
    let decoded = pull_planar(&mut decoded_cs, 3, w, h);

    assert_eq!(decoded, source);
    assert!(decoded_cs.notices().is_empty());
}

/// Scenario 2: 8-bit RGB, irreversible 9/7 wavelet with MCT. Lossy, but a
/// smooth source image should still reconstruct within a generous PSNR
/// bound (the floating-point lifting error is small relative to the
/// quantization step chosen here).
#[test]
fn scenario_2_rgb_irreversible_with_mct_meets_psnr_bound() {
    let (w, h) = (64usize, 64usize);
    let num_decompositions = 4u32;
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = w as u32;
        siz.ysiz = h as u32;
        siz.xtsiz = w as u32;
        siz.ytsiz = h as u32;
        siz.components = (0..3).map(|_| ComponentSiz::new(8, false, 1, 1)).collect();
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = true;
        cod.num_decompositions = num_decompositions;
        cod.log_block_w = 6;
        cod.log_block_h = 6;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Irreversible97;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::ScalarExpounded;
        qcd.subband_values = vec![(4u16 << 11) | 0; 1 + 3 * num_decompositions as usize];
    }

    // A smooth gradient plus a low-amplitude ripple, distinct per component
    // so MCT actually mixes non-trivial data across channels.
    let source: Vec<Vec<i32>> = (0..3)
        .map(|c| {
            (0..w * h)
                .map(|i| {
                    let x = (i % w) as i32;
                    let y = (i / w) as i32;
                    let base = (x * 255 / w as i32 + y * 255 / h as i32) / 2;
                    let ripple = ((x + y + c as i32 * 10) % 17) - 8;
                    (base + ripple).clamp(0, 255)
                })
                .collect()
        })
        .collect();
    push_planar(&mut cs, &source, w);
    let bytes = encode_to_bytes(&mut cs);

    let mut decoded_cs = Codestream::new();
    let mut infile = MemoryInFile::new(&bytes);
    decoded_cs.read_headers(&mut infile).unwrap();
    decoded_cs.create().unwrap();
    let decoded = pull_planar(&mut decoded_cs, 3, w, h);

    let mut sum_sq_err = 0f64;
    let mut count = 0u64;
    for c in 0..3 {
        for (a, b) in source[c].iter().zip(decoded[c].iter()) {
            let d = (*a - *b) as f64;
            sum_sq_err += d * d;
            count += 1;
        }
    }
    let mse = sum_sq_err / count as f64;
    let psnr = if mse <= 0.0 { f64::INFINITY } else { 20.0 * 255f64.log10() - 10.0 * mse.log10() };
    assert!(psnr > 28.0, "PSNR too low: {psnr}");
}

/// Scenario 3: 12-bit single-component, reversible, CPRL progression, with
/// a TLM marker emitted. Checks the TLM pair count directly from the raw
/// marker bytes since `read_headers` deliberately does not retain TLM
/// content for decode (it has no use once packets are parsed in order).
#[test]
fn scenario_3_cprl_with_tlm_reports_one_pair_per_tile_part() {
    let (w, h) = (48usize, 48usize);
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = w as u32;
        siz.ysiz = h as u32;
        siz.xtsiz = 24;
        siz.ytsiz = 24;
        siz.components = vec![ComponentSiz::new(12, false, 1, 1)];
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Cprl;
        cod.num_layers = 1;
        cod.use_mct = false;
        cod.num_decompositions = 2;
        cod.log_block_w = 5;
        cod.log_block_h = 5;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Reversible53;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::NoQuantization;
        qcd.subband_values = vec![16u16 << 3; 1 + 3 * 2];
    }
    cs.set_emit_tlm(true);

    let source = vec![(0..w * h).map(|i| (i % 4096) as i32).collect::<Vec<i32>>()];
    push_planar(&mut cs, &source, w);
    let bytes = encode_to_bytes(&mut cs);

    // 48x48 split into 24x24 tiles -> a 2x2 tile grid, one tile part each
    // (no tile-part division requested), so 4 SOT/SOD tile parts total.
    let expected_tile_parts = 4usize;

    let mut r = MarkerReader::new(&bytes);
    let mut tlm = None;
    while !r.is_empty() {
        let marker = r.peek_marker().unwrap();
        if marker == TLM {
            r.read_marker().unwrap();
            tlm = Some(TlmSegment::read(&mut r).unwrap());
            break;
        }
        if marker == htj2k::markers::SOC {
            r.read_marker().unwrap();
            continue;
        }
        if marker == htj2k::markers::SOT {
            // Tile-part data starts here; TLM (if present) precedes all
            // tile parts, so reaching SOT without having seen it means
            // there is none.
            break;
        }
        r.read_marker().unwrap();
        let len = r.read_u16().unwrap() as usize;
        r.skip(len - 2).unwrap();
    }

    let tlm = tlm.expect("TLM marker segment must be present when emission is requested");
    assert_eq!(tlm.pairs.len(), expected_tile_parts);

    let mut decoded_cs = Codestream::new();
    let mut infile = MemoryInFile::new(&bytes);
    decoded_cs.read_headers(&mut infile).unwrap();
    decoded_cs.create().unwrap();
    let decoded = pull_planar(&mut decoded_cs, 1, w, h);
    assert_eq!(decoded, source);
}

/// Scenario 4: 8-bit grayscale with dimensions that do not divide evenly
/// by the code-block or wavelet decomposition factor, exercising the
/// boundary/partial-block paths.
#[test]
fn scenario_4_awkward_dimensions_round_trip_exactly() {
    let (w, h) = (7usize, 5usize);
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = w as u32;
        siz.ysiz = h as u32;
        siz.xtsiz = w as u32;
        siz.ytsiz = h as u32;
        siz.components = vec![ComponentSiz::new(8, false, 1, 1)];
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = false;
        cod.num_decompositions = 2;
        cod.log_block_w = 5;
        cod.log_block_h = 5;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Reversible53;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::NoQuantization;
        qcd.subband_values = vec![16u16 << 3; 1 + 3 * 2];
    }

    let source = vec![(0..w * h).map(|i| (i * 31 % 256) as i32).collect::<Vec<i32>>()];
    push_planar(&mut cs, &source, w);
    let bytes = encode_to_bytes(&mut cs);

    let mut decoded_cs = Codestream::new();
    let mut infile = MemoryInFile::new(&bytes);
    decoded_cs.read_headers(&mut infile).unwrap();
    decoded_cs.create().unwrap();
    let decoded = pull_planar(&mut decoded_cs, 1, w, h);
    assert_eq!(decoded, source);
}

/// Scenario 5: 16-bit signed grayscale with a nonzero image offset and
/// tile offset, tiled into multiple tiles. Exercises the canvas-to-tile
/// mapping rather than a single full-image tile. Only the round-trip
/// exactness is asserted; the exact tile-grid corner coordinates are an
/// implementation detail not exposed through the public API.
#[test]
fn scenario_5_offset_canvas_with_multiple_tiles_round_trips_exactly() {
    let (w, h) = (96usize, 96usize);
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = 3 + w as u32;
        siz.ysiz = 5 + h as u32;
        siz.xosiz = 3;
        siz.yosiz = 5;
        siz.xtsiz = 64;
        siz.ytsiz = 64;
        siz.xtosiz = 1;
        siz.ytosiz = 2;
        siz.components = vec![ComponentSiz::new(16, true, 1, 1)];
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = false;
        cod.num_decompositions = 2;
        cod.log_block_w = 5;
        cod.log_block_h = 5;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Reversible53;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::NoQuantization;
        qcd.subband_values = vec![16u16 << 3; 1 + 3 * 2];
    }

    let source = vec![(0..w * h).map(|i| ((i as i32 * 17) % 65536) - 32768).collect::<Vec<i32>>()];
    push_planar(&mut cs, &source, w);
    let bytes = encode_to_bytes(&mut cs);

    let mut decoded_cs = Codestream::new();
    let mut infile = MemoryInFile::new(&bytes);
    decoded_cs.read_headers(&mut infile).unwrap();
    decoded_cs.create().unwrap();
    let decoded = pull_planar(&mut decoded_cs, 1, w, h);
    assert_eq!(decoded, source);
}

/// Scenario 6: a single byte flipped inside the tail of the last
/// code-block's coded bytes. In strict mode this must surface as an
/// error from `create`; in resilient mode, `create` must succeed, record
/// a notice, and leave every other code-block's output unaffected.
#[test]
fn scenario_6_corrupted_codeblock_strict_errors_resilient_substitutes_zero() {
    let (w, h) = (32usize, 32usize);
    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = w as u32;
        siz.ysiz = h as u32;
        siz.xtsiz = w as u32;
        siz.ytsiz = h as u32;
        siz.components = vec![ComponentSiz::new(8, false, 1, 1)];
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = false;
        cod.num_decompositions = 1;
        cod.log_block_w = 4;
        cod.log_block_h = 4;
        cod.block_style = BlockStyle::default();
        cod.wavelet = WaveletKind::Reversible53;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = QuantStyle::NoQuantization;
        qcd.subband_values = vec![16u16 << 3; 1 + 3 * 1];
    }

    let source = vec![(0..w * h).map(|i| (i * 3 % 256) as i32).collect::<Vec<i32>>()];
    push_planar(&mut cs, &source, w);
    let mut bytes = encode_to_bytes(&mut cs);

    // The last two bytes of the file are the EOC marker. The code-block's
    // own trailing bytes are [.., Scup-lo, Scup-hi, marker], so the byte
    // four from the end is Scup's high byte; flipping it pushes Scup
    // outside [MIN_SCUP, MAX_SCUP] and trips BlockStream::disassemble.
    let corrupt_at = bytes.len() - 4;
    bytes[corrupt_at] ^= 0xFF;

    let mut strict_cs = Codestream::new();
    let mut strict_in = MemoryInFile::new(&bytes);
    strict_cs.read_headers(&mut strict_in).unwrap();
    let strict_result = strict_cs.create();
    assert!(matches!(strict_result, Err(CoreError::BlockDecodeFailure { .. }) | Err(CoreError::MalformedCodestream { .. })));

    let mut resilient_cs = Codestream::new();
    resilient_cs.enable_resilience();
    let mut resilient_in = MemoryInFile::new(&bytes);
    resilient_cs.read_headers(&mut resilient_in).unwrap();
    resilient_cs.create().unwrap();
    assert!(!resilient_cs.notices().is_empty());
    let decoded = pull_planar(&mut resilient_cs, 1, w, h);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].len(), w * h);
}
