//! htj2k CLI - thin example driver over the `htj2k` library.
//!
//! This is deliberately not a general image tool: it reads/writes 8-bit
//! binary PGM (grayscale) and PPM (RGB) files only, line by line, through
//! [`htj2k::codestream::Codestream::exchange`]/[`htj2k::codestream::Codestream::pull`].
//! Anything fancier (TIFF, JP2 boxes, ICC profiles) is left to callers
//! building on the library directly.

use clap::{Parser, Subcommand};
use htj2k::codestream::{Codestream, TilePartDivision};
use htj2k::io::{OsInFile, OsOutFile};
use htj2k::markers::{BlockStyle, ComponentSiz, ProgressionOrder, QuantStyle, WaveletKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "htj2k")]
#[command(author = "htj2k-rs contributors")]
#[command(version)]
#[command(about = "Example HTJ2K (ITU-T T.814 / ISO 15444-15) encoder/decoder", long_about = None)]
#[command(after_help = "EXAMPLES:
    htj2k encode -i image.pgm -o image.jph
    htj2k encode -i image.ppm -o image.jph --lossy --layers 1
    htj2k decode -i image.jph -o image.pgm
    htj2k info -i image.jph")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a binary PGM/PPM file to an HTJ2K codestream
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long, help = "Path to a binary PGM (P5) or PPM (P6) file")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the encoded .jph codestream")]
        output: PathBuf,
        /// Use the 9/7 irreversible wavelet instead of the 5/3 reversible one
        #[arg(long)]
        lossy: bool,
        /// Number of wavelet decomposition levels
        #[arg(long, default_value = "5")]
        decompositions: u32,
        /// Apply the multi-component color transform (RGB input only)
        #[arg(long)]
        mct: bool,
        /// Emit a TLM marker recording every tile-part's length
        #[arg(long)]
        tlm: bool,
        /// Prefix every packet with an SOP marker carrying its sequence number
        #[arg(long)]
        sop: bool,
        /// Append an EPH marker after every packet
        #[arg(long)]
        eph: bool,
    },

    /// Decode an HTJ2K codestream to a binary PGM/PPM file
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the .jph codestream")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the decoded PGM/PPM file")]
        output: PathBuf,
        /// Skip this many of the finest resolution levels on reconstruction
        #[arg(long, default_value = "0")]
        skip_resolutions: u32,
    },

    /// Print the main header parameters of an HTJ2K codestream
    #[command(visible_alias = "i")]
    Info {
        #[arg(short, long, help = "Path to the .jph codestream")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::init();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            lossy,
            decompositions,
            mct,
            tlm,
            sop,
            eph,
        } => encode(&input, &output, lossy, decompositions, mct, tlm, sop, eph),
        Commands::Decode {
            input,
            output,
            skip_resolutions,
        } => decode(&input, &output, skip_resolutions),
        Commands::Info { input } => info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn encode(
    input: &PathBuf,
    output: &PathBuf,
    lossy: bool,
    decompositions: u32,
    mct: bool,
    tlm: bool,
    sop: bool,
    eph: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (samples, width, height, num_components) = read_pnm(input)?;

    let mut cs = Codestream::new();
    {
        let siz = cs.access_siz();
        siz.xsiz = width;
        siz.ysiz = height;
        siz.xtsiz = width;
        siz.ytsiz = height;
        siz.components = (0..num_components).map(|_| ComponentSiz::new(8, false, 1, 1)).collect();
    }
    {
        let cod = cs.access_cod();
        cod.progression_order = ProgressionOrder::Lrcp;
        cod.num_layers = 1;
        cod.use_mct = mct;
        cod.num_decompositions = decompositions;
        cod.log_block_w = 6;
        cod.log_block_h = 6;
        cod.block_style = BlockStyle::default();
        cod.wavelet = if lossy { WaveletKind::Irreversible97 } else { WaveletKind::Reversible53 };
        cod.sop_enabled = sop;
        cod.eph_enabled = eph;
    }
    {
        let qcd = cs.access_qcd();
        qcd.guard_bits = 2;
        qcd.style = if lossy { QuantStyle::ScalarExpounded } else { QuantStyle::NoQuantization };
        let num_subbands = 1 + 3 * decompositions as usize;
        qcd.subband_values = if lossy {
            vec![(6u16 << 11) | 0; num_subbands]
        } else {
            vec![16u16 << 3; num_subbands]
        };
    }
    cs.set_tile_part_division(TilePartDivision::None);
    cs.set_emit_tlm(tlm);

    cs.set_planar(false);
    let mut next_comp = 0usize;
    let mut line = cs.exchange(None, &mut next_comp);
    let mut row = 0usize;
    while let Some(buf) = line {
        let width = buf.len();
        let mut filled = vec![0i32; width];
        for (x, slot) in filled.iter_mut().enumerate() {
            *slot = samples[next_comp][row * width + x] as i32;
        }
        if next_comp == num_components - 1 {
            row += 1;
        }
        line = cs.exchange(Some(filled), &mut next_comp);
    }

    let mut out = OsOutFile::create(output)?;
    cs.write_headers(&mut out)?;
    cs.flush(&mut out)?;

    println!("Encoded {width}x{height} ({num_components} components) to {output:?}");
    Ok(())
}

fn decode(input: &PathBuf, output: &PathBuf, skip_resolutions: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut infile = OsInFile::open(input)?;
    let mut cs = Codestream::new();
    cs.read_headers(&mut infile)?;
    if skip_resolutions > 0 {
        cs.restrict_input_resolution(skip_resolutions, skip_resolutions)?;
    }
    cs.create()?;

    let width = cs.access_siz().xsiz as usize;
    let height = cs.access_siz().ysiz as usize;
    let num_components = cs.access_siz().num_components();

    let mut planes = vec![vec![0u8; width * height]; num_components];
    let mut comp = 0usize;
    let mut row = 0usize;
    while let Some(line) = cs.pull(&mut comp) {
        for (x, &v) in line.iter().enumerate() {
            planes[comp][row * width + x] = v.clamp(0, 255) as u8;
        }
        if comp == num_components - 1 {
            row += 1;
        }
    }

    write_pnm(output, &planes, width, height, num_components)?;
    println!("Decoded {width}x{height} ({num_components} components) to {output:?}");
    Ok(())
}

fn info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut infile = OsInFile::open(input)?;
    let mut cs = Codestream::new();
    cs.read_headers(&mut infile)?;

    let siz = cs.access_siz();
    println!("File: {input:?}");
    println!("  Dimensions:  {}x{}", siz.xsiz, siz.ysiz);
    println!("  Tile size:   {}x{}", siz.xtsiz, siz.ytsiz);
    println!("  Components:  {}", siz.num_components());
    println!("  HTJ2K:       {}", siz.is_htj2k());
    let cod = cs.access_cod();
    println!("  Wavelet:     {}", if cod.wavelet.is_reversible() { "5/3 reversible" } else { "9/7 irreversible" });
    println!("  Levels:      {}", cod.num_decompositions);
    println!("  Layers:      {}", cod.num_layers);
    println!("  MCT:         {}", cod.use_mct);
    Ok(())
}

/// Reads a binary PGM (P5, grayscale) or PPM (P6, RGB) file into one
/// interleaved-free plane per component.
fn read_pnm(path: &PathBuf) -> Result<(Vec<Vec<u8>>, u32, u32, usize), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let mut cursor = 0usize;
    let magic = read_pnm_token(&data, &mut cursor)?;
    let num_components = match magic.as_str() {
        "P5" => 1,
        "P6" => 3,
        other => return Err(format!("unsupported PNM magic {other:?}").into()),
    };
    let width: u32 = read_pnm_token(&data, &mut cursor)?.parse()?;
    let height: u32 = read_pnm_token(&data, &mut cursor)?.parse()?;
    let maxval: u32 = read_pnm_token(&data, &mut cursor)?.parse()?;
    if maxval != 255 {
        return Err("only 8-bit PNM files are supported".into());
    }
    let pixel_count = width as usize * height as usize;
    let body = &data[cursor..];
    if body.len() < pixel_count * num_components {
        return Err("PNM body shorter than its header declares".into());
    }
    let mut planes = vec![vec![0u8; pixel_count]; num_components];
    for i in 0..pixel_count {
        for (c, plane) in planes.iter_mut().enumerate() {
            plane[i] = body[i * num_components + c];
        }
    }
    Ok((planes, width, height, num_components))
}

fn read_pnm_token(data: &[u8], cursor: &mut usize) -> Result<String, Box<dyn std::error::Error>> {
    while *cursor < data.len() && data[*cursor].is_ascii_whitespace() {
        *cursor += 1;
    }
    let start = *cursor;
    while *cursor < data.len() && !data[*cursor].is_ascii_whitespace() {
        *cursor += 1;
    }
    if start == *cursor {
        return Err("unexpected end of PNM header".into());
    }
    let token = std::str::from_utf8(&data[start..*cursor])?.to_string();
    *cursor += 1;
    Ok(token)
}

fn write_pnm(
    path: &PathBuf,
    planes: &[Vec<u8>],
    width: usize,
    height: usize,
    num_components: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let magic = match num_components {
        1 => "P5",
        3 => "P6",
        other => return Err(format!("unsupported component count {other} for PNM output").into()),
    };
    let mut out = format!("{magic}\n{width} {height}\n255\n").into_bytes();
    for i in 0..width * height {
        for plane in planes {
            out.push(plane[i]);
        }
    }
    std::fs::write(path, out)?;
    Ok(())
}
