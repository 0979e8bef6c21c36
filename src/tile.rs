//! Tile geometry, sample conversion, and tile-part packet sequencing
//! (spec.md §4.1/§4.2/§4.6/§4.7).
//!
//! A [`Tile`] owns one [`TileComponent`] per image component and knows
//! nothing about the codestream's line-push/pull contract or file layout;
//! [`crate::codestream::Codestream`] gathers this tile's slice of the
//! full-canvas sample buffers, hands them to [`Tile::encode_tile`], and
//! later reassembles [`Tile::decode_tile`]'s output back into the canvas.

use crate::color_transform::{forward_ict, forward_rct, inverse_ict, inverse_rct};
use crate::error::{config_error, malformed, CoreError, Notice};
use crate::geometry::Rect;
use crate::markers::{ParamCod, ParamQcd, ParamSiz, WaveletKind};
use crate::progression::{enumerate_packets, PacketId, TileShape};
use crate::tile_component::TileComponent;

/// Upper bound handed to the HT coder for MagSgn magnitude bit-width; the
/// binding constraint in practice is always the per-subband Kmax derived
/// from QCD (spec.md §4.4), which every call below clamps against.
const U_BITS_CAP: u8 = 31;

pub struct Tile {
    pub index: u16,
    pub rect: Rect,
    pub component_rects: Vec<Rect>,
    pub components: Vec<TileComponent>,
}

impl Tile {
    pub fn new(index: u16, rect: Rect, siz: &ParamSiz, cod: &ParamCod) -> Self {
        let mut component_rects = Vec::with_capacity(siz.components.len());
        let mut components = Vec::with_capacity(siz.components.len());
        for comp in &siz.components {
            let crect = rect.project_to_component(comp.xrsiz as u32, comp.yrsiz as u32);
            components.push(TileComponent::new_geometry(
                crect.w() as usize,
                crect.h() as usize,
                cod.num_decompositions,
                cod.log_block_w,
                cod.log_block_h,
            ));
            component_rects.push(crect);
        }
        Self {
            index,
            rect,
            component_rects,
            components,
        }
    }

    fn shape(&self, cod: &ParamCod) -> TileShape {
        let num_resolutions = cod.num_decompositions + 1;
        TileShape {
            num_layers: 1,
            num_resolutions,
            num_components: self.components.len() as u32,
            // One precinct per resolution (spec.md §3.3's simplest partition).
            precinct_counts: vec![vec![1; num_resolutions as usize]; self.components.len()],
        }
    }

    /// Runs sample conversion, the optional multi-component color
    /// transform, and the forward DWT + HT coding for every component of
    /// this tile (spec.md §4.2/§4.3/§4.5). `raw[c]` holds this tile's
    /// `component_rects[c]`-sized slab of raw caller samples.
    pub fn encode_tile(&mut self, raw: &[Vec<i32>], siz: &ParamSiz, cod: &ParamCod, qcd: &ParamQcd) -> Result<(), CoreError> {
        let n = siz.num_components();
        if cod.use_mct && n < 3 {
            return Err(config_error!(
                200,
                "multi-component transform enabled with fewer than 3 components"
            ));
        }
        match cod.wavelet {
            WaveletKind::Reversible53 => {
                let mut converted: Vec<Vec<i32>> = (0..n)
                    .map(|c| {
                        let comp = &siz.components[c];
                        raw[c]
                            .iter()
                            .map(|&v| to_reversible_sample(v, comp.bit_depth(), comp.is_signed()))
                            .collect()
                    })
                    .collect();
                if cod.use_mct {
                    let (y, cb, cr) = forward_rct(&converted[0], &converted[1], &converted[2]);
                    converted[0] = y;
                    converted[1] = cb;
                    converted[2] = cr;
                }
                for (c, component) in self.components.iter_mut().enumerate() {
                    component.encode_reversible(&converted[c], qcd, U_BITS_CAP);
                }
            }
            WaveletKind::Irreversible97 => {
                let mut converted: Vec<Vec<f32>> = (0..n)
                    .map(|c| {
                        let comp = &siz.components[c];
                        raw[c]
                            .iter()
                            .map(|&v| to_irreversible_sample(v, comp.bit_depth(), comp.is_signed()))
                            .collect()
                    })
                    .collect();
                if cod.use_mct {
                    let (y, cb, cr) = forward_ict(&converted[0], &converted[1], &converted[2]);
                    converted[0] = y;
                    converted[1] = cb;
                    converted[2] = cr;
                }
                for (c, component) in self.components.iter_mut().enumerate() {
                    component.encode_irreversible(&converted[c], qcd, U_BITS_CAP);
                }
            }
        }
        Ok(())
    }

    /// Decodes every component's subbands and runs the inverse DWT, the
    /// inverse color transform (if enabled), and inverse sample conversion,
    /// reconstructing this tile's raw per-component sample slabs.
    /// `resolutions_to_reconstruct` caps the inverse DWT at that many
    /// levels instead of every `cod.num_decompositions` (spec.md §4.1's
    /// `restrict_input_resolution`); pass `cod.num_decompositions` for a
    /// full reconstruction.
    ///
    /// Each code-block's decode failure (spec.md §4.5) is routed through
    /// `resilient`: fatal immediately in strict mode (the first error
    /// returned aborts the whole tile), or zero-substituted with a note
    /// pushed to `notices` while every other code-block decodes normally
    /// (spec.md §7).
    pub fn decode_tile(
        &self,
        siz: &ParamSiz,
        cod: &ParamCod,
        qcd: &ParamQcd,
        resolutions_to_reconstruct: u32,
        resilient: bool,
        notices: &mut Vec<Notice>,
    ) -> Result<Vec<Vec<i32>>, CoreError> {
        let n = siz.num_components();
        match cod.wavelet {
            WaveletKind::Reversible53 => {
                let mut comps: Vec<Vec<i32>> = self
                    .components
                    .iter()
                    .map(|tc| Ok(tc.decode_reversible_to(qcd, U_BITS_CAP, resolutions_to_reconstruct, resilient, notices)?.0))
                    .collect::<Result<_, CoreError>>()?;
                if cod.use_mct && n >= 3 {
                    let (r, g, b) = inverse_rct(&comps[0], &comps[1], &comps[2]);
                    comps[0] = r;
                    comps[1] = g;
                    comps[2] = b;
                }
                Ok((0..n)
                    .map(|c| {
                        let comp = &siz.components[c];
                        comps[c]
                            .iter()
                            .map(|&v| from_reversible_sample(v, comp.bit_depth(), comp.is_signed()))
                            .collect()
                    })
                    .collect())
            }
            WaveletKind::Irreversible97 => {
                let mut comps: Vec<Vec<f32>> = self
                    .components
                    .iter()
                    .map(|tc| Ok(tc.decode_irreversible_to(qcd, U_BITS_CAP, resolutions_to_reconstruct, resilient, notices)?.0))
                    .collect::<Result<_, CoreError>>()?;
                if cod.use_mct && n >= 3 {
                    let (r, g, b) = inverse_ict(&comps[0], &comps[1], &comps[2]);
                    comps[0] = r;
                    comps[1] = g;
                    comps[2] = b;
                }
                Ok((0..n)
                    .map(|c| {
                        let comp = &siz.components[c];
                        comps[c]
                            .iter()
                            .map(|&v| from_irreversible_sample(v, comp.bit_depth(), comp.is_signed()))
                            .collect()
                    })
                    .collect())
            }
        }
    }

    /// Returns this tile's packets in progression order as `(PacketId,
    /// bytes)` pairs (spec.md §4.6/§4.7), each already the complete
    /// packet-header-plus-body byte sequence [`TileComponent::encode_packet`]
    /// produces, optionally wrapped in a leading SOP marker and/or a
    /// trailing EPH marker per `cod`'s coding-style bits (spec.md §4.6,
    /// line 171).
    pub fn encode_packets(&mut self, cod: &ParamCod) -> Vec<(PacketId, Vec<u8>)> {
        let shape = self.shape(cod);
        let mut sop_sequence: u16 = 0;
        enumerate_packets(cod.progression_order, &shape)
            .into_iter()
            .map(|id| {
                let body = self.components[id.component as usize].encode_packet(id.resolution);
                let mut bytes = Vec::with_capacity(body.len() + 8);
                if cod.sop_enabled {
                    bytes.extend_from_slice(&crate::markers::SOP.to_be_bytes());
                    bytes.extend_from_slice(&4u16.to_be_bytes());
                    bytes.extend_from_slice(&sop_sequence.to_be_bytes());
                    sop_sequence = sop_sequence.wrapping_add(1);
                }
                bytes.extend_from_slice(&body);
                if cod.eph_enabled {
                    bytes.extend_from_slice(&crate::markers::EPH.to_be_bytes());
                }
                (id, bytes)
            })
            .collect()
    }

    /// Feeds `payload` (this tile's concatenated tile-part bytes, in file
    /// order) through every packet in the same progression-order sequence
    /// [`Tile::encode_packets`] produced, stripping the SOP/EPH markers
    /// [`Tile::encode_packets`] wrapped each packet in when `cod` requests
    /// them.
    pub fn decode_packets(&mut self, cod: &ParamCod, payload: &[u8]) -> Result<(), CoreError> {
        let shape = self.shape(cod);
        let order = enumerate_packets(cod.progression_order, &shape);
        let mut offset = 0usize;
        let mut expected_sop: u16 = 0;
        for id in order {
            if cod.sop_enabled {
                let header = payload
                    .get(offset..offset + 6)
                    .ok_or_else(|| malformed!(202, "tile payload ended before an expected SOP marker"))?;
                let marker = u16::from_be_bytes([header[0], header[1]]);
                if marker != crate::markers::SOP {
                    return Err(malformed!(
                        203,
                        "expected SOP marker before packet, found {marker:#06x}"
                    ));
                }
                let lsop = u16::from_be_bytes([header[2], header[3]]);
                if lsop != 4 {
                    return Err(malformed!(204, "SOP marker length {lsop} is not 4"));
                }
                let nsop = u16::from_be_bytes([header[4], header[5]]);
                if nsop != expected_sop {
                    log::warn!(
                        "SOP sequence number {nsop} does not match the expected {expected_sop}"
                    );
                }
                expected_sop = expected_sop.wrapping_add(1);
                offset += 6;
            }
            let remaining = payload
                .get(offset..)
                .ok_or_else(|| malformed!(201, "tile payload ended before all packets were read"))?;
            let consumed = self.components[id.component as usize].decode_packet(id.resolution, remaining)?;
            offset += consumed;
            if cod.eph_enabled {
                let marker_bytes = payload
                    .get(offset..offset + 2)
                    .ok_or_else(|| malformed!(205, "tile payload ended before an expected EPH marker"))?;
                let marker = u16::from_be_bytes([marker_bytes[0], marker_bytes[1]]);
                if marker != crate::markers::EPH {
                    return Err(malformed!(
                        206,
                        "expected EPH marker after packet, found {marker:#06x}"
                    ));
                }
                offset += 2;
            }
        }
        Ok(())
    }
}

/// Forward sample conversion for the reversible path (spec.md §4.2):
/// signed samples pass through verbatim, unsigned samples are level-
/// shifted into a centered signed representation.
fn to_reversible_sample(raw: i32, bit_depth: u32, signed: bool) -> i32 {
    if signed {
        raw
    } else {
        raw - (1i32 << (bit_depth - 1))
    }
}

/// Inverse of [`to_reversible_sample`], clamped to the component's legal
/// range (spec.md §4.2 decode conversion).
fn from_reversible_sample(v: i32, bit_depth: u32, signed: bool) -> i32 {
    let x = if signed { v } else { v + (1i32 << (bit_depth - 1)) };
    clamp_sample(x, bit_depth, signed)
}

/// Forward sample conversion for the irreversible path (spec.md §4.2):
/// signed samples are scaled by `1/2^B` into `[-0.5, 0.5)`; unsigned
/// samples are level-shifted the same way the reversible path shifts them,
/// then scaled identically.
fn to_irreversible_sample(raw: i32, bit_depth: u32, signed: bool) -> f32 {
    let scale = (1u64 << bit_depth) as f32;
    let centered = if signed { raw } else { raw - (1i32 << (bit_depth - 1)) };
    centered as f32 / scale
}

/// Inverse of [`to_irreversible_sample`], clamped to the component's legal
/// range.
fn from_irreversible_sample(v: f32, bit_depth: u32, signed: bool) -> i32 {
    let scale = (1u64 << bit_depth) as f32;
    let centered = (v * scale).round() as i32;
    let x = if signed { centered } else { centered + (1i32 << (bit_depth - 1)) };
    clamp_sample(x, bit_depth, signed)
}

fn clamp_sample(x: i32, bit_depth: u32, signed: bool) -> i32 {
    if signed {
        let lo = -(1i64 << (bit_depth - 1));
        let hi = (1i64 << (bit_depth - 1)) - 1;
        x.clamp(lo as i32, hi as i32)
    } else {
        let hi = (1i64 << bit_depth) - 1;
        x.clamp(0, hi as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{BlockStyle, ComponentSiz, ProgressionOrder, QuantStyle};

    fn siz_gray(bit_depth: u32, signed: bool, w: u32, h: u32) -> ParamSiz {
        ParamSiz {
            rsiz: crate::constants::RSIZ_HTJ2K_BIT,
            xsiz: w,
            ysiz: h,
            xosiz: 0,
            yosiz: 0,
            xtsiz: w,
            ytsiz: h,
            xtosiz: 0,
            ytosiz: 0,
            components: vec![ComponentSiz::new(bit_depth, signed, 1, 1)],
        }
    }

    fn cod_reversible(num_decompositions: u32) -> ParamCod {
        ParamCod {
            progression_order: ProgressionOrder::Lrcp,
            num_layers: 1,
            use_mct: false,
            num_decompositions,
            log_block_w: 5,
            log_block_h: 5,
            block_style: BlockStyle::default(),
            wavelet: WaveletKind::Reversible53,
            precinct_sizes: None,
            sop_enabled: false,
            eph_enabled: false,
        }
    }

    fn qcd_reversible(num_decompositions: u32) -> ParamQcd {
        ParamQcd {
            guard_bits: 2,
            style: QuantStyle::NoQuantization,
            subband_values: vec![16 << 3; 1 + 3 * num_decompositions as usize],
        }
    }

    #[test]
    fn sample_conversion_round_trips_unsigned() {
        for raw in [0, 1, 127, 128, 255] {
            let centered = to_reversible_sample(raw, 8, false);
            assert_eq!(from_reversible_sample(centered, 8, false), raw);
        }
    }

    #[test]
    fn sample_conversion_round_trips_signed() {
        for raw in [-128, -1, 0, 1, 127] {
            let centered = to_reversible_sample(raw, 8, true);
            assert_eq!(from_reversible_sample(centered, 8, true), raw);
        }
    }

    #[test]
    fn tile_round_trips_through_packets() {
        let (w, h) = (16, 12);
        let siz = siz_gray(8, false, w, h);
        let cod = cod_reversible(2);
        let qcd = qcd_reversible(2);
        let rect = Rect::from_corners(0, 0, w, h);

        let raw: Vec<i32> = (0..(w * h) as i32).map(|v| v % 256).collect();
        let mut enc_tile = Tile::new(0, rect, &siz, &cod);
        enc_tile.encode_tile(&[raw.clone()], &siz, &cod, &qcd).unwrap();
        let packets = enc_tile.encode_packets(&cod);
        let payload: Vec<u8> = packets.iter().flat_map(|(_, b)| b.clone()).collect();

        let mut dec_tile = Tile::new(0, rect, &siz, &cod);
        dec_tile.decode_packets(&cod, &payload).unwrap();
        let mut notices = Vec::new();
        let decoded = dec_tile.decode_tile(&siz, &cod, &qcd, cod.num_decompositions, false, &mut notices).unwrap();
        assert_eq!(decoded[0], raw);
    }

    #[test]
    fn tile_round_trips_through_packets_with_sop_and_eph() {
        let (w, h) = (16, 12);
        let siz = siz_gray(8, false, w, h);
        let mut cod = cod_reversible(2);
        cod.sop_enabled = true;
        cod.eph_enabled = true;
        let qcd = qcd_reversible(2);
        let rect = Rect::from_corners(0, 0, w, h);

        let raw: Vec<i32> = (0..(w * h) as i32).map(|v| v % 256).collect();
        let mut enc_tile = Tile::new(0, rect, &siz, &cod);
        enc_tile.encode_tile(&[raw.clone()], &siz, &cod, &qcd).unwrap();
        let packets = enc_tile.encode_packets(&cod);
        let payload: Vec<u8> = packets.iter().flat_map(|(_, b)| b.clone()).collect();

        let mut dec_tile = Tile::new(0, rect, &siz, &cod);
        dec_tile.decode_packets(&cod, &payload).unwrap();
        let mut notices = Vec::new();
        let decoded = dec_tile.decode_tile(&siz, &cod, &qcd, cod.num_decompositions, false, &mut notices).unwrap();
        assert_eq!(decoded[0], raw);
    }

    #[test]
    fn decode_packets_rejects_missing_sop() {
        let (w, h) = (16, 12);
        let siz = siz_gray(8, false, w, h);
        let cod_write = cod_reversible(2);
        let mut cod_read = cod_write.clone();
        cod_read.sop_enabled = true;
        let qcd = qcd_reversible(2);
        let rect = Rect::from_corners(0, 0, w, h);

        let raw: Vec<i32> = (0..(w * h) as i32).map(|v| v % 256).collect();
        let mut enc_tile = Tile::new(0, rect, &siz, &cod_write);
        enc_tile.encode_tile(&[raw], &siz, &cod_write, &qcd).unwrap();
        let packets = enc_tile.encode_packets(&cod_write);
        let payload: Vec<u8> = packets.iter().flat_map(|(_, b)| b.clone()).collect();

        let mut dec_tile = Tile::new(0, rect, &siz, &cod_read);
        assert!(dec_tile.decode_packets(&cod_read, &payload).is_err());
    }

    #[test]
    fn mct_requires_three_components() {
        let siz = siz_gray(8, false, 4, 4);
        let mut cod = cod_reversible(0);
        cod.use_mct = true;
        let qcd = qcd_reversible(0);
        let rect = Rect::from_corners(0, 0, 4, 4);
        let mut tile = Tile::new(0, rect, &siz, &cod);
        let raw = vec![0i32; 16];
        assert!(tile.encode_tile(&[raw], &siz, &cod, &qcd).is_err());
    }
}
