//! The top-level HTJ2K codestream object (spec.md §4.1).
//!
//! [`Codestream`] owns the marker parameters, the full-canvas per-component
//! sample buffers, and the tile grid; it is the only type library users
//! drive directly. Encoding pushes lines in through [`Codestream::exchange`]
//! and finishes with [`Codestream::flush`]; decoding reads markers through
//! [`Codestream::read_headers`], reconstructs every tile in
//! [`Codestream::create`], and serves lines back out through
//! [`Codestream::pull`] — the same two-call shape the teacher's
//! `J2kEncoder`/`J2kDecoder` split reading/writing headers from running the
//! tile loop (`examples/rad-medica-jpegexp-rs/src/jpeg2000/{encoder,decoder}.rs`).

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{config_error, malformed, profile_violation, CoreError, Notice};
use crate::geometry::{ceil_div, tile_count_1d, Rect};
use crate::io::{InFile, OutFile};
use crate::marker_io::{MarkerReader, MarkerWriter};
use crate::markers::{
    ParamCap, ParamCod, ParamCom, ParamQcc, ParamQcd, ParamSiz, ProgressionOrder, TileLengthPair, TlmSegment, CAP,
    COC, COD, COM, CPF, CRG, EOC, PLM, POC, PPM, PPT, PRF, QCC, QCD, RGN, SIZ, SOC, SOD, SOT, TLM,
};
use crate::progression::PacketId;
use crate::tile::Tile;

/// How a tile's packets are split across tile-parts (spec.md §4.1, §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilePartDivision {
    None,
    ByComponent,
    ByResolution,
    Both,
}

/// Conformance profile `set_profile` checks at `write_headers`/`flush` time
/// (spec.md §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Broadcast,
    Imf,
}

/// The top-level codestream object (spec.md §4.1's operation list).
pub struct Codestream {
    siz: ParamSiz,
    cod: ParamCod,
    qcd: ParamQcd,
    cap: ParamCap,
    profile: Option<Profile>,
    resilient: bool,
    planar: bool,
    skip_read: u32,
    skip_recon: u32,
    tile_part_division: TilePartDivision,
    emit_tlm: bool,
    notices: Vec<Notice>,
    tiles: Vec<Tile>,

    // write_headers stages its bytes here rather than writing them
    // immediately, since TLM (if enabled) must precede the first SOT but
    // its tile-part lengths aren't known until every tile has been encoded
    // and OutFile is append-only (no seek-and-patch). flush() commits this
    // buffer, then TLM, then every tile-part, in one pass. See DESIGN.md.
    staged_header: Vec<u8>,

    // read_headers leaves the full codestream bytes and the offset of the
    // first SOT here for create() to continue parsing from.
    raw: Vec<u8>,
    header_end: usize,

    component_buffers: Vec<Vec<i32>>,
    exchange_component: usize,
    exchange_row: usize,
    exchange_pending: Option<(usize, usize)>,
    exchange_done: bool,
    pull_component: usize,
    pull_row: usize,
    pull_done: bool,
}

impl Default for Codestream {
    fn default() -> Self {
        Self {
            siz: ParamSiz {
                rsiz: crate::constants::RSIZ_HTJ2K_BIT,
                xsiz: 0,
                ysiz: 0,
                xosiz: 0,
                yosiz: 0,
                xtsiz: 0,
                ytsiz: 0,
                xtosiz: 0,
                ytosiz: 0,
                components: Vec::new(),
            },
            cod: ParamCod {
                progression_order: ProgressionOrder::Lrcp,
                num_layers: 1,
                use_mct: false,
                num_decompositions: 5,
                log_block_w: 6,
                log_block_h: 6,
                block_style: crate::markers::BlockStyle::default(),
                wavelet: crate::markers::WaveletKind::Reversible53,
                precinct_sizes: None,
                sop_enabled: false,
                eph_enabled: false,
            },
            qcd: ParamQcd {
                guard_bits: crate::constants::DEFAULT_GUARD_BITS as u8,
                style: crate::markers::QuantStyle::NoQuantization,
                subband_values: vec![16 << 3; 1 + 3 * 5],
            },
            cap: ParamCap::default(),
            profile: None,
            resilient: false,
            planar: false,
            skip_read: 0,
            skip_recon: 0,
            tile_part_division: TilePartDivision::None,
            emit_tlm: false,
            notices: Vec::new(),
            tiles: Vec::new(),
            staged_header: Vec::new(),
            raw: Vec::new(),
            header_end: 0,
            component_buffers: Vec::new(),
            exchange_component: 0,
            exchange_row: 0,
            exchange_pending: None,
            exchange_done: false,
            pull_component: 0,
            pull_row: 0,
            pull_done: false,
        }
    }
}

impl Codestream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_siz(&mut self) -> &mut ParamSiz {
        &mut self.siz
    }

    pub fn access_cod(&mut self) -> &mut ParamCod {
        &mut self.cod
    }

    pub fn access_qcd(&mut self) -> &mut ParamQcd {
        &mut self.qcd
    }

    /// Selects planar (all of component 0's rows, then all of component
    /// 1's, ...) vs. interleaved (row 0 of every component, row 1 of every
    /// component, ...) line order for `exchange`/`pull` (spec.md §4.1).
    /// Interleaved mode requires every component to share the same height.
    pub fn set_planar(&mut self, planar: bool) {
        self.planar = planar;
    }

    pub fn set_tile_part_division(&mut self, division: TilePartDivision) {
        self.tile_part_division = division;
    }

    pub fn set_emit_tlm(&mut self, emit: bool) {
        self.emit_tlm = emit;
    }

    pub fn set_profile(&mut self, profile: &str) -> Result<(), CoreError> {
        self.profile = Some(match profile {
            "BROADCAST" => Profile::Broadcast,
            "IMF" => Profile::Imf,
            other => return Err(config_error!(150, "unknown conformance profile '{other}'")),
        });
        Ok(())
    }

    pub fn enable_resilience(&mut self) {
        self.resilient = true;
    }

    /// Restricts decode to at most `skip_recon` fewer of the finest
    /// resolution levels than were encoded (spec.md §4.1). `skip_read`
    /// additionally governs how many of those levels' packets are worth
    /// parsing at all; this core's packet stream has no random-access index
    /// (no PLM/PLT is maintained), so every packet is always parsed in
    /// full regardless of `skip_read` and the distinction is purely
    /// informational here (see DESIGN.md's Open Questions).
    pub fn restrict_input_resolution(&mut self, skip_read: u32, skip_recon: u32) -> Result<(), CoreError> {
        if skip_recon > skip_read {
            return Err(config_error!(151, "skip_recon must not exceed skip_read"));
        }
        self.skip_read = skip_read;
        self.skip_recon = skip_recon;
        Ok(())
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    fn full_component_rect(&self, c: usize) -> Rect {
        let comp = &self.siz.components[c];
        let rect = Rect::from_corners(self.siz.xosiz, self.siz.yosiz, self.siz.xsiz, self.siz.ysiz)
            .project_to_component(comp.xrsiz as u32, comp.yrsiz as u32);
        if self.skip_recon == 0 {
            return rect;
        }
        let div = 1u32 << self.skip_recon.min(self.cod.num_decompositions);
        Rect::new(
            crate::geometry::Point::new(0, 0),
            crate::geometry::Size::new(ceil_div(rect.w(), div), ceil_div(rect.h(), div)),
        )
    }

    fn component_width(&self, c: usize) -> usize {
        self.full_component_rect(c).w() as usize
    }

    fn component_height(&self, c: usize) -> usize {
        self.full_component_rect(c).h() as usize
    }

    fn build_tiles(&mut self) {
        let image_rect = Rect::from_corners(self.siz.xosiz, self.siz.yosiz, self.siz.xsiz, self.siz.ysiz);
        let nx = tile_count_1d(self.siz.xsiz, self.siz.xtosiz, self.siz.xtsiz);
        let ny = tile_count_1d(self.siz.ysiz, self.siz.ytosiz, self.siz.ytsiz);
        let mut tiles = Vec::with_capacity((nx * ny) as usize);
        for ty in 0..ny {
            for tx in 0..nx {
                let cell = Rect::from_corners(
                    self.siz.xtosiz + tx * self.siz.xtsiz,
                    self.siz.ytosiz + ty * self.siz.ytsiz,
                    self.siz.xtosiz + (tx + 1) * self.siz.xtsiz,
                    self.siz.ytosiz + (ty + 1) * self.siz.ytsiz,
                );
                let rect = cell.intersect(&image_rect);
                let index = (ty * nx + tx) as u16;
                tiles.push(Tile::new(index, rect, &self.siz, &self.cod));
            }
        }
        self.tiles = tiles;
    }

    fn validate_for_write(&self) -> Result<(), CoreError> {
        if self.siz.components.is_empty() {
            return Err(config_error!(152, "SIZ declares no components"));
        }
        if self.siz.xsiz <= self.siz.xosiz || self.siz.ysiz <= self.siz.yosiz {
            return Err(config_error!(153, "image extent must exceed the image offset"));
        }
        if self.siz.xtsiz == 0 || self.siz.ytsiz == 0 {
            return Err(config_error!(154, "tile size must be non-zero"));
        }
        let nx = tile_count_1d(self.siz.xsiz, self.siz.xtosiz, self.siz.xtsiz) as u64;
        let ny = tile_count_1d(self.siz.ysiz, self.siz.ytosiz, self.siz.ytsiz) as u64;
        if nx * ny > crate::constants::MAX_TILES {
            return Err(config_error!(155, "tile grid exceeds the maximum tile count"));
        }
        self.validate_profile()
    }

    fn validate_profile(&self) -> Result<(), CoreError> {
        let Some(profile) = self.profile else {
            return Ok(());
        };
        if self.siz.xosiz != 0 || self.siz.yosiz != 0 || self.siz.xtosiz != 0 || self.siz.ytosiz != 0 {
            return Err(profile_violation!(100, "conformance profiles require zero image/tile offsets"));
        }
        match profile {
            Profile::Broadcast => {
                if self.siz.num_components() > 4 {
                    return Err(profile_violation!(101, "BROADCAST allows at most 4 components"));
                }
                for c in &self.siz.components {
                    if c.is_signed() || !(8..=12).contains(&c.bit_depth()) {
                        return Err(profile_violation!(102, "BROADCAST requires unsigned 8-12 bit components"));
                    }
                }
            }
            Profile::Imf => {
                if self.siz.num_components() > 3 {
                    return Err(profile_violation!(103, "IMF allows at most 3 components"));
                }
                for c in &self.siz.components {
                    if c.is_signed() || !(8..=16).contains(&c.bit_depth()) {
                        return Err(profile_violation!(104, "IMF requires unsigned 8-16 bit components"));
                    }
                }
            }
        }
        if !matches!(self.cod.progression_order, ProgressionOrder::Cprl) {
            return Err(profile_violation!(105, "conformance profiles require CPRL progression"));
        }
        if !self.emit_tlm {
            return Err(profile_violation!(106, "conformance profiles require a TLM marker"));
        }
        if !matches!(self.tile_part_division, TilePartDivision::ByComponent | TilePartDivision::Both) {
            return Err(profile_violation!(107, "conformance profiles require tile-part division by component"));
        }
        Ok(())
    }

    /// Stages the SOC/SIZ/CAP/COD/QCD/COM marker segments, validating the
    /// configuration (and, if `set_profile` was called, conformance) first.
    /// The bytes are not written to `outfile` until `flush`, since TLM (if
    /// enabled) must be inserted before them and its tile lengths are not
    /// known yet; see the `staged_header` field doc.
    pub fn write_headers(&mut self, _outfile: &mut dyn OutFile) -> Result<(), CoreError> {
        self.validate_for_write()?;
        self.siz.rsiz |= crate::constants::RSIZ_HTJ2K_BIT;
        self.cap.pcap |= crate::constants::PCAP_PART15_BIT;

        let mut w = MarkerWriter::new();
        w.write_marker(SOC);
        self.siz.write(&mut w);
        self.cap.write(&mut w);
        self.cod.write(&mut w);
        self.qcd.write(&mut w);
        ParamCom::identification("htj2k-rs").write(&mut w);
        self.staged_header = w.into_inner();
        Ok(())
    }

    /// Parses the main header out of `infile`, leaving the tile-part
    /// sequence for `create` to walk.
    pub fn read_headers(&mut self, infile: &mut dyn InFile) -> Result<(), CoreError> {
        let bytes = infile.read_to_end()?;
        let mut r = MarkerReader::new(&bytes);
        if r.read_marker()? != SOC {
            return Err(malformed!(110, "codestream does not begin with SOC"));
        }
        if r.peek_marker()? != SIZ {
            return Err(malformed!(111, "SIZ must immediately follow SOC"));
        }
        r.read_marker()?;
        self.siz = ParamSiz::read(&mut r)?;

        let mut have_cod = false;
        let mut have_qcd = false;
        loop {
            let marker = r.peek_marker()?;
            match marker {
                SOT => break,
                CAP => {
                    r.read_marker()?;
                    self.cap = ParamCap::read(&mut r)?;
                }
                COD => {
                    r.read_marker()?;
                    self.cod = ParamCod::read(&mut r)?;
                    have_cod = true;
                }
                QCD => {
                    r.read_marker()?;
                    self.qcd = ParamQcd::read(&mut r, self.cod.num_decompositions)?;
                    have_qcd = true;
                }
                QCC => {
                    r.read_marker()?;
                    let wide = self.siz.num_components() > 256;
                    let qcc = ParamQcc::read(&mut r, self.cod.num_decompositions, wide)?;
                    log::warn!(
                        "QCC for component {} ignored; this core uses one QCD for every component",
                        qcc.component_index
                    );
                }
                COM => {
                    r.read_marker()?;
                    ParamCom::read(&mut r)?;
                }
                TLM => {
                    r.read_marker()?;
                    log::info!("TLM marker ignored on decode; tile-part lengths are recovered from Psot");
                    skip_segment(&mut r)?;
                }
                COC | RGN | POC | PPM | PPT | PLM | CRG | PRF | CPF => {
                    r.read_marker()?;
                    log::warn!("marker {marker:#06x} encountered in the main header but not interpreted");
                    skip_segment(&mut r)?;
                }
                other => {
                    return Err(malformed!(112, "unexpected marker {other:#06x} before the first SOT"));
                }
            }
        }
        if !have_cod {
            return Err(malformed!(113, "codestream is missing a COD marker"));
        }
        if !have_qcd {
            return Err(malformed!(114, "codestream is missing a QCD marker"));
        }
        self.header_end = r.position();
        self.raw = bytes;
        Ok(())
    }

    /// Walks every tile-part between the main header and EOC, grouping
    /// payload bytes per tile, then decodes each tile's packets and the
    /// inverse transform, populating the full-canvas sample buffers
    /// [`Codestream::pull`] serves from.
    pub fn create(&mut self) -> Result<(), CoreError> {
        self.build_tiles();
        if self.skip_recon > 0 && (self.tiles.len() != 1 || self.siz.xosiz != 0 || self.siz.yosiz != 0) {
            return Err(crate::error::unsupported!(
                160,
                "restrict_input_resolution with skip_recon > 0 is only supported for single-tile, zero-offset images"
            ));
        }

        let mut tile_payloads: Vec<Vec<u8>> = vec![Vec::new(); self.tiles.len()];
        let mut r = MarkerReader::new(&self.raw);
        r.set_position(self.header_end);
        loop {
            let sot_start = r.position();
            let marker = r.read_marker()?;
            if marker == EOC {
                break;
            }
            if marker != SOT {
                return Err(malformed!(120, "expected SOT or EOC, found marker {marker:#06x}"));
            }
            let sot = crate::markers::SotSegment::read(&mut r)?;
            if r.read_marker()? != SOD {
                return Err(malformed!(122, "expected SOD immediately after SOT's body"));
            }
            let payload_start = r.position();
            let header_len = payload_start - sot_start;
            let payload_len = (sot.psot as usize)
                .checked_sub(header_len)
                .ok_or_else(|| malformed!(123, "Psot too small to cover its own SOT/SOD header"))?;
            let payload = r.take(payload_len)?;
            let tile_index = sot.isot as usize;
            if tile_index >= tile_payloads.len() {
                return Err(malformed!(121, "SOT tile index {tile_index} out of range"));
            }
            tile_payloads[tile_index].extend_from_slice(payload);
        }

        let cod = &self.cod;
        for (idx, tile) in self.tiles.iter_mut().enumerate() {
            if let Err(e) = tile.decode_packets(cod, &tile_payloads[idx]) {
                if self.resilient && !e.always_fatal() {
                    self.notices.push(Notice {
                        code: e.code(),
                        message: e.to_string(),
                    });
                } else {
                    return Err(e);
                }
            }
        }

        self.assemble_decoded_samples()?;
        Ok(())
    }

    fn assemble_decoded_samples(&mut self) -> Result<(), CoreError> {
        let n = self.siz.num_components();
        let full_rects: Vec<Rect> = (0..n).map(|c| self.full_component_rect(c)).collect();
        let mut buffers: Vec<Vec<i32>> = full_rects.iter().map(|r| vec![0i32; (r.w() as usize) * (r.h() as usize)]).collect();
        let resolutions_to_reconstruct = self.cod.num_decompositions.saturating_sub(self.skip_recon);
        for tile in &self.tiles {
            let decoded = tile.decode_tile(
                &self.siz,
                &self.cod,
                &self.qcd,
                resolutions_to_reconstruct,
                self.resilient,
                &mut self.notices,
            )?;
            for c in 0..n {
                let local = local_rect(full_rects[c], scaled_rect(tile.component_rects[c], self.skip_recon, self.cod.num_decompositions));
                scatter_into(&mut buffers[c], full_rects[c].w() as usize, local, &decoded[c]);
            }
        }
        self.component_buffers = buffers;
        self.pull_component = 0;
        self.pull_row = 0;
        self.pull_done = self.component_buffers.is_empty();
        Ok(())
    }

    /// Pulls the next reconstructed line out in push/pull order, reporting
    /// which component it belongs to in `comp`. Returns `None` once every
    /// line has been served.
    pub fn pull(&mut self, comp: &mut usize) -> Option<Vec<i32>> {
        if self.pull_done {
            return None;
        }
        let c = self.pull_component;
        let row = self.pull_row;
        let width = self.component_width(c);
        let start = row * width;
        let line = self.component_buffers[c][start..start + width].to_vec();
        *comp = c;
        self.advance_pull_cursor();
        Some(line)
    }

    fn advance_pull_cursor(&mut self) {
        let n = self.siz.num_components();
        if self.planar {
            self.pull_row += 1;
            if self.pull_row >= self.component_height(self.pull_component) {
                self.pull_row = 0;
                self.pull_component += 1;
                if self.pull_component >= n {
                    self.pull_done = true;
                }
            }
        } else {
            self.pull_component += 1;
            if self.pull_component >= n {
                self.pull_component = 0;
                self.pull_row += 1;
                if self.pull_row >= self.component_height(0) {
                    self.pull_done = true;
                }
            }
        }
    }

    fn init_component_buffers(&mut self) {
        let n = self.siz.num_components();
        self.component_buffers = (0..n)
            .map(|c| {
                let r = self.full_component_rect(c);
                vec![0i32; (r.w() as usize) * (r.h() as usize)]
            })
            .collect();
        self.exchange_component = 0;
        self.exchange_row = 0;
        self.exchange_pending = None;
        self.exchange_done = false;
    }

    /// Pushes a caller-supplied line (`None` on the very first call) into
    /// the encoder's sample buffers and returns a freshly allocated buffer
    /// for the next line the caller should fill, reporting which component
    /// it belongs to in `next_comp`. Returns `None` once the whole image
    /// has been supplied (spec.md §4.1's `exchange`).
    pub fn exchange(&mut self, line: Option<Vec<i32>>, next_comp: &mut usize) -> Option<Vec<i32>> {
        if self.component_buffers.is_empty() {
            self.init_component_buffers();
        }
        if let (Some(buf), Some((c, row))) = (line, self.exchange_pending.take()) {
            let width = self.component_width(c);
            let start = row * width;
            self.component_buffers[c][start..start + width].copy_from_slice(&buf[..width]);
        }
        if self.exchange_done {
            return None;
        }
        let c = self.exchange_component;
        let row = self.exchange_row;
        let width = self.component_width(c);
        self.exchange_pending = Some((c, row));
        *next_comp = c;
        self.advance_exchange_cursor();
        Some(vec![0i32; width])
    }

    fn advance_exchange_cursor(&mut self) {
        let n = self.siz.num_components();
        if self.planar {
            self.exchange_row += 1;
            if self.exchange_row >= self.component_height(self.exchange_component) {
                self.exchange_row = 0;
                self.exchange_component += 1;
                if self.exchange_component >= n {
                    self.exchange_done = true;
                }
            }
        } else {
            self.exchange_component += 1;
            if self.exchange_component >= n {
                self.exchange_component = 0;
                self.exchange_row += 1;
                if self.exchange_row >= self.component_height(0) {
                    self.exchange_done = true;
                }
            }
        }
    }

    fn split_tile_parts(&self, packets: &[(PacketId, Vec<u8>)]) -> Vec<Vec<u8>> {
        match self.tile_part_division {
            TilePartDivision::None => vec![packets.iter().flat_map(|(_, b)| b.clone()).collect()],
            TilePartDivision::ByComponent => group_by(packets, |id| id.component),
            TilePartDivision::ByResolution => group_by(packets, |id| id.resolution),
            TilePartDivision::Both => group_by(packets, |id| (id.component, id.resolution)),
        }
    }

    /// Encodes every tile from the buffers `exchange` filled, groups their
    /// packets into tile-parts per the configured division, and writes the
    /// staged main header, an optional TLM, every tile-part, and EOC to
    /// `outfile` (spec.md §4.1 `flush`).
    pub fn flush(&mut self, outfile: &mut dyn OutFile) -> Result<(), CoreError> {
        if self.staged_header.is_empty() {
            return Err(config_error!(156, "flush called before write_headers"));
        }
        self.build_tiles();
        let n = self.siz.num_components();
        let full_rects: Vec<Rect> = (0..n).map(|c| self.full_component_rect(c)).collect();

        let mut finished_parts: Vec<Vec<u8>> = Vec::new();
        let mut tlm_pairs: Vec<TileLengthPair> = Vec::new();

        for tile in &mut self.tiles {
            let mut raw = Vec::with_capacity(n);
            for c in 0..n {
                let local = local_rect(full_rects[c], tile.component_rects[c]);
                raw.push(gather_from(&self.component_buffers[c], full_rects[c].w() as usize, local));
            }
            tile.encode_tile(&raw, &self.siz, &self.cod, &self.qcd)?;
            let packets = tile.encode_packets(&self.cod);
            let parts = self.split_tile_parts(&packets);
            let tnsot = parts.len() as u8;
            for (part_idx, payload) in parts.into_iter().enumerate() {
                let mut w = MarkerWriter::new();
                let sot = crate::markers::SotSegment {
                    isot: tile.index,
                    psot: 0,
                    tpsot: part_idx as u8,
                    tnsot,
                };
                let psot_at = sot.write_reserving_psot(&mut w);
                w.write_marker(SOD);
                w.write_bytes(&payload);
                let total_len = w.len() as u32;
                w.patch_u32(psot_at, total_len);
                tlm_pairs.push(TileLengthPair {
                    tile_index: tile.index,
                    tile_part_length: total_len,
                });
                finished_parts.push(w.into_inner());
            }
        }

        outfile.write(&self.staged_header)?;
        if self.emit_tlm {
            let mut w = MarkerWriter::new();
            TlmSegment::new(tlm_pairs).write(&mut w);
            outfile.write(&w.into_inner())?;
        }
        for part in &finished_parts {
            outfile.write(part)?;
        }
        outfile.write(&EOC.to_be_bytes())?;
        Ok(())
    }
}

fn skip_segment(r: &mut MarkerReader) -> Result<(), CoreError> {
    let len = r.read_u16()? as usize;
    r.skip(len.checked_sub(2).ok_or_else(|| malformed!(115, "marker segment length too short"))?)
}

fn group_by<K: Eq + Hash + Clone, F: Fn(&PacketId) -> K>(packets: &[(PacketId, Vec<u8>)], key_fn: F) -> Vec<Vec<u8>> {
    let mut order: Vec<K> = Vec::new();
    let mut groups: HashMap<K, Vec<u8>> = HashMap::new();
    for (id, bytes) in packets {
        let k = key_fn(id);
        if !groups.contains_key(&k) {
            order.push(k.clone());
        }
        groups.entry(k).or_default().extend_from_slice(bytes);
    }
    order.into_iter().map(|k| groups.remove(&k).unwrap_or_default()).collect()
}

fn local_rect(full: Rect, sub: Rect) -> Rect {
    Rect::from_corners(sub.x0() - full.x0(), sub.y0() - full.y0(), sub.x1() - full.x0(), sub.y1() - full.y0())
}

/// Scales a tile's component rect down by the same dyadic factor
/// `assemble_decoded_samples` shrank the full canvas by, for the
/// single-tile partial-reconstruction path (where the tile rect already
/// equals the full image rect, so this is just `full_component_rect`'s
/// scaling applied again).
fn scaled_rect(rect: Rect, skip_recon: u32, num_decompositions: u32) -> Rect {
    if skip_recon == 0 {
        return rect;
    }
    let div = 1u32 << skip_recon.min(num_decompositions);
    Rect::new(
        crate::geometry::Point::new(0, 0),
        crate::geometry::Size::new(ceil_div(rect.w(), div), ceil_div(rect.h(), div)),
    )
}

fn gather_from(src: &[i32], src_w: usize, rect: Rect) -> Vec<i32> {
    let w = rect.w() as usize;
    let mut out = Vec::with_capacity(w * rect.h() as usize);
    for y in rect.y0()..rect.y1() {
        let start = y as usize * src_w + rect.x0() as usize;
        out.extend_from_slice(&src[start..start + w]);
    }
    out
}

fn scatter_into(dst: &mut [i32], dst_w: usize, rect: Rect, values: &[i32]) {
    let w = rect.w() as usize;
    for (row, y) in (rect.y0()..rect.y1()).enumerate() {
        let start = y as usize * dst_w + rect.x0() as usize;
        dst[start..start + w].copy_from_slice(&values[row * w..(row + 1) * w]);
    }
}
