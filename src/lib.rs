/*!
# htj2k

`htj2k` is a pure Rust core codec for HTJ2K (ITU-T T.814 / ISO 15444-15)
codestreams: High-Throughput block coding layered on the JPEG 2000 Part 1
codestream, tile and resolution hierarchy.

## Module map

- [`markers`] — SOC/SIZ/CAP/COD/QCD/QCC/COM/TLM/SOT marker segment wire
  codecs.
- `bit_io` — the forward-growing (MagSgn, MEL, packet header) and
  reverse-growing (VLC/UVLC) bit-stuffed streams shared by the HT block
  coder.
- `marker_io` — byte-level cursor/writer the marker codecs are built on.
- `io` — `InFile`/`OutFile` capability traits, with in-memory and
  OS-file-backed implementations.
- `geometry` — canvas-space rectangle/point/size arithmetic.
- `error` — the `CoreError` taxonomy and resilient-mode `Notice` type.
- `allocator` — the arena (`Slab`) and elastic (chunked, append-only)
  allocators backing the tile/resolution/precinct/code-block graph.
- `line_buffer` — symmetric-extension line storage for the DWT.
- `wavelet` — 5/3 reversible and 9/7 irreversible lifting transforms.
- `color_transform` — RCT/ICT multi-component transforms.
- `quantization` — scalar dead-zone quantization tied to QCD/QCC.
- `tag_tree` — packet-header inclusion/missing-MSB quad-tree coding.
- `ht` — the HT code-block coder (MagSgn/MEL/VLC/UVLC cleanup pass).
- `subband` — subband geometry and code-block ownership.
- `codeblock` — code-block geometry, inclusion state, and coded bytes.
- `resolution` — per-level wavelet decomposition driving the resolution
  hierarchy.
- `progression` — LRCP/RLCP/RPCL/PCRL/CPRL packet enumeration.
- `precinct` — packet header coding: per-subband inclusion/zero-bitplane
  tag trees and code-block length fields.
- `tile_component` — per-(tile, component) coding pipeline tying together
  the DWT, quantization, HT block coder, and packet encode/decode.
- `tile` — tile geometry, sample conversion, color transform, and
  tile-level packet sequencing.
- [`codestream`] — the top-level `Codestream` object: marker I/O, tile-grid
  management, line push/pull, and tile-part/TLM assembly.

## Scope

This crate implements the codestream, transform, and HT block-coding core.
Image file I/O (PGM/PPM/TIFF/...), JP2 box parsing, multi-threaded tile
parallelism, and a CLI are deliberately left to callers; the `htj2k` binary
in this repository is a thin, line-oriented example driver, not a general
image tool.
*/

#![forbid(unsafe_code)]

pub mod allocator;
pub mod bit_io;
pub mod codeblock;
pub mod codestream;
pub mod color_transform;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod ht;
pub mod io;
pub mod line_buffer;
pub mod marker_io;
pub mod markers;
pub mod precinct;
pub mod progression;
pub mod quantization;
pub mod resolution;
pub mod subband;
pub mod tag_tree;
pub mod tile;
pub mod tile_component;
pub mod wavelet;

pub use error::CoreError;
