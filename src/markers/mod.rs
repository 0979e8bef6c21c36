//! Marker segment definitions and wire codecs (spec.md §6.1).
//!
//! Every marker is `0xFF` followed by a second byte `>= 0x90`; segments that
//! carry a payload are prefixed by a two-byte length field inclusive of the
//! length field itself. All multi-byte values are big-endian, matching
//! `MarkerReader`/`MarkerWriter`.

mod cap;
mod cod;
mod com;
mod qcd;
mod siz;
mod sot;
mod tlm;

pub use cap::ParamCap;
pub use cod::{BlockStyle, ParamCod, ProgressionOrder, WaveletKind};
pub use com::ParamCom;
pub use qcd::{ParamQcc, ParamQcd, QuantStyle};
pub use siz::{ComponentSiz, ParamSiz};
pub use sot::SotSegment;
pub use tlm::{TileLengthPair, TlmSegment};

pub const SOC: u16 = 0xFF4F;
pub const CAP: u16 = 0xFF50;
pub const SIZ: u16 = 0xFF51;
pub const COD: u16 = 0xFF52;
pub const COC: u16 = 0xFF53;
pub const TLM: u16 = 0xFF55;
pub const PLM: u16 = 0xFF57;
pub const PLT: u16 = 0xFF58;
pub const QCD: u16 = 0xFF5C;
pub const QCC: u16 = 0xFF5D;
pub const RGN: u16 = 0xFF5E;
pub const POC: u16 = 0xFF5F;
pub const PPM: u16 = 0xFF60;
pub const PPT: u16 = 0xFF61;
pub const CRG: u16 = 0xFF63;
pub const COM: u16 = 0xFF64;
pub const SOT: u16 = 0xFF90;
pub const SOP: u16 = 0xFF91;
pub const EPH: u16 = 0xFF92;
pub const SOD: u16 = 0xFF93;
pub const EOC: u16 = 0xFFD9;
pub const PRF: u16 = 0xFF56;
pub const CPF: u16 = 0xFF59;

/// HTJ2K capability bit within `Rsiz` (spec.md §6.1).
pub const RSIZ_HTJ2K_BIT: u16 = crate::constants::RSIZ_HTJ2K_BIT;
/// Part-15 capability bit within `Pcap` (spec.md §6.1).
pub const PCAP_PART15_BIT: u32 = crate::constants::PCAP_PART15_BIT;
