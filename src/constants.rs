//! Numeric limits referenced throughout the core (spec.md §3, §6.3).

/// Maximum number of tiles a codestream may describe (spec.md §3.1).
pub const MAX_TILES: u64 = 65535;

/// Bounds on per-component downsampling factors XRsiz/YRsiz (spec.md §3.1).
pub const MIN_COMPONENT_DOWNSAMPLING: u32 = 1;
pub const MAX_COMPONENT_DOWNSAMPLING: u32 = 255;

/// Bounds on per-component bit depth (spec.md §3.1).
pub const MIN_BIT_DEPTH: u32 = 1;
pub const MAX_BIT_DEPTH: u32 = 38;
/// Practical bit depth ceiling the core actually supports sample math for.
pub const PRACTICAL_MAX_BIT_DEPTH: u32 = 32;

/// Bounds on the number of wavelet decompositions N (spec.md §3.2).
pub const MAX_DECOMPOSITIONS: u32 = 32;

/// Bounds on user-selected code-block log2 dimensions (spec.md §3.3).
pub const MIN_LOG_BLOCK_DIM: u32 = 2;
pub const MAX_LOG_BLOCK_DIM: u32 = 6;
pub const MAX_LOG_BLOCK_AREA: u32 = 12;

/// Default number of guard bits (spec.md §4.4).
pub const DEFAULT_GUARD_BITS: u32 = 1;

/// Ceiling on Kmax: guard_bits + dynamic-range/exponent - 1 must not exceed
/// this (spec.md §8 boundary behaviors).
pub const MAX_KMAX: u32 = 30;

/// HTJ2K capability bit within Rsiz (spec.md §6.1, SIZ marker).
pub const RSIZ_HTJ2K_BIT: u16 = 1 << 14;

/// Part-15 capability bit within Pcap (spec.md §6.1, CAP marker).
pub const PCAP_PART15_BIT: u32 = 1 << 14;

/// Scup legal range (spec.md §4.5).
pub const MIN_SCUP: u32 = 2;
pub const MAX_SCUP: u32 = 4079;

/// Number of MEL decoder/encoder states (spec.md §4.5).
pub const MEL_STATE_COUNT: usize = 13;

/// Precinct dimension defaults used when a resolution has no explicit
/// per-resolution precinct size (COD's SPcod omits precinct sizes).
pub const DEFAULT_LOG_PRECINCT_SIZE: u32 = 15;
