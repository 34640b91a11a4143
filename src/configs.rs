//! Named constants shared by every stage of the pipeline.
//!
//! Grounded on the reference assembler's `configs.rs`, which centralizes fixed
//! constants behind `lazy_static` when they can be overridden by the host
//! environment. Nothing here needs an environment override (this assembler has
//! no module search path), so these are plain `pub const` items.

/// Source lines longer than this are reported (`ErrorKind::LineLen`) but still processed.
pub const MAX_LINE_LEN: usize = 80;

/// Maximum length of a label or macro name.
pub const MAX_LABEL_LEN: usize = 31;

/// The instruction counter starts here; addresses below this are reserved.
pub const INITIAL_IC: usize = 100;

/// Inclusive upper bound of a 21-bit signed immediate.
pub const MAX_IMMEDIATE: i32 = (1 << 20) - 1;

/// Inclusive lower bound of a 21-bit signed immediate.
pub const MIN_IMMEDIATE: i32 = -(1 << 20);

/// Largest address a 24-bit word can hold.
pub const MAX_ADDRESS: usize = (1 << 24) - 1;

/// Inclusive upper bound of a `.data` value (it lands whole in a 24-bit data word).
pub const MAX_DATA_VALUE: i64 = (1 << 24) - 1;

/// Inclusive lower bound of a `.data` value.
pub const MIN_DATA_VALUE: i64 = -(1 << 24);

/// Width, in bits, of a machine word.
pub const WORD_BITS: u32 = 24;

/// Number of general-purpose registers (`r0`..`r7`).
pub const REGISTER_COUNT: u8 = 8;
