//! Error values and the per-file error list.
//!
//! The reference assembler's `error.rs` renders one diagnostic per call and then
//! exits the process (`-> !` functions ending in `std::process::exit(1)`). This
//! crate needs every stage to keep finding defects after the first one, so the
//! same message-formatting style is kept but the functions build and return
//! `AssemblerError` values instead of printing and dying; the driver collects
//! them into a `Vec` and reports the whole batch at once, the way `irc`'s
//! `error.rs` frames a diagnostic between banner lines with `indoc`/`colored`.

use std::fmt;

use colored::Colorize;
use indoc::formatdoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // File
    Open,
    Read,

    // Preprocessor / macro
    LineLen,
    MacroDefExtra,
    MacroName,
    MacroSpaceMissing,

    // Lexer
    InvalidToken,
    InvalidStatement,

    // Label
    EmptyLabel,
    MaxLen,
    StartsWithDigit,
    InvalidChar,
    CollidesWithInstruction,
    CollidesWithRegister,
    CollidesWithDirective,
    Duplicate,
    MissingColon,
    MissingSpace,

    // Instruction
    IllegalComma,
    IllegalNumComma,
    AddrOutOfBounds,
    ImmOutOfBounds,
    InvalidImm,
    InvalidData,

    // Directive
    DotMissing,
    DataIllegalComma,
    StrIllegalComma,
    StrMissingQuote,
    MultiComma,

    // General
    WrongOperandCount,
    BadAddressingMode,
    SymbolNotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorKind::Open => "OPEN",
            ErrorKind::Read => "READ",
            ErrorKind::LineLen => "LINE_LEN",
            ErrorKind::MacroDefExtra => "MCRO_DEF_EXTRA",
            ErrorKind::MacroName => "MCRO_NAME",
            ErrorKind::MacroSpaceMissing => "MCRO_SPACE_MISSING",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::InvalidStatement => "INVALID_STATEMENT",
            ErrorKind::EmptyLabel => "EMPTY_LABEL",
            ErrorKind::MaxLen => "MAX_LEN",
            ErrorKind::StartsWithDigit => "STARTS_WITH_DIGIT",
            ErrorKind::InvalidChar => "INVALID_CHAR",
            ErrorKind::CollidesWithInstruction => "COLLIDES_WITH_INSTRUCTION",
            ErrorKind::CollidesWithRegister => "COLLIDES_WITH_REGISTER",
            ErrorKind::CollidesWithDirective => "COLLIDES_WITH_DIRECTIVE",
            ErrorKind::Duplicate => "DUPLICATE",
            ErrorKind::MissingColon => "MISSING_COLON",
            ErrorKind::MissingSpace => "MISSING_SPACE",
            ErrorKind::IllegalComma => "ILLEGAL_COMMA",
            ErrorKind::IllegalNumComma => "ILLEGAL_NUM_COMMA",
            ErrorKind::AddrOutOfBounds => "ADDR_OUT_OF_BOUNDS",
            ErrorKind::ImmOutOfBounds => "IMM_OUT_OF_BOUNDS",
            ErrorKind::InvalidImm => "INVALID_IMM",
            ErrorKind::InvalidData => "INVALID_DATA",
            ErrorKind::DotMissing => "DOT_MISSING",
            ErrorKind::DataIllegalComma => "DATA_ILLEGAL_COMMA",
            ErrorKind::StrIllegalComma => "STR_ILLEGAL_COMMA",
            ErrorKind::StrMissingQuote => "STR_MISSING_QUOTE",
            ErrorKind::MultiComma => "MULTI_COMMA",
            ErrorKind::WrongOperandCount => "WRONG_OPERAND_COUNT",
            ErrorKind::BadAddressingMode => "BAD_ADDRESSING_MODE",
            ErrorKind::SymbolNotFound => "SYMBOL_NOT_FOUND",
        };
        write!(f, "{tag}")
    }
}

#[derive(Debug, Clone)]
pub struct AssemblerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AssemblerError {
    pub fn new(kind: ErrorKind, file: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: format!("{file}:{line}: {}", message.into()),
        }
    }

    /// An error with no single source line to point at (e.g. a file that could not be opened).
    pub fn file_level(kind: ErrorKind, file: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: format!("{file}: {}", message.into()),
        }
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Prints every collected error for a file to stderr, framed by two separator lines.
pub fn report_errors(base: &str, errors: &[AssemblerError]) {
    let banner = "-".repeat(60);

    eprintln!(
        "{}",
        formatdoc!(
            "
            {banner}
            {count} error(s) while assembling \"{base}\":
            ",
            banner = banner.bright_yellow(),
            count = errors.len(),
            base = base,
        )
    );

    for error in errors {
        eprintln!("[{}] {}", error.kind.to_string().red(), error.message);
    }

    eprintln!("{}", banner.bright_yellow());
}
