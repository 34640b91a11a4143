//! Command-line front end.
//!
//! Grounded on the reference assembler's `cli_parser.rs` (a `clap`-derive
//! struct taking a trailing list of file stems). `bases` is intentionally not
//! `required` here: an empty invocation gets this crate's own usage message
//! and exit code 1 (see [`crate::main`]) rather than clap's own exit code 2.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "assembler", about = "Two-pass assembler for a 24-bit custom instruction set")]
pub struct CliArgs {
    /// Base names of the source files to assemble, each read from `<base>.as`.
    pub bases: Vec<String>,
}
