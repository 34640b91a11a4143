//! Entry point: parses CLI args and assembles every given base name
//! independently, so one file's failure never stops the others.
//!
//! Grounded on the reference assembler's `main.rs` driver loop.

use clap::Parser;

use assembler::assembler::assemble_file;
use assembler::cli::CliArgs;

fn main() {
    let args = CliArgs::parse();

    if args.bases.is_empty() {
        eprintln!("usage: assembler <base>...");
        std::process::exit(1);
    }

    for base in &args.bases {
        assemble_file(base);
    }
}
