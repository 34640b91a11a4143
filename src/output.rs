//! Writes the four output files: `.am` (expanded source), `.ob` (object
//! image), `.ent` (entry table) and `.ext` (external reference table).
//!
//! Grounded on the reference assembler's `files.rs`, which centralizes every
//! path-building and file-writing call behind small named functions instead
//! of scattering `format!("{base}.ext")` across the generator.

use std::io;

use crate::configs::INITIAL_IC;
use crate::context::AssemblerContext;

pub fn write_am(base: &str, lines: &[String]) -> io::Result<()> {
    let mut out = lines.join("\n");
    if !lines.is_empty() {
        out.push('\n');
    }
    std::fs::write(format!("{base}.am"), out)
}

/// Header line reports the code image size and the data image size (the
/// reference format's "IC-100" and "DC" counters), then one `address value`
/// line per word, code image first.
pub fn write_ob(base: &str, ctx: &AssemblerContext) -> io::Result<()> {
    let code_count = ctx.ic - INITIAL_IC;
    let data_count = ctx.dc;

    let mut out = format!("     {code_count} {data_count}\n");
    for word in ctx.code.iter().chain(ctx.data.iter()) {
        out.push_str(&format!("{:07} {:06x}\n", word.address, word.value));
    }
    std::fs::write(format!("{base}.ob"), out)
}

pub fn write_ent(base: &str, ctx: &AssemblerContext) -> io::Result<()> {
    if ctx.entries.is_empty() {
        return Ok(());
    }
    let mut out = String::new();
    for (name, address) in &ctx.entries {
        out.push_str(&format!("{name} {address:07}\n"));
    }
    std::fs::write(format!("{base}.ent"), out)
}

pub fn write_ext(base: &str, ctx: &AssemblerContext) -> io::Result<()> {
    if ctx.externals.is_empty() {
        return Ok(());
    }
    let mut out = String::new();
    for reference in &ctx.externals {
        out.push_str(&format!("{} {:07}\n", reference.name, reference.address));
    }
    std::fs::write(format!("{base}.ext"), out)
}
