//! Orchestrates one source file through the whole pipeline: preprocessor,
//! lexer, first pass, second pass, output — halting at the first stage
//! boundary that leaves any errors behind.
//!
//! Grounded on the reference assembler's `main.rs`, which drives the same
//! shape (`assemble_all` calling each stage for every module in turn) but
//! keeps going past a failed stage to report as much as possible across the
//! whole module graph; this crate has a single file per invocation, so it
//! simply stops at the first stage that produced errors for that file.

use crate::context::AssemblerContext;
use crate::error::{report_errors, AssemblerError, ErrorKind};
use crate::{first_pass, lexer, output, preprocessor, second_pass};

/// Assembles `<base>.as`, writing `.am`/`.ob`/`.ent`/`.ext` on success.
/// Returns `true` if the file assembled cleanly.
pub fn assemble_file(base: &str) -> bool {
    let source_path = format!("{base}.as");
    let raw = match std::fs::read_to_string(&source_path) {
        Ok(contents) => contents,
        Err(io_err) => {
            report_errors(
                base,
                &[AssemblerError::file_level(ErrorKind::Open, base, format!("could not read \"{source_path}\": {io_err}"))],
            );
            return false;
        }
    };
    let raw_lines: Vec<String> = raw.lines().map(str::to_string).collect();

    let mut errors = Vec::new();
    let preprocessed = preprocessor::preprocess(base, &raw_lines, &mut errors);
    if !errors.is_empty() {
        report_errors(base, &errors);
        return false;
    }

    if let Err(io_err) = output::write_am(base, &preprocessed.lines) {
        report_errors(base, &[AssemblerError::file_level(ErrorKind::Open, base, format!("could not write \"{base}.am\": {io_err}"))]);
        return false;
    }

    let lexed = lexer::lex_all(base, &preprocessed.lines, &mut errors);
    if !errors.is_empty() {
        report_errors(base, &errors);
        return false;
    }

    let mut ctx = AssemblerContext::new(base);
    first_pass::run(base, &lexed, &mut ctx, &mut errors);
    if !errors.is_empty() {
        report_errors(base, &errors);
        return false;
    }

    second_pass::run(base, &lexed, &mut ctx, &mut errors);
    if !errors.is_empty() {
        report_errors(base, &errors);
        return false;
    }

    for write in [output::write_ob(base, &ctx), output::write_ent(base, &ctx), output::write_ext(base, &ctx)] {
        if let Err(io_err) = write {
            report_errors(base, &[AssemblerError::file_level(ErrorKind::Open, base, format!("could not write output: {io_err}"))]);
            return false;
        }
    }

    true
}
