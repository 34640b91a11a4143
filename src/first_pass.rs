//! First pass: walks every statement once, building the symbol table and
//! sizing the code/data images without emitting a single word yet.
//!
//! Grounded on the reference assembler's two-pass split in `main.rs`
//! (`first_pass` / `second_pass` called back to back), generalized here to
//! also own the IC/DC bookkeeping the reference keeps inline in its
//! generator. `.entry` is deliberately not resolved while walking: a label
//! can be exported before its own definition appears later in the file, so
//! every `.entry` name is queued and only matched against the symbol table
//! once the whole file — and the final code size data labels relocate
//! against — is known.

use std::rc::Rc;

use crate::context::AssemblerContext;
use crate::error::{AssemblerError, ErrorKind};
use crate::lexer::LexedLine;
use crate::parser::{self, ParsedDirective, Statement};

pub fn run(base: &str, lexed: &[LexedLine], ctx: &mut AssemblerContext, errors: &mut Vec<AssemblerError>) {
    let mut pending_entries: Vec<(String, usize)> = Vec::new();

    for line in lexed {
        let parsed = parser::parse_line(&line.tokens, base, line.line_no, errors);

        let Some(statement) = parsed.statement else {
            continue;
        };

        match statement {
            Statement::Instruction(instr) => {
                if let Some(name) = parsed.label {
                    declare_label(ctx, base, line.line_no, name, ctx.ic, false, errors);
                }
                ctx.ic += instr.word_count;
            }
            Statement::Directive(ParsedDirective::Data(values)) => {
                if let Some(name) = parsed.label {
                    declare_label(ctx, base, line.line_no, name, ctx.dc, true, errors);
                }
                ctx.dc += values.len();
            }
            Statement::Directive(ParsedDirective::String(text)) => {
                if let Some(name) = parsed.label {
                    declare_label(ctx, base, line.line_no, name, ctx.dc, true, errors);
                }
                ctx.dc += text.chars().count() + 1; // +1 for the terminating zero word
            }
            Statement::Directive(ParsedDirective::Extern(name)) => {
                if ctx.symbols.declare_extern(name).is_err() {
                    errors.push(AssemblerError::new(
                        ErrorKind::Duplicate,
                        base,
                        line.line_no,
                        format!("symbol \"{name}\" is already defined"),
                    ));
                }
            }
            Statement::Directive(ParsedDirective::Entry(name)) => {
                pending_entries.push((name.to_string(), line.line_no));
            }
        }
    }

    ctx.symbols.relocate_data_symbols(ctx.code_word_count());

    for (name, line_no) in pending_entries {
        match ctx.symbols.get(&name) {
            None => errors.push(AssemblerError::new(
                ErrorKind::SymbolNotFound,
                base,
                line_no,
                format!("'.entry' refers to undefined symbol \"{name}\""),
            )),
            Some(symbol) if symbol.external => errors.push(AssemblerError::new(
                ErrorKind::SymbolNotFound,
                base,
                line_no,
                format!("\"{name}\" cannot be both '.entry' and '.extern'"),
            )),
            Some(symbol) => {
                let address = symbol.address;
                ctx.symbols.mark_entry(&name).expect("checked above");
                ctx.entries.push((Rc::from(name.as_str()), address));
            }
        }
    }

    if !ctx.symbols.addresses_in_bounds() {
        errors.push(AssemblerError::file_level(
            ErrorKind::AddrOutOfBounds,
            base,
            "program exceeds the addressable memory range",
        ));
    }
}

fn declare_label(
    ctx: &mut AssemblerContext,
    base: &str,
    line_no: usize,
    name: &str,
    address: usize,
    is_data: bool,
    errors: &mut Vec<AssemblerError>,
) {
    if ctx.symbols.declare_local(name, address, is_data).is_err() {
        errors.push(AssemblerError::new(
            ErrorKind::Duplicate,
            base,
            line_no,
            format!("label \"{name}\" is already defined"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_all;

    fn run_source(src: &str) -> (AssemblerContext, Vec<AssemblerError>) {
        let lines: Vec<String> = src.lines().map(str::to_string).collect();
        let mut lex_errors = Vec::new();
        let lexed = lex_all("t", &lines, &mut lex_errors);
        let mut ctx = AssemblerContext::new("t");
        let mut errors = lex_errors;
        run("t", &lexed, &mut ctx, &mut errors);
        (ctx, errors)
    }

    #[test]
    fn labels_are_recorded_at_the_running_ic() {
        let (ctx, errors) = run_source("MAIN: mov r1, r2\nLOOP: add r1, r2\nstop");
        assert!(errors.is_empty());
        assert_eq!(ctx.symbols.get("MAIN").unwrap().address, 100);
        assert_eq!(ctx.symbols.get("LOOP").unwrap().address, 101);
    }

    #[test]
    fn data_labels_relocate_past_the_code_image() {
        let (ctx, errors) = run_source("mov r1, r2\nLIST: .data 1, 2, 3");
        assert!(errors.is_empty());
        // one code word (register-only mov) -> code image is 1 word long
        assert_eq!(ctx.symbols.get("LIST").unwrap().address, 101);
    }

    #[test]
    fn duplicate_label_is_reported() {
        let (_, errors) = run_source("MAIN: stop\nMAIN: stop");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::Duplicate));
    }

    #[test]
    fn entry_before_definition_still_resolves() {
        let (ctx, errors) = run_source(". entry LOOP\nstop\nLOOP: stop");
        assert!(errors.is_empty());
        assert_eq!(ctx.entries.len(), 1);
        assert_eq!(ctx.entries[0].0.as_ref(), "LOOP");
    }

    #[test]
    fn entry_on_undefined_symbol_is_reported() {
        let (_, errors) = run_source(". entry GHOST\nstop");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::SymbolNotFound));
    }

    #[test]
    fn entry_and_extern_on_the_same_symbol_conflict() {
        let (_, errors) = run_source(". extern W\n. entry W\nstop");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::SymbolNotFound));
    }
}
