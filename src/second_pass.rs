//! Second pass: re-parses every statement (now guaranteed well-formed, since
//! the pipeline never reaches here with outstanding errors) and encodes it
//! into code/data words, resolving every symbol reference along the way.
//!
//! Grounded on the reference assembler's `generator.rs`, which walks the
//! already-built AST pushing bytes; this crate has no AST to walk, so it
//! re-derives each statement's shape by calling [`parser::parse_line`] again,
//! then mirrors the first pass's IC/DC bookkeeping (in fresh local counters —
//! `ctx.ic`/`ctx.dc` already hold the first pass's final totals) to land on
//! the exact addresses the first pass assigned.

use std::rc::Rc;

use crate::configs::INITIAL_IC;
use crate::context::{AssemblerContext, ExternalRef};
use crate::error::{AssemblerError, ErrorKind};
use crate::isa::Are;
use crate::lexer::LexedLine;
use crate::parser::{self, Operand, ParsedDirective, ParsedInstruction, Statement};
use crate::word::{mask_24, pack_address_value, pack_header, pack_signed_value, Word};

pub fn run(base: &str, lexed: &[LexedLine], ctx: &mut AssemblerContext, errors: &mut Vec<AssemblerError>) {
    let data_base = ctx.ic;
    let mut ic = INITIAL_IC;
    let mut dc = 0usize;

    for line in lexed {
        // Scratch vec: a line reaching the second pass already parsed clean
        // in the first pass, so nothing new should land here.
        let mut scratch = Vec::new();
        let parsed = parser::parse_line(&line.tokens, base, line.line_no, &mut scratch);

        match parsed.statement {
            Some(Statement::Instruction(instr)) => {
                encode_instruction(ctx, base, line.line_no, ic, &instr, errors);
                ic += instr.word_count;
            }
            Some(Statement::Directive(ParsedDirective::Data(values))) => {
                let address = data_base + dc;
                for (offset, value) in values.iter().enumerate() {
                    ctx.data.push(Word::new(address + offset, mask_24(*value as i64)));
                }
                dc += values.len();
            }
            Some(Statement::Directive(ParsedDirective::String(text))) => {
                let address = data_base + dc;
                for (offset, ch) in text.chars().enumerate() {
                    ctx.data.push(Word::new(address + offset, ch as u32));
                }
                ctx.data.push(Word::new(address + text.chars().count(), 0));
                dc += text.chars().count() + 1;
            }
            Some(Statement::Directive(ParsedDirective::Extern(_) | ParsedDirective::Entry(_))) | None => {}
        }
    }
}

fn encode_instruction(
    ctx: &mut AssemblerContext,
    base: &str,
    line_no: usize,
    address: usize,
    instr: &ParsedInstruction,
    errors: &mut Vec<AssemblerError>,
) {
    let (src, dst) = match instr.operands.as_slice() {
        [a, b] => (Some(a), Some(b)),
        [a] => (None, Some(a)),
        [] => (None, None),
    };

    let src_reg = matches!(src, Some(Operand::Register(_))).then(|| match src {
        Some(Operand::Register(r)) => *r,
        _ => unreachable!(),
    });
    let dst_reg = matches!(dst, Some(Operand::Register(_))).then(|| match dst {
        Some(Operand::Register(r)) => *r,
        _ => unreachable!(),
    });

    let header = pack_header(
        instr.def.opcode,
        instr.def.funct,
        src.map(|o| o.mode().field_value()),
        src_reg,
        dst.map(|o| o.mode().field_value()),
        dst_reg,
        Are::Absolute,
    );
    ctx.code.push(Word::new(address, header));

    let mut next_addr = address + 1;
    for operand in [src, dst].into_iter().flatten() {
        if matches!(operand, Operand::Register(_)) {
            continue;
        }
        let value = encode_operand_word(ctx, base, line_no, address, next_addr, operand, errors);
        ctx.code.push(Word::new(next_addr, value));
        next_addr += 1;
    }
}

fn encode_operand_word(
    ctx: &mut AssemblerContext,
    base: &str,
    line_no: usize,
    instruction_address: usize,
    word_address: usize,
    operand: &Operand,
    errors: &mut Vec<AssemblerError>,
) -> u32 {
    match operand {
        Operand::Immediate(v) => pack_signed_value(*v, Are::Absolute),
        Operand::Register(_) => unreachable!("registers never consume an extra word"),
        Operand::Direct(name) => match ctx.symbols.get(name) {
            None => {
                errors.push(AssemblerError::new(
                    ErrorKind::SymbolNotFound,
                    base,
                    line_no,
                    format!("undefined symbol \"{name}\""),
                ));
                0
            }
            Some(symbol) if symbol.external => {
                ctx.externals.push(ExternalRef { name: Rc::clone(&symbol.name), address: word_address });
                pack_address_value(0, Are::External)
            }
            Some(symbol) => pack_address_value(symbol.address, Are::Relocatable),
        },
        Operand::Relative(name) => match ctx.symbols.get(name) {
            None => {
                errors.push(AssemblerError::new(
                    ErrorKind::SymbolNotFound,
                    base,
                    line_no,
                    format!("undefined symbol \"{name}\""),
                ));
                0
            }
            Some(symbol) if symbol.external => {
                errors.push(AssemblerError::new(
                    ErrorKind::BadAddressingMode,
                    base,
                    line_no,
                    format!("relative addressing cannot target the external symbol \"{name}\""),
                ));
                0
            }
            Some(symbol) => {
                let offset = symbol.address as i64 - instruction_address as i64 + 1;
                pack_signed_value(offset as i32, Are::Absolute)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_pass;
    use crate::lexer::lex_all;

    fn assemble(src: &str) -> (AssemblerContext, Vec<AssemblerError>) {
        let lines: Vec<String> = src.lines().map(str::to_string).collect();
        let mut errors = Vec::new();
        let lexed = lex_all("t", &lines, &mut errors);
        let mut ctx = AssemblerContext::new("t");
        first_pass::run("t", &lexed, &mut ctx, &mut errors);
        assert!(errors.is_empty(), "first pass errors: {errors:?}");
        run("t", &lexed, &mut ctx, &mut errors);
        (ctx, errors)
    }

    #[test]
    fn register_only_instruction_is_one_word() {
        let (ctx, errors) = assemble("mov r1, r2");
        assert!(errors.is_empty());
        assert_eq!(ctx.code.len(), 1);
    }

    #[test]
    fn immediate_operand_emits_extra_word() {
        let (ctx, errors) = assemble("prn #7");
        assert!(errors.is_empty());
        assert_eq!(ctx.code.len(), 2);
        assert_eq!(ctx.code[0].address, 100);
        assert_eq!(ctx.code[1].address, 101);
    }

    #[test]
    fn direct_operand_resolves_to_local_address() {
        let (ctx, errors) = assemble("jmp LOOP\nLOOP: stop");
        assert!(errors.is_empty());
        // header + one extra word for the direct address
        assert_eq!(ctx.code.len(), 3);
        assert_eq!(ctx.code[1].value & 0b111, Are::Relocatable.field_value());
    }

    #[test]
    fn relative_operand_offset_is_symbol_minus_ic_plus_one() {
        let (ctx, errors) = assemble("jmp &LOOP\nLOOP: stop");
        assert!(errors.is_empty());
        // header (address 100) + one extra word (address 101) for the relative offset;
        // LOOP sits at 102, so the offset is 102 - 100 + 1 = 3.
        assert_eq!(ctx.code.len(), 2);
        let extra = ctx.code[1].value;
        assert_eq!((extra >> 3) as i32, 3);
        assert_eq!(extra & 0b111, Are::Absolute.field_value());
    }

    #[test]
    fn extern_operand_is_recorded_in_externals() {
        let (ctx, errors) = assemble(". extern W\nmov W, r1");
        assert!(errors.is_empty());
        assert_eq!(ctx.externals.len(), 1);
        assert_eq!(ctx.externals[0].name.as_ref(), "W");
    }

    #[test]
    fn undefined_symbol_reference_is_reported() {
        let (_, errors) = assemble("jmp GHOST");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::SymbolNotFound));
    }

    #[test]
    fn data_words_land_after_the_code_image() {
        let (ctx, errors) = assemble("mov r1, r2\n.data 5, 6");
        assert!(errors.is_empty());
        assert_eq!(ctx.data[0].address, 101);
        assert_eq!(ctx.data[1].address, 102);
    }

    #[test]
    fn string_directive_emits_a_null_terminator() {
        let (ctx, errors) = assemble(". string \"hi\"");
        assert!(errors.is_empty());
        assert_eq!(ctx.data.len(), 3);
        assert_eq!(ctx.data.last().unwrap().value, 0);
    }
}
