//! Per-statement parsing: turns one lexed line into a label plus an
//! instruction or a directive, validating everything the lexer couldn't
//! (operand counts, comma placement, addressing-mode legality, label shape).
//!
//! The reference assembler builds and stores an AST node per statement
//! (`ast_node.rs`) that both passes later walk. This ISA's second pass needs
//! nothing from the first pass but the symbol table, so there is no AST to
//! keep alive between passes: `parse_line` is a pure function of a line's
//! tokens, called once by the first pass (to size the statement and declare
//! labels) and again by the second pass (to encode it), the way the
//! reference's own `parser.rs` re-derives an operand's addressing mode from
//! its token shape rather than caching it.

use crate::configs::{MAX_DATA_VALUE, MAX_IMMEDIATE, MAX_LABEL_LEN, MIN_DATA_VALUE, MIN_IMMEDIATE};
use crate::error::{AssemblerError, ErrorKind};
use crate::isa::{self, AddressingMode, InstructionDef};
use crate::token::{DirectiveKind, Token, TokenKind};

#[derive(Debug, Clone, Copy)]
pub enum Operand<'p> {
    Immediate(i32),
    Direct(&'p str),
    Relative(&'p str),
    Register(u8),
}

impl Operand<'_> {
    pub fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::Relative(_) => AddressingMode::Relative,
            Operand::Register(_) => AddressingMode::Register,
        }
    }
}

pub struct ParsedInstruction<'p> {
    pub mnemonic: &'p str,
    pub def: &'static InstructionDef,
    pub operands: Vec<Operand<'p>>,
    pub word_count: usize,
}

pub enum ParsedDirective<'p> {
    Data(Vec<i32>),
    String(String),
    Entry(&'p str),
    Extern(&'p str),
}

pub enum Statement<'p> {
    Instruction(ParsedInstruction<'p>),
    Directive(ParsedDirective<'p>),
}

pub struct ParsedLine<'p> {
    pub label: Option<&'p str>,
    pub statement: Option<Statement<'p>>,
}

pub fn parse_line<'p>(
    tokens: &[Token<'p>],
    base: &str,
    line_no: usize,
    errors: &mut Vec<AssemblerError>,
) -> ParsedLine<'p> {
    let mut pos = 0;
    let mut label = None;

    if let Some(first) = tokens.first() {
        if first.kind == TokenKind::Label {
            if validate_label_name(first.lexeme, base, line_no, errors) {
                label = Some(first.lexeme);
            }
            pos = 2;
        } else if first.kind == TokenKind::Identifier && tokens.len() > 1 {
            errors.push(AssemblerError::new(
                ErrorKind::MissingColon,
                base,
                line_no,
                format!("\"{}\" needs a trailing ':' to be used as a label", first.lexeme),
            ));
            return ParsedLine { label: None, statement: None };
        }
    }

    let statement = match tokens.get(pos).map(|t| t.kind) {
        Some(TokenKind::Instruction) => parse_instruction(tokens, pos, base, line_no, errors).map(Statement::Instruction),
        Some(TokenKind::Dot) => parse_directive(tokens, pos, base, line_no, errors).map(Statement::Directive),
        Some(_) => {
            errors.push(AssemblerError::new(
                ErrorKind::InvalidStatement,
                base,
                line_no,
                "a statement must start with an instruction mnemonic or a directive",
            ));
            None
        }
        None => {
            errors.push(AssemblerError::new(ErrorKind::InvalidStatement, base, line_no, "label with no statement"));
            None
        }
    };

    ParsedLine { label, statement }
}

fn validate_label_name(name: &str, base: &str, line_no: usize, errors: &mut Vec<AssemblerError>) -> bool {
    let mut ok = true;

    if name.is_empty() {
        errors.push(AssemblerError::new(ErrorKind::EmptyLabel, base, line_no, "label name is empty"));
        return false;
    }
    if name.len() > MAX_LABEL_LEN {
        errors.push(AssemblerError::new(
            ErrorKind::MaxLen,
            base,
            line_no,
            format!("label \"{name}\" exceeds {MAX_LABEL_LEN} characters"),
        ));
        ok = false;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        errors.push(AssemblerError::new(
            ErrorKind::StartsWithDigit,
            base,
            line_no,
            format!("label \"{name}\" cannot start with a digit"),
        ));
        ok = false;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        errors.push(AssemblerError::new(
            ErrorKind::InvalidChar,
            base,
            line_no,
            format!("label \"{name}\" contains a character other than a letter, digit or underscore"),
        ));
        ok = false;
    }
    if isa::is_instruction(name) {
        errors.push(AssemblerError::new(
            ErrorKind::CollidesWithInstruction,
            base,
            line_no,
            format!("label \"{name}\" collides with an instruction mnemonic"),
        ));
        ok = false;
    }
    if isa::is_register(name) {
        errors.push(AssemblerError::new(
            ErrorKind::CollidesWithRegister,
            base,
            line_no,
            format!("label \"{name}\" collides with a register name"),
        ));
        ok = false;
    }
    if DirectiveKind::from_name(name).is_some() {
        errors.push(AssemblerError::new(
            ErrorKind::CollidesWithDirective,
            base,
            line_no,
            format!("label \"{name}\" collides with a directive name"),
        ));
        ok = false;
    }

    ok
}

fn take_operand<'p>(
    tokens: &[Token<'p>],
    pos: &mut usize,
    base: &str,
    line_no: usize,
    errors: &mut Vec<AssemblerError>,
) -> Option<Operand<'p>> {
    let head = tokens.get(*pos)?;
    match head.kind {
        TokenKind::Hash => {
            let value_tok = tokens.get(*pos + 1)?;
            match value_tok.lexeme.parse::<i32>() {
                Ok(v) => {
                    *pos += 2;
                    Some(Operand::Immediate(v))
                }
                Err(_) => {
                    errors.push(AssemblerError::new(
                        ErrorKind::InvalidImm,
                        base,
                        line_no,
                        format!("\"{}\" is not a valid immediate value", value_tok.lexeme),
                    ));
                    None
                }
            }
        }
        TokenKind::Amp => {
            let id_tok = tokens.get(*pos + 1)?;
            if id_tok.kind != TokenKind::Identifier {
                return None;
            }
            *pos += 2;
            Some(Operand::Relative(id_tok.lexeme))
        }
        TokenKind::Register => {
            let reg = isa::parse_register(head.lexeme)?;
            *pos += 1;
            Some(Operand::Register(reg))
        }
        TokenKind::Identifier => {
            *pos += 1;
            Some(Operand::Direct(head.lexeme))
        }
        _ => None,
    }
}

fn parse_instruction<'p>(
    tokens: &[Token<'p>],
    start: usize,
    base: &str,
    line_no: usize,
    errors: &mut Vec<AssemblerError>,
) -> Option<ParsedInstruction<'p>> {
    let mnemonic = tokens[start].lexeme;
    let def = isa::lookup(mnemonic)?;
    let mut pos = start + 1;
    let mut operands = Vec::with_capacity(def.operand_count as usize);

    // The comma between two operands is counted, not merely positionally assumed: a
    // two-operand mnemonic must see exactly one, everywhere else a comma outside an
    // operand is simply illegal. This mirrors counting commas across the whole
    // operand region rather than only checking the single expected separator slot.
    let comma_kind = if def.operand_count == 2 { ErrorKind::IllegalNumComma } else { ErrorKind::IllegalComma };

    for i in 0..def.operand_count {
        if i > 0 {
            match tokens.get(pos).map(|t| t.kind) {
                Some(TokenKind::Comma) => pos += 1,
                _ => {
                    errors.push(AssemblerError::new(
                        comma_kind,
                        base,
                        line_no,
                        format!("'{mnemonic}' expects its operands separated by exactly one ','"),
                    ));
                    return None;
                }
            }
        }
        match take_operand(tokens, &mut pos, base, line_no, errors) {
            Some(op) => operands.push(op),
            None if tokens.get(pos).map(|t| t.kind) == Some(TokenKind::Comma) => {
                errors.push(AssemblerError::new(
                    comma_kind,
                    base,
                    line_no,
                    format!("'{mnemonic}' found ',' where an operand was expected"),
                ));
                return None;
            }
            None => {
                errors.push(AssemblerError::new(
                    ErrorKind::WrongOperandCount,
                    base,
                    line_no,
                    format!("'{mnemonic}' is missing an operand"),
                ));
                return None;
            }
        }
    }

    if pos != tokens.len() {
        if tokens[pos].kind == TokenKind::Comma {
            errors.push(AssemblerError::new(
                comma_kind,
                base,
                line_no,
                format!("'{mnemonic}' takes {} operand(s); found an unexpected extra ','", def.operand_count),
            ));
        } else {
            errors.push(AssemblerError::new(
                ErrorKind::WrongOperandCount,
                base,
                line_no,
                format!("'{mnemonic}' takes {} operand(s); found extra text", def.operand_count),
            ));
        }
        return None;
    }

    let mut legal = true;
    if operands.len() == 2 {
        if !isa::mode_allowed(def.src_modes, operands[0].mode()) {
            errors.push(AssemblerError::new(
                ErrorKind::BadAddressingMode,
                base,
                line_no,
                format!("'{mnemonic}' does not allow this addressing mode as its source operand"),
            ));
            legal = false;
        }
        if !isa::mode_allowed(def.dst_modes, operands[1].mode()) {
            errors.push(AssemblerError::new(
                ErrorKind::BadAddressingMode,
                base,
                line_no,
                format!("'{mnemonic}' does not allow this addressing mode as its destination operand"),
            ));
            legal = false;
        }
    } else if let Some(op) = operands.first() {
        if !isa::mode_allowed(def.dst_modes, op.mode()) {
            errors.push(AssemblerError::new(
                ErrorKind::BadAddressingMode,
                base,
                line_no,
                format!("'{mnemonic}' does not allow this addressing mode"),
            ));
            legal = false;
        }
    }

    for op in &operands {
        if let Operand::Immediate(v) = op {
            if *v < MIN_IMMEDIATE || *v > MAX_IMMEDIATE {
                errors.push(AssemblerError::new(
                    ErrorKind::ImmOutOfBounds,
                    base,
                    line_no,
                    format!("immediate value {v} is out of the representable range"),
                ));
                legal = false;
            }
        }
    }

    if !legal {
        return None;
    }

    let word_count = 1 + operands.iter().filter(|op| !matches!(op, Operand::Register(_))).count();

    Some(ParsedInstruction { mnemonic, def, operands, word_count })
}

fn parse_directive<'p>(
    tokens: &[Token<'p>],
    start: usize,
    base: &str,
    line_no: usize,
    errors: &mut Vec<AssemblerError>,
) -> Option<ParsedDirective<'p>> {
    let kind = match tokens.get(start + 1).map(|t| t.kind) {
        Some(TokenKind::Directive(kind)) => kind,
        _ => {
            errors.push(AssemblerError::new(ErrorKind::DotMissing, base, line_no, "expected a directive name after '.'"));
            return None;
        }
    };
    let rest = &tokens[start + 2..];

    match kind {
        DirectiveKind::Data => parse_data(rest, base, line_no, errors).map(ParsedDirective::Data),
        DirectiveKind::String => parse_string(rest, base, line_no, errors).map(ParsedDirective::String),
        DirectiveKind::Entry => parse_symbol_operand(rest, base, line_no, errors).map(ParsedDirective::Entry),
        DirectiveKind::Extern => parse_symbol_operand(rest, base, line_no, errors).map(ParsedDirective::Extern),
    }
}

/// Walks the full comma/value structure in a single left-to-right pass and
/// keeps reporting every malformed spot instead of stopping at the first one,
/// so one run surfaces every defect in a `.data` list instead of just the
/// first comma mistake.
fn parse_data(rest: &[Token], base: &str, line_no: usize, errors: &mut Vec<AssemblerError>) -> Option<Vec<i32>> {
    if rest.is_empty() {
        errors.push(AssemblerError::new(ErrorKind::WrongOperandCount, base, line_no, "'.data' requires at least one value"));
        return None;
    }

    let mut values = Vec::new();
    let mut ok = true;
    let mut expect_value = true;
    let mut prev_was_comma = false;

    for token in rest {
        match (expect_value, token.kind) {
            (true, TokenKind::Comma) => {
                let kind = if prev_was_comma { ErrorKind::MultiComma } else { ErrorKind::DataIllegalComma };
                errors.push(AssemblerError::new(kind, base, line_no, "expected a value before ','"));
                ok = false;
                prev_was_comma = true;
            }
            (true, _) => {
                match token.lexeme.parse::<i64>() {
                    Ok(v) if (MIN_DATA_VALUE..=MAX_DATA_VALUE).contains(&v) => values.push(v as i32),
                    Ok(_) => {
                        errors.push(AssemblerError::new(
                            ErrorKind::ImmOutOfBounds,
                            base,
                            line_no,
                            format!("value {} does not fit in a data word", token.lexeme),
                        ));
                        ok = false;
                    }
                    Err(_) => {
                        errors.push(AssemblerError::new(
                            ErrorKind::InvalidData,
                            base,
                            line_no,
                            format!("\"{}\" is not a valid integer", token.lexeme),
                        ));
                        ok = false;
                    }
                }
                expect_value = false;
                prev_was_comma = false;
            }
            (false, TokenKind::Comma) => {
                expect_value = true;
                prev_was_comma = true;
            }
            (false, _) => {
                errors.push(AssemblerError::new(ErrorKind::DataIllegalComma, base, line_no, "expected ',' between values"));
                ok = false;
                prev_was_comma = false;
            }
        }
    }

    if expect_value {
        errors.push(AssemblerError::new(ErrorKind::DataIllegalComma, base, line_no, "trailing ',' with no value after it"));
        ok = false;
    }

    ok.then_some(values)
}

fn parse_string(rest: &[Token], base: &str, line_no: usize, errors: &mut Vec<AssemblerError>) -> Option<String> {
    if rest.first().map(|t| t.kind) != Some(TokenKind::Quote) {
        errors.push(AssemblerError::new(ErrorKind::StrMissingQuote, base, line_no, "'.string' requires an opening '\"'"));
        return None;
    }

    let close = rest.iter().skip(1).position(|t| t.kind == TokenKind::Quote).map(|p| p + 1);
    let close = match close {
        Some(c) => c,
        None => {
            errors.push(AssemblerError::new(ErrorKind::StrMissingQuote, base, line_no, "'.string' is missing its closing '\"'"));
            return None;
        }
    };

    if close + 1 != rest.len() {
        errors.push(AssemblerError::new(ErrorKind::StrIllegalComma, base, line_no, "unexpected text after the closing '\"'"));
        return None;
    }

    Some(rest[1..close].iter().map(|t| t.lexeme).collect::<Vec<_>>().join(" "))
}

fn parse_symbol_operand<'p>(
    rest: &[Token<'p>],
    base: &str,
    line_no: usize,
    errors: &mut Vec<AssemblerError>,
) -> Option<&'p str> {
    if rest.len() != 1 || rest[0].kind != TokenKind::Identifier {
        errors.push(AssemblerError::new(
            ErrorKind::WrongOperandCount,
            base,
            line_no,
            "directive requires exactly one symbol name",
        ));
        return None;
    }
    let name = rest[0].lexeme;
    validate_label_name(name, base, line_no, errors).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_all;

    fn parse(src: &str) -> (ParsedLine<'static>, Vec<AssemblerError>) {
        // leak the owned line so its borrow can outlive this helper, same
        // trick `Box::leak` serves the reference crate for, used only here
        // to keep test call sites terse.
        let line: &'static str = Box::leak(src.to_string().into_boxed_str());
        let lines: &'static [String] = Box::leak(vec![line.to_string()].into_boxed_slice());
        let mut lex_errors = Vec::new();
        let lexed = lex_all("t", lines, &mut lex_errors);
        let mut errors = Vec::new();
        let parsed = parse_line(&lexed[0].tokens, "t", 1, &mut errors);
        (parsed, errors)
    }

    #[test]
    fn parses_two_operand_instruction() {
        let (parsed, errors) = parse("mov r1, r2");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Instruction(instr)) => {
                assert_eq!(instr.mnemonic, "mov");
                assert_eq!(instr.operands.len(), 2);
                assert_eq!(instr.word_count, 1);
            }
            _ => panic!("expected an instruction"),
        }
    }

    #[test]
    fn immediate_and_direct_operand_cost_extra_words() {
        let (parsed, errors) = parse("cmp #5, COUNT");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Instruction(instr)) => assert_eq!(instr.word_count, 3),
            _ => panic!("expected an instruction"),
        }
    }

    #[test]
    fn missing_comma_between_two_operands_is_an_illegal_num_comma() {
        let (_, errors) = parse("mov r1 r2");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::IllegalNumComma));
    }

    #[test]
    fn stray_comma_where_an_operand_is_expected_is_an_illegal_num_comma() {
        let (_, errors) = parse("mov r1,, r2");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::IllegalNumComma));
    }

    #[test]
    fn rejects_disallowed_addressing_mode() {
        let (_, errors) = parse("lea #5, r2");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::BadAddressingMode));
    }

    #[test]
    fn label_with_colon_is_recognized() {
        let (parsed, errors) = parse("MAIN: stop");
        assert!(errors.is_empty());
        assert_eq!(parsed.label, Some("MAIN"));
    }

    #[test]
    fn missing_colon_after_would_be_label_is_reported() {
        let (_, errors) = parse("MAIN stop");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::MissingColon));
    }

    #[test]
    fn data_directive_collects_values() {
        let (parsed, errors) = parse(". data 6, -9, 12");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Directive(ParsedDirective::Data(values))) => assert_eq!(values, vec![6, -9, 12]),
            _ => panic!("expected a data directive"),
        }
    }

    #[test]
    fn data_directive_with_double_comma_is_rejected() {
        let (_, errors) = parse(". data 6, , 12");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::MultiComma));
    }

    #[test]
    fn data_value_at_the_24_bit_boundary_is_accepted_one_past_is_rejected() {
        let (parsed, errors) = parse(". data 16777215, -16777216");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Directive(ParsedDirective::Data(values))) => {
                assert_eq!(values, vec![16777215, -16777216]);
            }
            _ => panic!("expected a data directive"),
        }

        let (_, errors) = parse(". data 16777216");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::ImmOutOfBounds));

        let (_, errors) = parse(". data -16777217");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::ImmOutOfBounds));
    }

    #[test]
    fn string_directive_reads_its_payload() {
        let (parsed, errors) = parse(". string \"hi there\"");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Directive(ParsedDirective::String(s))) => assert_eq!(s, "hi there"),
            _ => panic!("expected a string directive"),
        }
    }

    #[test]
    fn extern_directive_reads_symbol_name() {
        let (parsed, errors) = parse(". extern COUNT");
        assert!(errors.is_empty());
        match parsed.statement {
            Some(Statement::Directive(ParsedDirective::Extern(name))) => assert_eq!(name, "COUNT"),
            _ => panic!("expected an extern directive"),
        }
    }

    #[test]
    fn label_colliding_with_register_name_is_rejected() {
        let (_, errors) = parse("r1: stop");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::CollidesWithRegister));
    }

    #[test]
    fn immediate_out_of_range_is_rejected() {
        let (_, errors) = parse("prn #99999999");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::ImmOutOfBounds));
    }
}
