//! Two-phase tokenizer: lexeme splitting + phase-1 classification, then a
//! context-sensitive phase-2 reclassification pass.
//!
//! Grounded on the reference assembler's `token.rs`/`tokenizer.rs` (the
//! closed token-kind enum and the character-class predicates), but the
//! splitting itself is done with `regex` rather than a hand-rolled character
//! automaton, following `kitrofimov-chip8vm`'s `assembler` crate, whose
//! tokenizer is the one example in the retrieval pack that reaches for regex
//! to classify assembly lexemes by whole pattern instead of character by
//! character.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AssemblerError, ErrorKind};
use crate::isa;
use crate::token::{DirectiveKind, Token, TokenKind};

lazy_static! {
    /// Punctuation chars are matched one at a time; numbers keep an optional
    /// leading sign; everything else that isn't whitespace falls into the
    /// catch-all so it still becomes a token (and, later, an error) instead
    /// of silently vanishing.
    static ref LEXEME_RE: Regex =
        Regex::new(r#"[,.:&#"]|[+-]?[0-9]+|[A-Za-z_][A-Za-z0-9_]*|[^\s,.:&#"]+"#).unwrap();
}

pub struct LexedLine<'p> {
    pub line_no: usize,
    pub tokens: Vec<Token<'p>>,
}

/// A lexeme with its byte span in the source line, used only internally to
/// detect "no separating space" adjacency during phase 2.
struct Spanned<'p> {
    kind: TokenKind,
    lexeme: &'p str,
    start: usize,
    end: usize,
}

fn classify_phase1(lexeme: &str) -> TokenKind {
    match lexeme {
        "," => return TokenKind::Comma,
        "." => return TokenKind::Dot,
        ":" => return TokenKind::Colon,
        "&" => return TokenKind::Amp,
        "#" => return TokenKind::Hash,
        "\"" => return TokenKind::Quote,
        _ => {}
    }

    if isa::is_instruction(lexeme) {
        return TokenKind::Instruction;
    }
    if isa::is_register(lexeme) {
        return TokenKind::Register;
    }
    if let Some(kind) = DirectiveKind::from_name(lexeme) {
        return TokenKind::Directive(kind);
    }

    let mut chars = lexeme.chars();
    if let Some(first) = chars.next() {
        if first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return TokenKind::Identifier;
        }
    }

    TokenKind::Unknown
}

fn phase1_split(line: &str) -> Vec<Spanned<'_>> {
    LEXEME_RE
        .find_iter(line)
        .map(|m| Spanned {
            kind: classify_phase1(m.as_str()),
            lexeme: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

fn phase2_reclassify(base: &str, line_no: usize, tokens: &mut [Spanned<'_>], errors: &mut Vec<AssemblerError>) {
    // IDENT ':' -> LABEL
    for i in 0..tokens.len() {
        if tokens[i].kind == TokenKind::Identifier
            && tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Colon)
        {
            tokens[i].kind = TokenKind::Label;
        }
    }

    // COLON immediately followed by DOT (no separating space) is illegal.
    for i in 0..tokens.len().saturating_sub(1) {
        if tokens[i].kind == TokenKind::Colon
            && tokens[i + 1].kind == TokenKind::Dot
            && tokens[i].end == tokens[i + 1].start
        {
            errors.push(AssemblerError::new(
                ErrorKind::MissingSpace,
                base,
                line_no,
                "a label's colon and a following directive's dot must be separated by whitespace",
            ));
        }
    }

    // Everything strictly between a QUOTE and its matching QUOTE becomes STRING_LITERAL.
    let mut in_string = false;
    for token in tokens.iter_mut() {
        if token.kind == TokenKind::Quote {
            in_string = !in_string;
            continue;
        }
        if in_string {
            token.kind = TokenKind::StringLiteral;
        }
    }

    // '#' X -> X becomes IMMEDIATE, and a chain of ", Y" after an immediate
    // keeps marking Y as IMMEDIATE too.
    let mut in_immediate_chain = false;
    for i in 0..tokens.len() {
        match tokens[i].kind {
            TokenKind::Hash => {
                if let Some(next) = tokens.get_mut(i + 1) {
                    if next.kind != TokenKind::StringLiteral {
                        next.kind = TokenKind::Immediate;
                    }
                }
                in_immediate_chain = true;
            }
            TokenKind::Comma => {
                if in_immediate_chain {
                    if let Some(next) = tokens.get_mut(i + 1) {
                        if next.kind != TokenKind::StringLiteral {
                            next.kind = TokenKind::Immediate;
                        }
                    }
                }
            }
            TokenKind::StringLiteral | TokenKind::Quote => {}
            _ => in_immediate_chain = false,
        }
    }

    // Inside a '.data' directive, every non-comma token after the directive
    // keyword becomes IMMEDIATE.
    if let Some(data_pos) = tokens.iter().position(|t| t.kind == TokenKind::Directive(DirectiveKind::Data)) {
        for token in tokens.iter_mut().skip(data_pos + 1) {
            if token.kind != TokenKind::Comma {
                token.kind = TokenKind::Immediate;
            }
        }
    }

    // Whatever is still UNKNOWN after every context rule has had a chance is invalid.
    for token in tokens.iter_mut() {
        if token.kind == TokenKind::Unknown {
            errors.push(AssemblerError::new(
                ErrorKind::InvalidToken,
                base,
                line_no,
                format!("invalid token \"{}\"", token.lexeme),
            ));
            token.kind = TokenKind::Invalid;
        }
    }
}

pub fn lex_all<'p>(base: &str, lines: &'p [String], errors: &mut Vec<AssemblerError>) -> Vec<LexedLine<'p>> {
    let mut out = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let mut spanned = phase1_split(line);
        phase2_reclassify(base, line_no, &mut spanned, errors);

        let tokens = spanned
            .into_iter()
            .map(|s| Token::new(s.kind, s.lexeme, line_no))
            .collect();

        out.push(LexedLine { line_no, tokens });
    }

    out
}
