//! Macro preprocessing: comment/blank stripping, `mcro`/`mcroend` handling,
//! and macro-call expansion into the `.am` intermediate line list.
//!
//! The reference assembler has no macro stage at all (its tokenizer reads
//! statements directly). The state-machine shape here — a `match` walked line
//! by line, switching between two modes — is grounded on the reference
//! crate's `tokenizer.rs` per-character state handling, generalized from
//! per-character to per-line granularity, and on `module_manager.rs`'s
//! per-unit line storage (here, the expanded line list instead of a whole
//! translation unit).

use std::collections::HashMap;

use crate::configs::MAX_LINE_LEN;
use crate::error::{AssemblerError, ErrorKind};
use crate::isa;
use crate::token::DirectiveKind;

enum State {
    Default,
    InMacro {
        header_line: String,
        header_line_no: usize,
        body: Vec<String>,
    },
}

pub struct Preprocessed {
    pub lines: Vec<String>,
}

pub fn preprocess(base: &str, raw_lines: &[String], errors: &mut Vec<AssemblerError>) -> Preprocessed {
    let mut macros: HashMap<String, Vec<String>> = HashMap::new();
    let mut out: Vec<String> = Vec::new();
    let mut state = State::Default;

    for (idx, raw_line) in raw_lines.iter().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();

        if trimmed.chars().count() > MAX_LINE_LEN {
            errors.push(AssemblerError::new(
                ErrorKind::LineLen,
                base,
                line_no,
                format!("line exceeds {MAX_LINE_LEN} characters"),
            ));
        }

        match &mut state {
            State::Default => {
                if trimmed.is_empty() || trimmed.starts_with(';') {
                    continue;
                }

                if trimmed.starts_with("mcro") && header_boundary(trimmed) {
                    state = State::InMacro {
                        header_line: trimmed.to_string(),
                        header_line_no: line_no,
                        body: Vec::new(),
                    };
                    continue;
                }

                let normalized = normalize_whitespace(trimmed);
                if let Some(body) = macros.get(normalized.as_str()) {
                    out.extend(body.iter().cloned());
                    continue;
                }

                out.push(normalized);
            }

            State::InMacro { header_line, header_line_no, body } => {
                if trimmed.starts_with("mcroend") && header_boundary_end(trimmed) {
                    let header_line = header_line.clone();
                    let header_line_no = *header_line_no;
                    let body = std::mem::take(body);
                    commit_macro(base, &header_line, header_line_no, body, trimmed, line_no, &mut macros, errors);
                    state = State::Default;
                    continue;
                }

                body.push(raw_line.clone());
            }
        }
    }

    Preprocessed { lines: out }
}

/// `true` if the text right after the literal `"mcro"` is empty, starts with
/// whitespace, or starts with a name-like character — i.e. this really is an
/// attempt at a macro header (possibly missing the space before the name) and
/// not some unrelated identifier that happens to start with those four
/// letters, nor the `mcroend` keyword.
fn header_boundary(trimmed: &str) -> bool {
    let rest = &trimmed[4..];
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        return true;
    }
    !trimmed.starts_with("mcroend") && rest.starts_with(|c: char| c.is_alphanumeric() || c == '_')
}

fn header_boundary_end(trimmed: &str) -> bool {
    let rest = &trimmed[7..];
    rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')
}

fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_reserved_name(name: &str) -> bool {
    isa::is_instruction(name) || isa::is_register(name) || DirectiveKind::from_name(name).is_some()
}

#[allow(clippy::too_many_arguments)]
fn commit_macro(
    base: &str,
    header_line: &str,
    header_line_no: usize,
    body: Vec<String>,
    end_line: &str,
    end_line_no: usize,
    macros: &mut HashMap<String, Vec<String>>,
    errors: &mut Vec<AssemblerError>,
) {
    let mut valid = true;
    let after_mcro = &header_line[4..];
    let mut name: Option<&str> = None;

    if after_mcro.trim().is_empty() {
        errors.push(AssemblerError::new(ErrorKind::MacroName, base, header_line_no, "macro name is missing"));
        valid = false;
    } else if !after_mcro.starts_with(' ') && !after_mcro.starts_with('\t') {
        errors.push(AssemblerError::new(
            ErrorKind::MacroSpaceMissing,
            base,
            header_line_no,
            "missing space between 'mcro' and the macro name",
        ));
        valid = false;
        name = after_mcro.split_whitespace().next();
    } else {
        let mut tokens = after_mcro.split_whitespace();
        name = tokens.next();
        let extra: Vec<&str> = tokens.collect();
        if !extra.is_empty() {
            errors.push(AssemblerError::new(
                ErrorKind::MacroDefExtra,
                base,
                header_line_no,
                format!("unexpected text after macro name: \"{}\"", extra.join(" ")),
            ));
            valid = false;
        }
    }

    let after_end = &end_line[7..];
    if !after_end.trim().is_empty() {
        errors.push(AssemblerError::new(
            ErrorKind::MacroDefExtra,
            base,
            end_line_no,
            "unexpected text after 'mcroend'",
        ));
        valid = false;
    }

    if let Some(raw_name) = name {
        let label_like = raw_name.ends_with(':');
        let stripped = raw_name.strip_suffix(':').unwrap_or(raw_name);

        if label_like {
            errors.push(AssemblerError::new(
                ErrorKind::MacroName,
                base,
                header_line_no,
                format!("macro name \"{raw_name}\" looks like a label"),
            ));
            valid = false;
        }

        if stripped.len() > crate::configs::MAX_LABEL_LEN {
            errors.push(AssemblerError::new(
                ErrorKind::MacroName,
                base,
                header_line_no,
                format!("macro name \"{stripped}\" exceeds {} characters", crate::configs::MAX_LABEL_LEN),
            ));
            valid = false;
        }

        if macros.contains_key(stripped) {
            errors.push(AssemblerError::new(
                ErrorKind::MacroName,
                base,
                header_line_no,
                format!("macro \"{stripped}\" is already defined"),
            ));
            valid = false;
        }

        if let Some(first) = stripped.chars().next() {
            if first.is_ascii_digit() || first.is_ascii_uppercase() {
                errors.push(AssemblerError::new(
                    ErrorKind::MacroName,
                    base,
                    header_line_no,
                    format!("macro name \"{stripped}\" cannot start with a digit or uppercase letter"),
                ));
                valid = false;
            }
        }

        if !stripped.chars().all(|c| c.is_alphanumeric() || c == '_') {
            errors.push(AssemblerError::new(
                ErrorKind::MacroDefExtra,
                base,
                header_line_no,
                format!("macro name \"{stripped}\" contains characters other than letters, digits or underscore"),
            ));
            valid = false;
        }

        if is_reserved_name(stripped) {
            errors.push(AssemblerError::new(
                ErrorKind::MacroName,
                base,
                header_line_no,
                format!("macro name \"{stripped}\" collides with a reserved name"),
            ));
            valid = false;
        }

        if valid {
            macros.insert(stripped.to_string(), body);
        }
    }
}
