//! Textual listing format for Slate assembly.
//!
//! One item per line; `;` starts a comment. Label definitions end with `:`,
//! label operands are written `:name`, and jump operations may carry an
//! `[in]` / `[out]` call-idiom annotation:
//!
//! ```text
//! square:
//!     dup1
//!     mul
//!     jump [out]
//! main:
//!     push 7
//!     push :ret
//!     push :square
//!     jump [in]
//! ret:
//!     stop
//! ```
//!
//! Named labels are assigned numeric identifiers in order of first
//! appearance; numeric label spellings (`3:`, `push :3`) use the written
//! value, so a printed listing parses back to the same item stream.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use core::fmt;

use thiserror::Error;

use crate::{AsmItem, JumpKind, Label, Opcode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: malformed label `{token}`")]
    MalformedLabel { line: usize, token: String },

    #[error("line {line}: `push` expects a value or `:label` operand")]
    MissingPushOperand { line: usize },

    #[error("line {line}: invalid literal `{token}`")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: `{token}` is not a valid jump annotation (`[in]` or `[out]`)")]
    BadJumpAnnotation { line: usize, token: String },

    #[error("line {line}: trailing tokens after `{token}`")]
    TrailingTokens { line: usize, token: String },
}

/// Parses a listing into an item stream.
pub fn parse_program(source: &str) -> Result<Vec<AsmItem>, ParseError> {
    let mut items = Vec::new();
    let mut labels = LabelInterner::default();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let stripped = raw.split(';').next().unwrap_or("").trim();
        if stripped.is_empty() {
            continue;
        }

        if let Some(name) = stripped.strip_suffix(':') {
            if name.split_whitespace().count() > 1 {
                return Err(ParseError::MalformedLabel {
                    line,
                    token: stripped.into(),
                });
            }
            let label = labels.resolve(name.trim(), line)?;
            items.push(AsmItem::LabelDef(label));
            continue;
        }

        let mut tokens = stripped.split_whitespace();
        let mnemonic = tokens.next().unwrap_or("");
        match mnemonic {
            "push" => {
                let operand = tokens
                    .next()
                    .ok_or(ParseError::MissingPushOperand { line })?;
                if let Some(name) = operand.strip_prefix(':') {
                    items.push(AsmItem::PushLabel(labels.resolve(name, line)?));
                } else {
                    let value = parse_literal(operand).ok_or_else(|| ParseError::InvalidLiteral {
                        line,
                        token: operand.into(),
                    })?;
                    items.push(AsmItem::PushData(value));
                }
            }
            _ => {
                let op = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                    ParseError::UnknownMnemonic {
                        line,
                        mnemonic: mnemonic.into(),
                    }
                })?;
                let jump = match tokens.next() {
                    None => JumpKind::Ordinary,
                    Some("[in]") if op.is_jump() => JumpKind::IntoCall,
                    Some("[out]") if op.is_jump() => JumpKind::OutOfCall,
                    Some(other) if op.is_jump() => {
                        return Err(ParseError::BadJumpAnnotation {
                            line,
                            token: other.into(),
                        })
                    }
                    Some(_) => {
                        return Err(ParseError::TrailingTokens {
                            line,
                            token: mnemonic.into(),
                        })
                    }
                };
                items.push(AsmItem::Op { op, jump });
            }
        }

        if tokens.next().is_some() {
            return Err(ParseError::TrailingTokens {
                line,
                token: mnemonic.into(),
            });
        }
    }

    Ok(items)
}

/// Renders an item stream back into listing form.
pub fn format_program(items: &[AsmItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            AsmItem::LabelDef(_) => {
                let _ = writeln!(out, "{item}");
            }
            _ => {
                let _ = writeln!(out, "    {item}");
            }
        }
    }
    out
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Op { op, jump } => {
                f.write_str(op.mnemonic())?;
                if op.is_jump() {
                    match jump {
                        JumpKind::Ordinary => {}
                        JumpKind::IntoCall => f.write_str(" [in]")?,
                        JumpKind::OutOfCall => f.write_str(" [out]")?,
                    }
                }
                Ok(())
            }
            AsmItem::PushData(value) => write!(f, "push {value}"),
            AsmItem::PushLabel(label) => write!(f, "push :{label}"),
            AsmItem::LabelDef(label) => write!(f, "{label}:"),
        }
    }
}

/// Maps label spellings to [`Label`] values. Numeric spellings map to their
/// written value; names get the lowest identifier not already taken.
#[derive(Default)]
struct LabelInterner {
    by_name: HashMap<String, Label>,
    taken: HashSet<u64>,
    next_id: u64,
}

impl LabelInterner {
    fn resolve(&mut self, token: &str, line: usize) -> Result<Label, ParseError> {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ParseError::MalformedLabel {
                line,
                token: token.into(),
            });
        }

        if token.chars().all(|c| c.is_ascii_digit()) {
            let value = token
                .parse::<u64>()
                .map_err(|_| ParseError::MalformedLabel {
                    line,
                    token: token.into(),
                })?;
            self.taken.insert(value);
            return Ok(Label::from_u64(value));
        }

        if let Some(label) = self.by_name.get(token) {
            return Ok(*label);
        }
        while self.taken.contains(&self.next_id) {
            self.next_id += 1;
        }
        let label = Label::from_u64(self.next_id);
        self.taken.insert(self.next_id);
        self.by_name.insert(token.into(), label);
        Ok(label)
    }
}

fn parse_literal(token: &str) -> Option<u64> {
    if let Some(hex) = token.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        token.parse().ok()
    }
}
