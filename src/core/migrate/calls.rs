//! Argument-aware call rewriting.
//!
//! Splits call arguments on top-level commas only, so nested calls, array
//! subscripts, braces and string/char literals containing `,` or `)` stay
//! inside their argument.

use serde::Serialize;

/// Rewrite `name(a0, a1, ..)` calls with exactly `arity` arguments, keeping
/// only the arguments at `keep` (in that order).
#[derive(Debug, Clone, Serialize)]
pub struct CallRewrite {
    pub name: String,
    pub arity: usize,
    pub keep: Vec<usize>,
}

impl CallRewrite {
    pub fn new(name: &str, arity: usize, keep: &[usize]) -> Self {
        Self {
            name: name.to_string(),
            arity,
            keep: keep.to_vec(),
        }
    }

    /// Apply to `text`, returning the new text and the number of calls rewritten.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut search = 0;
        let mut count = 0;

        while let Some(pos) = text[search..].find(&self.name) {
            let start = search + pos;
            let name_end = start + self.name.len();
            search = name_end;

            if start > 0 && is_ident_byte(bytes[start - 1]) {
                continue;
            }
            if name_end < bytes.len() && is_ident_byte(bytes[name_end]) {
                continue;
            }

            let mut open = name_end;
            while open < bytes.len() && bytes[open].is_ascii_whitespace() {
                open += 1;
            }
            if open >= bytes.len() || bytes[open] != b'(' {
                continue;
            }

            let Some((args, close)) = split_args(text, open) else {
                continue;
            };
            if args.len() != self.arity {
                continue;
            }

            let kept: Vec<String> = self
                .keep
                .iter()
                .filter_map(|&i| args.get(i))
                .map(|arg| {
                    let (inner, nested) = self.apply(arg.trim());
                    count += nested;
                    inner
                })
                .collect();

            out.push_str(&text[copied..start]);
            out.push_str(&self.name);
            out.push('(');
            out.push_str(&kept.join(", "));
            out.push(')');
            copied = close + 1;
            search = close + 1;
            count += 1;
        }

        out.push_str(&text[copied..]);
        (out, count)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split the argument list whose `(` is at `open`.
///
/// Returns the raw (untrimmed) argument slices and the index of the matching
/// `)`, or `None` when the list is unbalanced or a literal is unterminated.
pub fn split_args(text: &str, open: usize) -> Option<(Vec<&str>, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut arg_start = open + 1;
    let mut i = open + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_literal(bytes, i)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = text[i..].find('\n').map(|n| i + n)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map(|n| i + 2 + n + 2)?;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    if bytes[i] != b')' {
                        return None;
                    }
                    let last = &text[arg_start..i];
                    if !(args.is_empty() && last.trim().is_empty()) {
                        args.push(last);
                    }
                    return Some((args, i));
                }
                depth -= 1;
            }
            b',' if depth == 0 => {
                args.push(&text[arg_start..i]);
                arg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index just past the closing quote of the literal starting at `start`.
fn skip_literal(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
