//! Prompt Composer — fills `{slot}` placeholders in an instruction template.
//!
//! Slot syntax: `{name}` where `name` is `[A-Za-z_][A-Za-z0-9_]*`.
//! `{{` and `}}` produce literal braces; any other brace is literal text.
//! Bound values are inserted verbatim and never re-scanned for slots.

use std::collections::HashMap;

use thiserror::Error;

/// Name → value map used to fill a `PromptSpec`.
pub type Bindings<'a> = HashMap<&'a str, &'a str>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt slot '{{{slot}}}' has no binding")]
    MissingBinding { slot: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed instruction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    source: String,
    segments: Vec<Segment>,
}

impl PromptSpec {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse(&source);
        Self { source, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Distinct slot names in order of first appearance.
    pub fn slots(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(name) = segment {
                if !seen.contains(&name.as_str()) {
                    seen.push(name);
                }
            }
        }
        seen
    }
}

/// Renders `spec` with `bindings`. Fails before producing any output if a slot is unbound.
pub fn compose(spec: &PromptSpec, bindings: &Bindings<'_>) -> Result<String, PromptError> {
    if let Some(slot) = spec.slots().into_iter().find(|s| !bindings.contains_key(s)) {
        return Err(PromptError::MissingBinding {
            slot: slot.to_string(),
        });
    }

    let mut out = String::with_capacity(
        spec.source.len() + bindings.values().map(|v| v.len()).sum::<usize>(),
    );
    for segment in &spec.segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Slot(name) => out.push_str(bindings[name.as_str()]),
        }
    }
    Ok(out)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn parse(source: &str) -> Vec<Segment> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                literal.push('{');
                i += 2;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                literal.push('}');
                i += 2;
            }
            b'{' => {
                let start = i + 1;
                let mut end = start;
                if bytes.get(start).copied().is_some_and(is_ident_start) {
                    end += 1;
                    while bytes.get(end).copied().is_some_and(is_ident_continue) {
                        end += 1;
                    }
                }
                if end > start && bytes.get(end) == Some(&b'}') {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(source[start..end].to_string()));
                    i = end + 1;
                } else {
                    literal.push('{');
                    i += 1;
                }
            }
            _ => {
                // Copy everything up to the next brace in one go.
                let rest = &source[i..];
                let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                let next = rest[first..]
                    .find(|c: char| c == '{' || c == '}')
                    .map(|offset| i + first + offset)
                    .unwrap_or(bytes.len());
                literal.push_str(&source[i..next]);
                i = next;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
