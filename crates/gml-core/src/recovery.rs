//! Argument-separator recovery
//!
//! When a strict parse fails, the projector looks for whitespace gaps between
//! two call arguments that lack a comma (`foo(1 2)`) and produces a patched
//! copy of the source with the commas inserted. Every insertion is recorded
//! so that positions in the patched text can be mapped back.

use crate::scan::mask_comments_and_strings;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertionKind {
    InsertedArgumentSeparator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInsertion {
    pub kind: InsertionKind,
    /// Offset of the inserted text in the patched source.
    pub recovered_offset: usize,
    /// Offset in the unpatched source the text was inserted before.
    pub original_offset: usize,
    pub inserted_text: String,
}

impl RecoveryInsertion {
    fn separator(original_offset: usize, recovered_offset: usize) -> Self {
        Self {
            kind: InsertionKind::InsertedArgumentSeparator,
            recovered_offset,
            original_offset,
            inserted_text: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub patched_text: String,
    pub insertions: Vec<RecoveryInsertion>,
}

impl Projection {
    /// No insertions means no recovery is possible for this text.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }
}

/// Keywords whose parenthesised head is not an argument list.
const NON_CALL_KEYWORDS: [&str; 9] = [
    "if",
    "for",
    "while",
    "switch",
    "repeat",
    "with",
    "function",
    "constructor",
    "catch",
];

pub fn project(text: &str) -> Projection {
    let masked = mask_comments_and_strings(text);
    let bytes = masked.as_bytes();

    let mut offsets = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !is_space(bytes[i]) {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }

        if run_start > 0 && i < bytes.len() && gap_needs_separator(bytes, run_start - 1, i) {
            offsets.push(run_start);
        }
    }

    if offsets.is_empty() {
        return Projection {
            patched_text: text.to_string(),
            insertions: Vec::new(),
        };
    }

    let mut patched_text = String::with_capacity(text.len() + offsets.len());
    let mut insertions = Vec::with_capacity(offsets.len());
    let mut last = 0;

    for (inserted, &offset) in offsets.iter().enumerate() {
        patched_text.push_str(&text[last..offset]);
        insertions.push(RecoveryInsertion::separator(offset, offset + inserted));
        patched_text.push(',');
        last = offset;
    }
    patched_text.push_str(&text[last..]);

    debug!("Projected {} argument separators", insertions.len());

    Projection {
        patched_text,
        insertions,
    }
}

/// Map an offset in the patched text back to the unpatched one.
pub fn map_recovered_index_to_original(index: usize, insertions: &[RecoveryInsertion]) -> usize {
    let removed: usize = insertions
        .iter()
        .filter(|insertion| insertion.recovered_offset < index)
        .map(|insertion| insertion.inserted_text.len())
        .sum();
    index.saturating_sub(removed)
}

/// `prev` and `next` are the bytes on either side of a whitespace run.
fn gap_needs_separator(bytes: &[u8], prev: usize, next: usize) -> bool {
    if !can_end_argument(bytes[prev]) || !can_start_argument(bytes[next]) {
        return false;
    }

    match unmatched_opener(bytes, prev) {
        Some(open) => bytes[open] == b'(' && is_call_head(bytes, open),
        None => false,
    }
}

/// Walk back from `from` (inclusive) to the nearest opener with no matching
/// closer in between.
fn unmatched_opener(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;

    for i in (0..=from).rev() {
        match bytes[i] {
            b')' | b']' | b'}' => depth += 1,
            b'(' | b'[' | b'{' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    None
}

/// An opening paren is a call head when it follows an identifier that is
/// neither a control keyword nor a function name being declared.
fn is_call_head(bytes: &[u8], open: usize) -> bool {
    let callee_end = skip_space_back(bytes, open);
    let callee = word_before(bytes, callee_end);
    if callee.is_empty() || callee.as_bytes()[0].is_ascii_digit() {
        return false;
    }
    if NON_CALL_KEYWORDS.contains(&callee) {
        return false;
    }

    let keyword_end = skip_space_back(bytes, callee_end - callee.len());
    word_before(bytes, keyword_end) != "function"
}

fn skip_space_back(bytes: &[u8], mut end: usize) -> usize {
    while end > 0 && is_space(bytes[end - 1]) {
        end -= 1;
    }
    end
}

/// The identifier-like word ending right before `end`.
fn word_before(bytes: &[u8], end: usize) -> &str {
    let mut start = end;
    while start > 0 && is_word(bytes[start - 1]) {
        start -= 1;
    }
    std::str::from_utf8(&bytes[start..end]).unwrap_or("")
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Identifier or number byte. Non-ASCII bytes only occur inside identifiers
/// once comments and strings are masked.
fn is_word(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

fn can_end_argument(byte: u8) -> bool {
    is_word(byte) || matches!(byte, b'"' | b'\'' | b')' | b']' | b'}')
}

fn can_start_argument(byte: u8) -> bool {
    is_word(byte) || matches!(byte, b'"' | b'\'' | b'(' | b'[' | b'{')
}
