//! Text rewrites applied before parsing

use crate::scan::{brace_balance, count_unclosed_braces, scan, ScanState, Segment};
use gml_grammar::RecognitionError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// `/ @tag` at the start of a line: a doc comment missing its second slash.
static MALFORMED_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(/)[ \t]+@[A-Za-z_]").unwrap());

static MISSING_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)missing associated closing brace").unwrap());

/// Lower-case `N R T B F V A U X` directly after a backslash inside ordinary
/// and template string literals. Length and line structure are unchanged.
pub fn normalize_escape_case(text: &str) -> String {
    let mut positions = Vec::new();

    scan(text, |i, ch, segment| {
        if let Segment::String {
            escaped: true,
            verbatim: false,
        } = segment
        {
            if matches!(ch, 'N' | 'R' | 'T' | 'B' | 'F' | 'V' | 'A' | 'U' | 'X') {
                positions.push(i);
            }
        }
    });

    if positions.is_empty() {
        return text.to_string();
    }
    debug!("Normalized {} escape sequences", positions.len());

    let mut bytes = text.as_bytes().to_vec();
    for i in positions {
        bytes[i] = bytes[i].to_ascii_lowercase();
    }
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

/// Characters inserted by a rewrite, in rewritten-text coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub at: usize,
    pub len: usize,
}

/// Maps offsets in a rewritten text back to the text it was produced from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapper {
    shifts: Vec<Shift>,
}

impl IndexMapper {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn map(&self, index: usize) -> usize {
        let removed: usize = self
            .shifts
            .iter()
            .take_while(|shift| shift.at < index)
            .map(|shift| shift.len)
            .sum();
        index - removed.min(index)
    }
}

#[derive(Debug, Clone)]
pub struct CommentFix {
    pub text: String,
    pub index_mapper: IndexMapper,
}

/// Rewrite `/ @tag` lines into `// @tag` line comments.
pub fn fix_malformed_comments(text: &str) -> CommentFix {
    let mut output = String::with_capacity(text.len());
    let mut shifts = Vec::new();
    let mut last = 0;

    for captures in MALFORMED_COMMENT.captures_iter(text) {
        let Some(slash) = captures.get(1) else {
            continue;
        };

        output.push_str(&text[last..slash.end()]);
        shifts.push(Shift {
            at: output.len(),
            len: 1,
        });
        output.push('/');
        last = slash.end();
    }

    if shifts.is_empty() {
        return CommentFix {
            text: text.to_string(),
            index_mapper: IndexMapper::identity(),
        };
    }

    output.push_str(&text[last..]);
    debug!("Repaired {} malformed comment markers", shifts.len());

    CommentFix {
        text: output,
        index_mapper: IndexMapper { shifts },
    }
}

pub fn is_missing_brace_error(error: &RecognitionError) -> bool {
    MISSING_BRACE.is_match(&error.message)
}

/// Close every block left open at the end of `text`. Returns `None` when the
/// error is unrelated or the braces are already balanced.
pub fn recover_source_from_missing_brace(text: &str, error: &RecognitionError) -> Option<String> {
    if !is_missing_brace_error(error) || count_unclosed_braces(text) == 0 {
        return None;
    }

    Some(append_missing_closing_braces(text))
}

/// Append one `}` line per unclosed brace, starting on a fresh line. A trailing
/// block comment or verbatim string is closed first so the braces land in
/// code.
pub fn append_missing_closing_braces(text: &str) -> String {
    let (count, state) = brace_balance(text);
    if count == 0 {
        return text.to_string();
    }

    let mut patched = text.to_string();
    match state {
        ScanState::InBlockComment => patched.push_str("*/"),
        ScanState::InString {
            quote,
            verbatim: true,
        } => patched.push(quote),
        _ => {}
    }

    if state == ScanState::InLineComment || !patched.ends_with(['\n', '\r']) {
        patched.push('\n');
    }
    patched.push_str(&"}\n".repeat(count));
    patched
}
