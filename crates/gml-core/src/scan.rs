//! Lightweight lexical scanner shared by the text rewrites
//!
//! Only distinguishes code from comments and string literals; it never
//! fails, whatever the input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    InLineComment,
    InBlockComment,
    InString { quote: char, verbatim: bool },
}

/// What a scanned character belongs to. Quote and comment delimiters are
/// reported as `Code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Code,
    Comment,
    /// `escaped` is set for the character directly after a backslash.
    String { escaped: bool, verbatim: bool },
}

/// Visit every character of `text` with its byte offset and segment, and
/// return the state the scanner ends in.
///
/// Ordinary strings end at a line break even when unterminated or escaped;
/// verbatim (`@"…"`) strings span lines and have no escapes.
pub fn scan(text: &str, mut visit: impl FnMut(usize, char, Segment)) -> ScanState {
    let mut state = ScanState::Normal;
    let mut escaped = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);

        match state {
            ScanState::Normal => match (ch, next) {
                ('/', Some('/')) | ('/', Some('*')) => {
                    visit(i, ch, Segment::Code);
                    if let Some((j, second)) = chars.next() {
                        visit(j, second, Segment::Code);
                    }
                    state = if next == Some('/') {
                        ScanState::InLineComment
                    } else {
                        ScanState::InBlockComment
                    };
                }
                ('@', Some(quote @ ('"' | '\''))) => {
                    visit(i, ch, Segment::Code);
                    if let Some((j, _)) = chars.next() {
                        visit(j, quote, Segment::Code);
                    }
                    state = ScanState::InString {
                        quote,
                        verbatim: true,
                    };
                }
                ('"' | '\'', _) => {
                    visit(i, ch, Segment::Code);
                    escaped = false;
                    state = ScanState::InString {
                        quote: ch,
                        verbatim: false,
                    };
                }
                _ => visit(i, ch, Segment::Code),
            },
            ScanState::InLineComment => {
                if is_line_break(ch) {
                    visit(i, ch, Segment::Code);
                    state = ScanState::Normal;
                } else {
                    visit(i, ch, Segment::Comment);
                }
            }
            ScanState::InBlockComment => {
                if ch == '*' && next == Some('/') {
                    visit(i, ch, Segment::Code);
                    if let Some((j, slash)) = chars.next() {
                        visit(j, slash, Segment::Code);
                    }
                    state = ScanState::Normal;
                } else {
                    visit(i, ch, Segment::Comment);
                }
            }
            ScanState::InString {
                quote,
                verbatim: true,
            } => {
                if ch == quote {
                    visit(i, ch, Segment::Code);
                    state = ScanState::Normal;
                } else {
                    visit(
                        i,
                        ch,
                        Segment::String {
                            escaped: false,
                            verbatim: true,
                        },
                    );
                }
            }
            ScanState::InString {
                quote,
                verbatim: false,
            } => {
                if is_line_break(ch) {
                    visit(i, ch, Segment::Code);
                    state = ScanState::Normal;
                } else if escaped {
                    visit(
                        i,
                        ch,
                        Segment::String {
                            escaped: true,
                            verbatim: false,
                        },
                    );
                    escaped = false;
                } else if ch == quote {
                    visit(i, ch, Segment::Code);
                    state = ScanState::Normal;
                } else {
                    escaped = ch == '\\';
                    visit(
                        i,
                        ch,
                        Segment::String {
                            escaped: false,
                            verbatim: false,
                        },
                    );
                }
            }
        }
    }

    state
}

pub fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Placeholder written over masked comment and string content.
pub const MASK: u8 = b'#';

/// Same-length copy of `text` with the interior of every comment and string
/// literal replaced by [`MASK`], one per byte. Delimiters and line breaks are
/// kept in place.
pub fn mask_comments_and_strings(text: &str) -> String {
    let mut masked = text.as_bytes().to_vec();

    scan(text, |i, ch, segment| {
        if segment != Segment::Code && !is_line_break(ch) {
            for byte in &mut masked[i..i + ch.len_utf8()] {
                *byte = MASK;
            }
        }
    });

    // Every masked byte run covers whole characters and MASK is ASCII.
    String::from_utf8(masked).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Net `{` left open in code, ignoring comments and strings. A stray `}`
/// never takes the count below zero.
pub fn count_unclosed_braces(text: &str) -> usize {
    brace_balance(text).0
}

pub(crate) fn brace_balance(text: &str) -> (usize, ScanState) {
    let mut depth = 0usize;

    let state = scan(text, |_, ch, segment| {
        if segment == Segment::Code {
            match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    });

    (depth, state)
}
