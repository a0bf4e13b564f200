//! Comment and whitespace harvesting
//!
//! The parser only consumes the default token channel. This second pass
//! rewinds the same token stream and collects what the parser skipped.

use crate::ast::{Node, NodeKind, Program};
use crate::line_index::LineIndex;
use gml_grammar::{Channel, RecognitionResult, Token, TokenKind, TokenStream};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct HiddenNodes {
    pub comments: Vec<Node>,
    pub whitespaces: Vec<Node>,
    /// Hidden-channel tokens seen during the pass.
    pub scanned: usize,
}

/// Re-lex the whole input from the first character. Must only run once the
/// structural parse is complete.
pub fn collect(stream: &mut TokenStream) -> RecognitionResult<HiddenNodes> {
    stream.reset();

    let mut tokens = Vec::new();
    loop {
        let token = stream.next_token()?;
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }

    let text = stream.text();
    let lines = LineIndex::new(text);
    let mut hidden = HiddenNodes {
        scanned: tokens
            .iter()
            .filter(|token| token.channel == Channel::Hidden)
            .count(),
        ..HiddenNodes::default()
    };

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::LineComment | TokenKind::BlockComment => {
                let kind = comment_kind(token, &tokens[..i], &tokens[i + 1..]);
                hidden.comments.push(Node::new(
                    kind,
                    lines.position(token.start),
                    lines.position(token.stop),
                ));
                i += 1;
            }
            TokenKind::Whitespace | TokenKind::LineTerminator => {
                let end = run_end(&tokens, i);
                let value = tokens[i..end].iter().map(|t| t.text.as_str()).collect();
                hidden.whitespaces.push(Node::new(
                    NodeKind::Whitespace { value },
                    lines.position(token.start),
                    lines.position(tokens[end - 1].stop),
                ));
                i = end;
            }
            _ => i += 1,
        }
    }

    debug!(
        "Hidden pass: {} tokens, {} comments, {} whitespace runs",
        hidden.scanned,
        hidden.comments.len(),
        hidden.whitespaces.len()
    );

    Ok(hidden)
}

/// Append the harvested nodes to the program without touching its body.
pub fn attach(program: &mut Program, hidden: HiddenNodes) {
    program.comments.extend(hidden.comments);
    program.whitespaces.extend(hidden.whitespaces);
}

fn comment_kind(token: &Token, before: &[Token], after: &[Token]) -> NodeKind {
    let leading_whitespace = adjacent_whitespace(before.iter().rev(), true);
    let trailing_whitespace = adjacent_whitespace(after.iter(), false);

    if token.kind == TokenKind::LineComment {
        NodeKind::CommentLine {
            value: token.text.strip_prefix("//").unwrap_or(&token.text).to_string(),
            leading_whitespace,
            trailing_whitespace,
        }
    } else {
        let inner = token.text.strip_prefix("/*").unwrap_or(&token.text);
        NodeKind::CommentBlock {
            value: inner.strip_suffix("*/").unwrap_or(inner).to_string(),
            leading_whitespace,
            trailing_whitespace,
        }
    }
}

/// Concatenated text of the whitespace tokens directly next to a comment.
fn adjacent_whitespace<'a>(tokens: impl Iterator<Item = &'a Token>, reversed: bool) -> String {
    let mut parts: Vec<&str> = tokens
        .take_while(|token| is_blank(token))
        .map(|token| token.text.as_str())
        .collect();

    if reversed {
        parts.reverse();
    }
    parts.concat()
}

fn run_end(tokens: &[Token], start: usize) -> usize {
    let mut end = start;
    while end < tokens.len() && is_blank(&tokens[end]) {
        end += 1;
    }
    end
}

fn is_blank(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Whitespace | TokenKind::LineTerminator)
}
