//! GML grammar engine
//!
//! Tokenizes and parses GameMaker Language source into a generic parse tree.
//! The lexer splits its output over two channels: the parser only ever sees
//! the default channel, while comments and whitespace stay available on the
//! hidden channel for a second pass over the same [`TokenStream`].

pub mod directive;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod tree;

#[cfg(test)]
mod lexer_tests;

pub use lexer::{Channel, Lexer, Token, TokenKind};
pub use parser::Parser;
pub use stream::TokenStream;
pub use tree::{Child, ParseTree, Rule};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error raised when the engine rejects its input.
///
/// Position data is best-effort: lexical errors carry `line`/`column`
/// directly, parser errors usually only carry the offending token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct RecognitionError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub token: Option<Token>,
}

impl RecognitionError {
    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            column: Some(column),
            token: None,
        }
    }

    pub fn at_token(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            token: Some(token.clone()),
        }
    }
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;

/// Output of a successful parse: the tree plus the stream it was read from,
/// so callers can rewind it for the hidden-channel pass.
#[derive(Debug)]
pub struct Parsed {
    pub tree: ParseTree,
    pub stream: TokenStream,
}

/// Lex and parse `text` in one go.
pub fn tokenize_and_parse(text: &str) -> RecognitionResult<Parsed> {
    debug!("Parsing source: {} bytes", text.len());

    let mut stream = TokenStream::new(text);
    let tree = Parser::new(&mut stream)?.parse_program()?;

    Ok(Parsed { tree, stream })
}
