//! Resettable token stream over a [`Lexer`]

use crate::lexer::{Channel, Lexer, Token, TokenKind};
use crate::RecognitionResult;

/// Pull-based token source. Tokens are lexed lazily; after `Eof` every call
/// to [`TokenStream::next_token`] yields `Eof` again until the stream is reset.
pub struct TokenStream {
    lexer: Lexer,
}

impl TokenStream {
    pub fn new(text: &str) -> Self {
        Self {
            lexer: Lexer::new(text),
        }
    }

    pub fn text(&self) -> &str {
        self.lexer.source()
    }

    /// Rewind to the first character of the input.
    pub fn reset(&mut self) {
        self.lexer.seek(0);
    }

    /// Position the underlying character stream at a byte offset.
    pub fn seek(&mut self, offset: usize) {
        self.lexer.seek(offset);
    }

    pub fn next_token(&mut self) -> RecognitionResult<Token> {
        self.lexer.next_token()
    }

    /// Drain the default channel from the current position, `Eof` included.
    pub fn default_channel(&mut self) -> RecognitionResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;

            if token.channel == Channel::Default {
                tokens.push(token);
            }
            if done {
                return Ok(tokens);
            }
        }
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("offset", &self.lexer.offset())
            .finish()
    }
}
