//! GML lexer for tokenizing source code

use crate::{RecognitionError, RecognitionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Identifier,
    Number,
    String,
    VerbatimString,
    TemplateStart,
    TemplateText,
    TemplateExprOpen,
    TemplateExprClose,
    TemplateEnd,
    Directive,

    // Keywords
    Var, GlobalVar, Static, Function, Constructor, If, Then, Else, For, While,
    Do, Until, Repeat, With, Switch, Case, Default, Break, Continue, Exit,
    Return, Throw, Try, Catch, Finally, Enum, New, Delete, True, False,
    Undefined, And, Or, Xor, Not, Div, Mod,

    // Operators
    Plus, Minus, Multiply, Divide, Percent,
    Assign, ColonAssign, PlusAssign, MinusAssign, MultiplyAssign, DivideAssign, PercentAssign,
    BitwiseAndAssign, BitwiseOrAssign, BitwiseXorAssign, LeftShiftAssign, RightShiftAssign,
    NullishAssign,
    Equal, NotEqual, Less, Greater, LessEqual, GreaterEqual,
    LogicalAnd, LogicalOr, LogicalXor, LogicalNot, Nullish,
    BitwiseAnd, BitwiseOr, BitwiseXor, BitwiseNot,
    LeftShift, RightShift,
    Increment, Decrement,

    // Punctuation
    LeftParen, RightParen,
    LeftBrace, RightBrace,
    LeftBracket, RightBracket,
    ListAccessor, MapAccessor, GridAccessor, ArrayAccessor, StructAccessor,
    Semicolon, Comma, Dot, QuestionMark, Colon,

    // Hidden channel
    LineComment,
    BlockComment,
    Whitespace,
    LineTerminator,

    Eof,
}

impl TokenKind {
    pub fn channel(self) -> Channel {
        match self {
            TokenKind::LineComment
            | TokenKind::BlockComment
            | TokenKind::Whitespace
            | TokenKind::LineTerminator => Channel::Hidden,
            _ => Channel::Default,
        }
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::ColonAssign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::MultiplyAssign
                | TokenKind::DivideAssign
                | TokenKind::PercentAssign
                | TokenKind::BitwiseAndAssign
                | TokenKind::BitwiseOrAssign
                | TokenKind::BitwiseXorAssign
                | TokenKind::LeftShiftAssign
                | TokenKind::RightShiftAssign
                | TokenKind::NullishAssign
        )
    }

    pub fn is_accessor(self) -> bool {
        matches!(
            self,
            TokenKind::LeftBracket
                | TokenKind::ListAccessor
                | TokenKind::MapAccessor
                | TokenKind::GridAccessor
                | TokenKind::ArrayAccessor
                | TokenKind::StructAccessor
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Default,
    Hidden,
}

/// A lexed token. `start`/`stop` are byte offsets (`stop` exclusive),
/// `line` is 1-based and `column` is a 0-based character count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub stop: usize,
    pub line: usize,
    pub column: usize,
    pub channel: Channel,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Template,
    TemplateExpr { depth: usize },
}

pub struct Lexer {
    source: String,
    chars: Vec<(usize, char)>,
    position: usize,
    line: usize,
    column: usize,
    modes: Vec<Mode>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            source: input.to_string(),
            chars: input.char_indices().collect(),
            position: 0,
            line: 1,
            column: 0,
            modes: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte offset of the next character to be read.
    pub fn offset(&self) -> usize {
        self.byte_at(self.position)
    }

    /// Move the cursor to `offset` (clamped to the input). Line and column
    /// are recomputed from the start; template nesting is discarded, so
    /// seeking is only meaningful to token boundaries outside template strings.
    pub fn seek(&mut self, offset: usize) {
        self.position = 0;
        self.line = 1;
        self.column = 0;
        self.modes.clear();

        while !self.is_at_end() && self.offset() < offset {
            self.advance();
        }
    }

    pub fn next_token(&mut self) -> RecognitionResult<Token> {
        if let Some(Mode::Template) = self.modes.last() {
            return self.template_part();
        }

        let start = self.position;
        let line = self.line;
        let column = self.column;

        if self.is_at_end() {
            return Ok(self.make_token(TokenKind::Eof, start, line, column));
        }

        let ch = self.advance();

        let kind = match ch {
            '\n' => TokenKind::LineTerminator,
            '\r' => {
                if self.peek() == '\n' {
                    self.advance();
                }
                TokenKind::LineTerminator
            }
            _ if is_whitespace(ch) => {
                self.skip_whitespace();
                TokenKind::Whitespace
            }
            '/' => match self.peek() {
                '/' => {
                    self.skip_line_comment();
                    TokenKind::LineComment
                }
                '*' => {
                    self.skip_block_comment(line, column)?;
                    TokenKind::BlockComment
                }
                '=' => {
                    self.advance();
                    TokenKind::DivideAssign
                }
                _ => TokenKind::Divide,
            },
            '+' => self.pick(&[('+', TokenKind::Increment), ('=', TokenKind::PlusAssign)], TokenKind::Plus),
            '-' => self.pick(&[('-', TokenKind::Decrement), ('=', TokenKind::MinusAssign)], TokenKind::Minus),
            '*' => self.pick(&[('=', TokenKind::MultiplyAssign)], TokenKind::Multiply),
            '%' => self.pick(&[('=', TokenKind::PercentAssign)], TokenKind::Percent),
            '=' => self.pick(&[('=', TokenKind::Equal)], TokenKind::Assign),
            '!' => self.pick(&[('=', TokenKind::NotEqual)], TokenKind::LogicalNot),
            '~' => TokenKind::BitwiseNot,
            '<' => match self.peek() {
                '<' => {
                    self.advance();
                    self.pick(&[('=', TokenKind::LeftShiftAssign)], TokenKind::LeftShift)
                }
                '=' => {
                    self.advance();
                    TokenKind::LessEqual
                }
                '>' => {
                    self.advance();
                    TokenKind::NotEqual
                }
                _ => TokenKind::Less,
            },
            '>' => match self.peek() {
                '>' => {
                    self.advance();
                    self.pick(&[('=', TokenKind::RightShiftAssign)], TokenKind::RightShift)
                }
                '=' => {
                    self.advance();
                    TokenKind::GreaterEqual
                }
                _ => TokenKind::Greater,
            },
            '&' => self.pick(&[('&', TokenKind::LogicalAnd), ('=', TokenKind::BitwiseAndAssign)], TokenKind::BitwiseAnd),
            '|' => self.pick(&[('|', TokenKind::LogicalOr), ('=', TokenKind::BitwiseOrAssign)], TokenKind::BitwiseOr),
            '^' => self.pick(&[('^', TokenKind::LogicalXor), ('=', TokenKind::BitwiseXorAssign)], TokenKind::BitwiseXor),
            '?' => {
                if self.peek() == '?' {
                    self.advance();
                    self.pick(&[('=', TokenKind::NullishAssign)], TokenKind::Nullish)
                } else {
                    TokenKind::QuestionMark
                }
            }
            ':' => self.pick(&[('=', TokenKind::ColonAssign)], TokenKind::Colon),
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => {
                if let Some(Mode::TemplateExpr { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                TokenKind::LeftBrace
            }
            '}' => match self.modes.last_mut() {
                Some(Mode::TemplateExpr { depth: 0 }) => {
                    self.modes.pop();
                    TokenKind::TemplateExprClose
                }
                Some(Mode::TemplateExpr { depth }) => {
                    *depth -= 1;
                    TokenKind::RightBrace
                }
                _ => TokenKind::RightBrace,
            },
            '[' => self.pick(
                &[
                    ('|', TokenKind::ListAccessor),
                    ('?', TokenKind::MapAccessor),
                    ('#', TokenKind::GridAccessor),
                    ('@', TokenKind::ArrayAccessor),
                    ('$', TokenKind::StructAccessor),
                ],
                TokenKind::LeftBracket,
            ),
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' if self.peek().is_ascii_digit() => self.decimal_number('.'),
            '.' => TokenKind::Dot,
            '"' | '\'' => self.string_literal(ch, line, column)?,
            '@' if matches!(self.peek(), '"' | '\'') => {
                let quote = self.advance();
                self.verbatim_string(quote, line, column)?
            }
            '$' if self.peek() == '"' => {
                self.advance();
                self.modes.push(Mode::Template);
                TokenKind::TemplateStart
            }
            '$' if self.peek().is_ascii_hexdigit() => {
                self.skip_while(|c| c.is_ascii_hexdigit() || c == '_');
                TokenKind::Number
            }
            '#' => self.hash(ch, line, column)?,
            _ if ch.is_ascii_digit() => self.number(ch),
            _ if ch.is_alphabetic() || ch == '_' => self.identifier_or_keyword(start),
            _ => {
                return Err(RecognitionError::at(
                    format!("unexpected character '{}'", ch),
                    line,
                    column,
                ))
            }
        };

        Ok(self.make_token(kind, start, line, column))
    }

    fn template_part(&mut self) -> RecognitionResult<Token> {
        let start = self.position;
        let line = self.line;
        let column = self.column;

        let kind = match self.peek() {
            _ if self.is_at_end() => {
                return Err(RecognitionError::at("unterminated template string", line, column));
            }
            '"' => {
                self.advance();
                self.modes.pop();
                TokenKind::TemplateEnd
            }
            '{' => {
                self.advance();
                self.modes.push(Mode::TemplateExpr { depth: 0 });
                TokenKind::TemplateExprOpen
            }
            _ => {
                while !self.is_at_end() && !matches!(self.peek(), '"' | '{') {
                    if matches!(self.peek(), '\n' | '\r') {
                        return Err(RecognitionError::at("unterminated template string", line, column));
                    }
                    if self.advance() == '\\' {
                        self.escape_sequence()?;
                    }
                }
                TokenKind::TemplateText
            }
        };

        Ok(self.make_token(kind, start, line, column))
    }

    fn advance(&mut self) -> char {
        let Some(&(_, ch)) = self.chars.get(self.position) else {
            return '\0';
        };

        self.position += 1;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 0;
            }
            '\r' if self.peek() != '\n' => {
                self.line += 1;
                self.column = 0;
            }
            _ => self.column += 1,
        }
        ch
    }

    fn peek(&self) -> char {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, offset: usize) -> char {
        self.chars
            .get(self.position + offset)
            .map(|&(_, ch)| ch)
            .unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn byte_at(&self, position: usize) -> usize {
        self.chars
            .get(position)
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len())
    }

    fn make_token(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        let start = self.byte_at(start);
        let stop = self.offset();
        Token {
            kind,
            text: self.source[start..stop].to_string(),
            start,
            stop,
            line,
            column,
            channel: kind.channel(),
        }
    }

    /// Consume one of the `(next char, kind)` continuations, or fall back.
    fn pick(&mut self, options: &[(char, TokenKind)], fallback: TokenKind) -> TokenKind {
        let next = self.peek();
        for &(ch, kind) in options {
            if next == ch {
                self.advance();
                return kind;
            }
        }
        fallback
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while !self.is_at_end() && predicate(self.peek()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(is_whitespace);
    }

    fn skip_line_comment(&mut self) {
        self.skip_while(|c| c != '\n' && c != '\r');
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) -> RecognitionResult<()> {
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_ahead(1) == '/' {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(RecognitionError::at("unterminated block comment", line, column))
    }

    fn string_literal(&mut self, quote: char, line: usize, column: usize) -> RecognitionResult<TokenKind> {
        loop {
            if self.is_at_end() || matches!(self.peek(), '\n' | '\r') {
                return Err(RecognitionError::at("unterminated string literal", line, column));
            }

            let ch = self.advance();
            if ch == quote {
                return Ok(TokenKind::String);
            }
            if ch == '\\' {
                self.escape_sequence()?;
            }
        }
    }

    /// Validates the character following a backslash. Only lower-case escape
    /// letters are recognised; anything else alphabetic is rejected.
    fn escape_sequence(&mut self) -> RecognitionResult<()> {
        let line = self.line;
        let column = self.column.saturating_sub(1);

        if self.is_at_end() {
            return Ok(());
        }

        let ch = self.peek();
        if ch.is_ascii_alphabetic() && !is_escape_letter(ch) {
            return Err(RecognitionError::at(
                format!("invalid escape sequence '\\{}'", ch),
                line,
                column,
            ));
        }
        self.advance();
        Ok(())
    }

    fn verbatim_string(&mut self, quote: char, line: usize, column: usize) -> RecognitionResult<TokenKind> {
        while !self.is_at_end() {
            if self.advance() == quote {
                return Ok(TokenKind::VerbatimString);
            }
        }

        Err(RecognitionError::at("unterminated string literal", line, column))
    }

    fn hash(&mut self, ch: char, line: usize, column: usize) -> RecognitionResult<TokenKind> {
        let word: String = self.chars[self.position..]
            .iter()
            .map(|&(_, c)| c)
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        match word.as_str() {
            "macro" | "region" | "endregion" => {
                self.directive(word == "macro");
                Ok(TokenKind::Directive)
            }
            _ if word.len() == 6 && word.chars().all(|c| c.is_ascii_hexdigit()) => {
                for _ in 0..6 {
                    self.advance();
                }
                Ok(TokenKind::Number)
            }
            _ => Err(RecognitionError::at(
                format!("unexpected character '{}'", ch),
                line,
                column,
            )),
        }
    }

    /// Directives run to the end of the line; macro bodies continue onto the
    /// next line when it ends in a backslash.
    fn directive(&mut self, continues: bool) {
        while !self.is_at_end() {
            match self.peek() {
                '\\' if continues && matches!(self.peek_ahead(1), '\n' | '\r') => {
                    self.advance();
                    if self.advance() == '\r' && self.peek() == '\n' {
                        self.advance();
                    }
                }
                '\n' | '\r' => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn number(&mut self, first: char) -> TokenKind {
        if first == '0' && matches!(self.peek(), 'x' | 'X') && self.peek_ahead(1).is_ascii_hexdigit() {
            self.advance();
            self.skip_while(|c| c.is_ascii_hexdigit() || c == '_');
            return TokenKind::Number;
        }

        if first == '0' && matches!(self.peek(), 'b' | 'B') && matches!(self.peek_ahead(1), '0' | '1') {
            self.advance();
            self.skip_while(|c| c == '0' || c == '1' || c == '_');
            return TokenKind::Number;
        }

        self.decimal_number(first)
    }

    fn decimal_number(&mut self, first: char) -> TokenKind {
        self.skip_while(|c| c.is_ascii_digit() || c == '_');

        if first != '.' && self.peek() == '.' && self.peek_ahead(1).is_ascii_digit() {
            self.advance();
            self.skip_while(|c| c.is_ascii_digit() || c == '_');
        }

        TokenKind::Number
    }

    fn identifier_or_keyword(&mut self, start: usize) -> TokenKind {
        self.skip_while(|c| c.is_alphanumeric() || c == '_');

        let text = &self.source[self.byte_at(start)..self.offset()];
        keyword(text).unwrap_or(TokenKind::Identifier)
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}')
}

fn is_escape_letter(ch: char) -> bool {
    matches!(ch, 'n' | 'r' | 't' | 'b' | 'f' | 'v' | 'a' | 'u' | 'x')
}

pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "var" => TokenKind::Var,
        "globalvar" => TokenKind::GlobalVar,
        "static" => TokenKind::Static,
        "function" => TokenKind::Function,
        "constructor" => TokenKind::Constructor,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "until" => TokenKind::Until,
        "repeat" => TokenKind::Repeat,
        "with" => TokenKind::With,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "exit" => TokenKind::Exit,
        "return" => TokenKind::Return,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "enum" => TokenKind::Enum,
        "new" => TokenKind::New,
        "delete" => TokenKind::Delete,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "undefined" => TokenKind::Undefined,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "xor" => TokenKind::Xor,
        "not" => TokenKind::Not,
        "div" => TokenKind::Div,
        "mod" => TokenKind::Mod,
        _ => return None,
    };
    Some(kind)
}
