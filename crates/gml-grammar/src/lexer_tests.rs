use crate::{Channel, Lexer, RecognitionResult, Token, TokenKind};

fn lex(source: &str) -> RecognitionResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        if token.kind == TokenKind::Eof {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source)
        .unwrap()
        .into_iter()
        .filter(|token| token.channel == Channel::Default)
        .map(|token| token.kind)
        .collect()
}

#[test]
fn keywords_and_word_operators() {
    assert_eq!(
        kinds("if a and not b then exit"),
        vec![
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::And,
            TokenKind::Not,
            TokenKind::Identifier,
            TokenKind::Then,
            TokenKind::Exit,
        ]
    );
}

#[test]
fn accessors() {
    assert_eq!(
        kinds("a[| 0] m[? k] g[# 1, 2] r[@ 3] s[$ \"x\"]"),
        vec![
            TokenKind::Identifier,
            TokenKind::ListAccessor,
            TokenKind::Number,
            TokenKind::RightBracket,
            TokenKind::Identifier,
            TokenKind::MapAccessor,
            TokenKind::Identifier,
            TokenKind::RightBracket,
            TokenKind::Identifier,
            TokenKind::GridAccessor,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RightBracket,
            TokenKind::Identifier,
            TokenKind::ArrayAccessor,
            TokenKind::Number,
            TokenKind::RightBracket,
            TokenKind::Identifier,
            TokenKind::StructAccessor,
            TokenKind::String,
            TokenKind::RightBracket,
        ]
    );
}

#[test]
fn numbers() {
    assert_eq!(
        kinds("0x1F 0b101 1_000 .5 3.25 $FF #A0B0C0"),
        vec![TokenKind::Number; 7]
    );
}

#[test]
fn hidden_channel_tokens() {
    let tokens = lex("a // note\r\n/* block */ b").unwrap();
    let hidden: Vec<_> = tokens
        .iter()
        .filter(|token| token.channel == Channel::Hidden)
        .map(|token| (token.kind, token.text.as_str()))
        .collect();

    assert_eq!(
        hidden,
        vec![
            (TokenKind::Whitespace, " "),
            (TokenKind::LineComment, "// note"),
            (TokenKind::LineTerminator, "\r\n"),
            (TokenKind::BlockComment, "/* block */"),
            (TokenKind::Whitespace, " "),
        ]
    );
}

#[test]
fn positions_count_characters() {
    let tokens = lex("é = 1;\n  b").unwrap();
    let b = tokens.last().unwrap();

    assert_eq!(b.text, "b");
    assert_eq!(b.line, 2);
    assert_eq!(b.column, 2);
    assert_eq!(b.start, "é = 1;\n  ".len());
    assert_eq!(tokens[2].column, 2);
}

#[test]
fn lower_case_escapes_are_accepted() {
    assert_eq!(kinds(r#""a\nb\t\x41\u0041""#), vec![TokenKind::String]);
    assert_eq!(kinds(r#""quote \" and \\""#), vec![TokenKind::String]);
}

#[test]
fn upper_case_escape_is_rejected() {
    let error = lex(r#"x = "a\Nb";"#).unwrap_err();

    assert_eq!(error.message, "invalid escape sequence '\\N'");
    assert_eq!(error.line, Some(1));
    assert_eq!(error.column, Some(6));
}

#[test]
fn verbatim_strings_ignore_escapes() {
    assert_eq!(kinds(r#"@"C:\Path\N""#), vec![TokenKind::VerbatimString]);
}

#[test]
fn template_string_parts() {
    assert_eq!(
        kinds(r#"$"hp: {hp + 1} of {max}""#),
        vec![
            TokenKind::TemplateStart,
            TokenKind::TemplateText,
            TokenKind::TemplateExprOpen,
            TokenKind::Identifier,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::TemplateExprClose,
            TokenKind::TemplateText,
            TokenKind::TemplateExprOpen,
            TokenKind::Identifier,
            TokenKind::TemplateExprClose,
            TokenKind::TemplateEnd,
        ]
    );
}

#[test]
fn directives_span_their_line() {
    let tokens = lex("#macro WIDTH 640 \\\n  * 2\nx").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Directive);
    assert_eq!(tokens[0].text, "#macro WIDTH 640 \\\n  * 2");
    assert_eq!(tokens.last().unwrap().line, 3);
}

#[test]
fn unterminated_inputs() {
    assert_eq!(lex("\"abc").unwrap_err().message, "unterminated string literal");
    assert_eq!(lex("/* open").unwrap_err().message, "unterminated block comment");
}

#[test]
fn seek_recomputes_position() {
    let mut lexer = Lexer::new("a\nbc d");
    lexer.seek(5);
    let token = lexer.next_token().unwrap();

    assert_eq!(token.text, "d");
    assert_eq!((token.line, token.column), (2, 3));
}
