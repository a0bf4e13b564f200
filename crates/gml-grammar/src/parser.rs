//! GML parser implementation
//!
//! Strict recursive descent over the default token channel. There is no
//! internal error recovery: the first failure is returned to the caller.

use crate::directive::{parse_directive, Directive};
use crate::lexer::{Token, TokenKind};
use crate::stream::TokenStream;
use crate::tree::{Child, ParseTree, Rule};
use crate::{RecognitionError, RecognitionResult};
use tracing::debug;

pub const MISSING_CLOSING_BRACE: &str = "missing associated closing brace for this block";

/// Deepest statement and expression nesting accepted before giving up.
pub const MAX_NESTING_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

type Production = fn(&mut Parser) -> RecognitionResult<ParseTree>;

impl Parser {
    /// Drain the default channel of `stream` and prepare to parse it.
    pub fn new(stream: &mut TokenStream) -> RecognitionResult<Self> {
        let tokens = stream.default_channel()?;
        debug!("Tokenized {} default-channel tokens", tokens.len());

        Ok(Self {
            tokens,
            current: 0,
            depth: 0,
        })
    }

    pub fn parse_program(mut self) -> RecognitionResult<ParseTree> {
        let mut children = Vec::new();

        while !self.is_at_end() {
            children.push(Child::Tree(self.statement()?));
        }

        let stop = self.peek().stop;
        Ok(ParseTree::new(Rule::Program, 0, stop, children))
    }

    fn statement(&mut self) -> RecognitionResult<ParseTree> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> RecognitionResult<ParseTree> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                let mark = self.current;
                self.advance();
                Ok(self.finish(Rule::EmptyStatement, mark, Vec::new()))
            }
            TokenKind::LeftBrace => self.block(),
            TokenKind::Var | TokenKind::Static | TokenKind::GlobalVar => self.variable_declaration(true),
            TokenKind::Function if self.peek_nth(1) == TokenKind::Identifier => self.function(),
            TokenKind::If => self.if_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::While => self.keyword_expression_body(Rule::While),
            TokenKind::Repeat => self.keyword_expression_body(Rule::Repeat),
            TokenKind::With => self.keyword_expression_body(Rule::With),
            TokenKind::Do => self.do_until_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Exit => self.bare_statement(Rule::Exit),
            TokenKind::Break => self.bare_statement(Rule::Break),
            TokenKind::Continue => self.bare_statement(Rule::Continue),
            TokenKind::Throw => self.keyword_expression(Rule::Throw),
            TokenKind::Delete => self.keyword_expression(Rule::Delete),
            TokenKind::Try => self.try_statement(),
            TokenKind::Enum => self.enum_declaration(),
            TokenKind::Directive => self.directive(),
            _ => self.expression_statement(),
        }
    }

    fn block(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let open = self.expect(TokenKind::LeftBrace)?;

        let mut children = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(missing_closing_brace(&open));
            }
            children.push(Child::Tree(self.statement()?));
        }
        self.advance();

        Ok(self.finish(Rule::Block, mark, children))
    }

    fn variable_declaration(&mut self, consume_semicolon: bool) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let keyword = self.advance();
        let mut children = vec![Child::Token(keyword)];

        loop {
            let declarator = self.current;
            let id = self.identifier()?;
            let init = if self.eat_any(&[TokenKind::Assign, TokenKind::ColonAssign]).is_some() {
                Child::Tree(self.expression()?)
            } else {
                Child::Missing
            };

            children.push(Child::Tree(self.finish(
                Rule::VariableDeclarator,
                declarator,
                vec![Child::Tree(id), init],
            )));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        if consume_semicolon {
            self.eat(TokenKind::Semicolon);
        }

        Ok(self.finish(Rule::VariableDeclaration, mark, children))
    }

    /// `function [name](params) [: Parent(args)] [constructor] { ... }`, in
    /// both statement and expression position.
    fn function(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.expect(TokenKind::Function)?;

        let id = if self.check(TokenKind::Identifier) {
            Child::Tree(self.identifier()?)
        } else {
            Child::Missing
        };
        let params = self.parameters()?;

        let parent = if self.check(TokenKind::Colon) {
            let parent_mark = self.current;
            self.advance();
            let parent_id = self.identifier()?;
            let arguments = self.arguments()?;
            Child::Tree(self.finish(
                Rule::ConstructorParent,
                parent_mark,
                vec![Child::Tree(parent_id), Child::Tree(arguments)],
            ))
        } else {
            Child::Missing
        };

        let is_constructor = if parent == Child::Missing {
            self.eat(TokenKind::Constructor).is_some()
        } else {
            self.expect(TokenKind::Constructor)?;
            true
        };

        let body = self.block()?;

        if is_constructor {
            Ok(self.finish(
                Rule::ConstructorDeclaration,
                mark,
                vec![id, Child::Tree(params), parent, Child::Tree(body)],
            ))
        } else {
            Ok(self.finish(
                Rule::FunctionDeclaration,
                mark,
                vec![id, Child::Tree(params), Child::Tree(body)],
            ))
        }
    }

    fn parameters(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.expect(TokenKind::LeftParen)?;

        let mut children = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_mark = self.current;
                let id = self.identifier()?;
                let param = if self.eat(TokenKind::Assign).is_some() {
                    let default = self.expression()?;
                    self.finish(
                        Rule::DefaultParameter,
                        param_mark,
                        vec![Child::Tree(id), Child::Tree(default)],
                    )
                } else {
                    id
                };
                children.push(Child::Tree(param));

                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        Ok(self.finish(Rule::Parameters, mark, children))
    }

    fn if_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'if'

        let test = self.expression()?;
        self.eat(TokenKind::Then);
        let consequent = self.statement()?;

        let alternate = if self.eat(TokenKind::Else).is_some() {
            Child::Tree(self.statement()?)
        } else {
            Child::Missing
        };

        Ok(self.finish(
            Rule::If,
            mark,
            vec![Child::Tree(test), Child::Tree(consequent), alternate],
        ))
    }

    fn for_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'for'
        self.expect(TokenKind::LeftParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            Child::Missing
        } else if self.check_any(&[TokenKind::Var, TokenKind::Static, TokenKind::GlobalVar]) {
            Child::Tree(self.variable_declaration(false)?)
        } else {
            Child::Tree(self.expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let test = if self.check(TokenKind::Semicolon) {
            Child::Missing
        } else {
            Child::Tree(self.expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RightParen) {
            Child::Missing
        } else {
            Child::Tree(self.expression()?)
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.statement()?;

        Ok(self.finish(Rule::For, mark, vec![init, test, update, Child::Tree(body)]))
    }

    /// `while`, `repeat` and `with`: keyword, expression, body.
    fn keyword_expression_body(&mut self, rule: Rule) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance();

        let head = self.expression()?;
        let body = self.statement()?;

        Ok(self.finish(rule, mark, vec![Child::Tree(head), Child::Tree(body)]))
    }

    fn do_until_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'do'

        let body = self.statement()?;
        self.expect(TokenKind::Until)?;
        let test = self.expression()?;
        self.eat(TokenKind::Semicolon);

        Ok(self.finish(Rule::DoUntil, mark, vec![Child::Tree(body), Child::Tree(test)]))
    }

    fn switch_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'switch'

        let discriminant = self.expression()?;
        let open = self.expect(TokenKind::LeftBrace)?;

        let mut children = vec![Child::Tree(discriminant)];
        while !self.check(TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(missing_closing_brace(&open));
            }

            let case_mark = self.current;
            let test = if self.eat(TokenKind::Case).is_some() {
                Child::Tree(self.expression()?)
            } else {
                self.expect(TokenKind::Default)?;
                Child::Missing
            };
            self.expect(TokenKind::Colon)?;

            let mut case_children = vec![test];
            while !self.check_any(&[TokenKind::Case, TokenKind::Default, TokenKind::RightBrace])
                && !self.is_at_end()
            {
                case_children.push(Child::Tree(self.statement()?));
            }

            children.push(Child::Tree(self.finish(Rule::Case, case_mark, case_children)));
        }
        self.advance();

        Ok(self.finish(Rule::Switch, mark, children))
    }

    fn return_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'return'

        let argument = if self.check_any(&[
            TokenKind::Semicolon,
            TokenKind::RightBrace,
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::Eof,
        ]) {
            Child::Missing
        } else {
            Child::Tree(self.expression()?)
        };
        self.eat(TokenKind::Semicolon);

        Ok(self.finish(Rule::Return, mark, vec![argument]))
    }

    /// `exit`, `break` and `continue`.
    fn bare_statement(&mut self, rule: Rule) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance();
        self.eat(TokenKind::Semicolon);

        Ok(self.finish(rule, mark, Vec::new()))
    }

    /// `throw` and `delete`.
    fn keyword_expression(&mut self, rule: Rule) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance();

        let argument = self.expression()?;
        self.eat(TokenKind::Semicolon);

        Ok(self.finish(rule, mark, vec![Child::Tree(argument)]))
    }

    fn try_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'try'

        let block = self.block()?;

        let handler = if self.check(TokenKind::Catch) {
            let catch_mark = self.current;
            self.advance();

            let param = if self.eat(TokenKind::LeftParen).is_some() {
                let id = self.identifier()?;
                self.expect(TokenKind::RightParen)?;
                Child::Tree(id)
            } else {
                Child::Missing
            };
            let body = self.block()?;

            Child::Tree(self.finish(Rule::Catch, catch_mark, vec![param, Child::Tree(body)]))
        } else {
            Child::Missing
        };

        let finalizer = if self.check(TokenKind::Finally) {
            let finally_mark = self.current;
            self.advance();
            let body = self.block()?;
            Child::Tree(self.finish(Rule::Finally, finally_mark, vec![Child::Tree(body)]))
        } else {
            Child::Missing
        };

        Ok(self.finish(Rule::Try, mark, vec![Child::Tree(block), handler, finalizer]))
    }

    fn enum_declaration(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'enum'

        let name = self.identifier()?;
        let open = self.expect(TokenKind::LeftBrace)?;

        let mut children = vec![Child::Tree(name)];
        while !self.check(TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(missing_closing_brace(&open));
            }

            let member_mark = self.current;
            let member = self.identifier()?;
            let init = if self.eat(TokenKind::Assign).is_some() {
                Child::Tree(self.expression()?)
            } else {
                Child::Missing
            };
            children.push(Child::Tree(self.finish(
                Rule::EnumMember,
                member_mark,
                vec![Child::Tree(member), init],
            )));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.is_at_end() {
            return Err(missing_closing_brace(&open));
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(self.finish(Rule::Enum, mark, children))
    }

    fn directive(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let token = self.advance();

        let rule = match parse_directive(&token.text) {
            Some(Directive::Macro { .. }) => Rule::Macro,
            Some(Directive::Region { .. }) => Rule::Region,
            Some(Directive::EndRegion { .. }) => Rule::EndRegion,
            None => {
                return Err(RecognitionError::at_token(
                    format!("malformed directive '{}'", token.text.trim_end()),
                    &token,
                ))
            }
        };

        Ok(self.finish(rule, mark, vec![Child::Token(token)]))
    }

    fn expression_statement(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let expression = self.expression()?;
        self.eat(TokenKind::Semicolon);

        Ok(self.finish(Rule::ExpressionStatement, mark, vec![Child::Tree(expression)]))
    }

    pub fn expression(&mut self) -> RecognitionResult<ParseTree> {
        self.assignment()
    }

    fn assignment(&mut self) -> RecognitionResult<ParseTree> {
        self.nested(Self::assignment_or_ternary)
    }

    fn assignment_or_ternary(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let left = self.ternary()?;

        if self.peek_kind().is_assignment_operator() {
            let operator = self.advance();
            let right = self.assignment()?;

            return Ok(self.finish(
                Rule::Assignment,
                mark,
                vec![Child::Tree(left), Child::Token(operator), Child::Tree(right)],
            ));
        }

        Ok(left)
    }

    fn ternary(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let test = self.nullish()?;

        if self.eat(TokenKind::QuestionMark).is_some() {
            let consequent = self.assignment()?;
            self.expect(TokenKind::Colon)?;
            let alternate = self.assignment()?;

            return Ok(self.finish(
                Rule::Ternary,
                mark,
                vec![Child::Tree(test), Child::Tree(consequent), Child::Tree(alternate)],
            ));
        }

        Ok(test)
    }

    fn binary_level(&mut self, operators: &[TokenKind], next: Production) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let mut left = next(self)?;

        while self.check_any(operators) {
            let operator = self.advance();
            let right = next(self)?;

            left = self.finish(
                Rule::Binary,
                mark,
                vec![Child::Tree(left), Child::Token(operator), Child::Tree(right)],
            );
        }

        Ok(left)
    }

    fn nullish(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::Nullish], Self::logical_or)
    }

    fn logical_or(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::LogicalOr, TokenKind::Or], Self::logical_xor)
    }

    fn logical_xor(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::LogicalXor, TokenKind::Xor], Self::logical_and)
    }

    fn logical_and(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::LogicalAnd, TokenKind::And], Self::bitwise_or)
    }

    fn bitwise_or(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::BitwiseOr], Self::bitwise_xor)
    }

    fn bitwise_xor(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::BitwiseXor], Self::bitwise_and)
    }

    fn bitwise_and(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::BitwiseAnd], Self::equality)
    }

    fn equality(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::Equal, TokenKind::NotEqual], Self::relational)
    }

    fn relational(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(
            &[
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
            ],
            Self::shift,
        )
    }

    fn shift(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::LeftShift, TokenKind::RightShift], Self::additive)
    }

    fn additive(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(&[TokenKind::Plus, TokenKind::Minus], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> RecognitionResult<ParseTree> {
        self.binary_level(
            &[
                TokenKind::Multiply,
                TokenKind::Divide,
                TokenKind::Percent,
                TokenKind::Div,
                TokenKind::Mod,
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> RecognitionResult<ParseTree> {
        if self.check_any(&[
            TokenKind::LogicalNot,
            TokenKind::Not,
            TokenKind::Minus,
            TokenKind::Plus,
            TokenKind::BitwiseNot,
            TokenKind::Increment,
            TokenKind::Decrement,
        ]) {
            let mark = self.current;
            let operator = self.advance();
            let argument = self.nested(Self::unary)?;

            return Ok(self.finish(
                Rule::Unary,
                mark,
                vec![Child::Token(operator), Child::Tree(argument)],
            ));
        }

        self.postfix()
    }

    fn postfix(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let expr = self.call_member()?;

        if self.check_any(&[TokenKind::Increment, TokenKind::Decrement]) {
            let operator = self.advance();
            return Ok(self.finish(
                Rule::Postfix,
                mark,
                vec![Child::Tree(expr), Child::Token(operator)],
            ));
        }

        Ok(expr)
    }

    fn call_member(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let mut expr = self.primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LeftParen => {
                    let arguments = self.arguments()?;
                    expr = self.finish(
                        Rule::Call,
                        mark,
                        vec![Child::Tree(expr), Child::Tree(arguments)],
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let property = self.identifier()?;
                    expr = self.finish(
                        Rule::MemberDot,
                        mark,
                        vec![Child::Tree(expr), Child::Tree(property)],
                    );
                }
                kind if kind.is_accessor() => {
                    let accessor = self.advance();
                    let mut children = vec![Child::Tree(expr), Child::Token(accessor)];
                    loop {
                        children.push(Child::Tree(self.expression()?));
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect(TokenKind::RightBracket)?;
                    expr = self.finish(Rule::MemberIndex, mark, children);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// `(a, , b)`: empty slots become zero-width `MissingArgument` trees.
    fn arguments(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.expect(TokenKind::LeftParen)?;

        let mut children = Vec::new();
        if self.eat(TokenKind::RightParen).is_some() {
            return Ok(self.finish(Rule::Arguments, mark, children));
        }

        loop {
            if self.check_any(&[TokenKind::Comma, TokenKind::RightParen]) {
                let missing = self.finish(Rule::MissingArgument, self.current, Vec::new());
                children.push(Child::Tree(missing));
            } else {
                children.push(Child::Tree(self.expression()?));
            }

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;

        Ok(self.finish(Rule::Arguments, mark, children))
    }

    fn primary(&mut self) -> RecognitionResult<ParseTree> {
        match self.peek_kind() {
            TokenKind::Number
            | TokenKind::String
            | TokenKind::VerbatimString
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Undefined => self.literal(),
            TokenKind::Identifier => self.identifier(),
            TokenKind::TemplateStart => self.template_string(),
            TokenKind::LeftParen => {
                let mark = self.current;
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(self.finish(Rule::Parenthesized, mark, vec![Child::Tree(expr)]))
            }
            TokenKind::LeftBracket => self.array(),
            TokenKind::LeftBrace => self.structure(),
            TokenKind::Function => self.function(),
            TokenKind::New => self.new_expression(),
            _ => Err(self.unexpected()),
        }
    }

    fn literal(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let token = self.advance();
        Ok(self.finish(Rule::Literal, mark, vec![Child::Token(token)]))
    }

    fn identifier(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let token = self.expect(TokenKind::Identifier)?;
        Ok(self.finish(Rule::Identifier, mark, vec![Child::Token(token)]))
    }

    fn template_string(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // '$"'

        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::TemplateText => {
                    let text_mark = self.current;
                    let token = self.advance();
                    children.push(Child::Tree(self.finish(
                        Rule::TemplateText,
                        text_mark,
                        vec![Child::Token(token)],
                    )));
                }
                TokenKind::TemplateExprOpen => {
                    self.advance();
                    children.push(Child::Tree(self.expression()?));
                    self.expect(TokenKind::TemplateExprClose)?;
                }
                TokenKind::TemplateEnd => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        Ok(self.finish(Rule::TemplateString, mark, children))
    }

    fn array(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // '['

        let mut children = Vec::new();
        while !self.check(TokenKind::RightBracket) {
            children.push(Child::Tree(self.expression()?));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBracket)?;

        Ok(self.finish(Rule::Array, mark, children))
    }

    fn structure(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        let open = self.advance(); // '{'

        let mut children = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(missing_closing_brace(&open));
            }

            let property_mark = self.current;
            let key = match self.peek_kind() {
                TokenKind::Identifier => self.identifier()?,
                TokenKind::String | TokenKind::VerbatimString | TokenKind::Number => self.literal()?,
                _ => return Err(self.unexpected()),
            };
            self.expect(TokenKind::Colon)?;
            let value = self.expression()?;
            children.push(Child::Tree(self.finish(
                Rule::Property,
                property_mark,
                vec![Child::Tree(key), Child::Tree(value)],
            )));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.is_at_end() {
            return Err(missing_closing_brace(&open));
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(self.finish(Rule::Struct, mark, children))
    }

    fn new_expression(&mut self) -> RecognitionResult<ParseTree> {
        let mark = self.current;
        self.advance(); // 'new'

        let callee_mark = self.current;
        let mut callee = self.identifier()?;
        while self.eat(TokenKind::Dot).is_some() {
            let property = self.identifier()?;
            callee = self.finish(
                Rule::MemberDot,
                callee_mark,
                vec![Child::Tree(callee), Child::Tree(property)],
            );
        }

        let arguments = if self.check(TokenKind::LeftParen) {
            Child::Tree(self.arguments()?)
        } else {
            Child::Missing
        };

        Ok(self.finish(Rule::New, mark, vec![Child::Tree(callee), arguments]))
    }

    // Helper methods

    /// Close a rule that started at token index `mark`. A rule that consumed
    /// nothing is zero-width at the start of the next token.
    fn finish(&self, rule: Rule, mark: usize, children: Vec<Child>) -> ParseTree {
        let start = self.tokens[mark].start;
        let stop = if self.current > mark {
            self.tokens[self.current - 1].stop
        } else {
            start
        };
        ParseTree::new(rule, start, stop, children)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.current + n)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek_kind())
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        self.check(kind).then(|| self.advance())
    }

    fn eat_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        self.check_any(kinds).then(|| self.advance())
    }

    fn expect(&mut self, kind: TokenKind) -> RecognitionResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    /// Run a recursive production, failing once nesting passes
    /// `MAX_NESTING_DEPTH` instead of exhausting the stack.
    fn nested(&mut self, production: Production) -> RecognitionResult<ParseTree> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(RecognitionError::at_token("expression nested too deeply", self.peek()));
        }

        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self) -> RecognitionError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            RecognitionError::at_token("unexpected end of file", token)
        } else {
            RecognitionError::at_token(format!("unexpected symbol '{}'", token.text), token)
        }
    }
}

fn missing_closing_brace(open: &Token) -> RecognitionError {
    RecognitionError {
        message: MISSING_CLOSING_BRACE.to_string(),
        line: Some(open.line),
        column: Some(open.column),
        token: Some(open.clone()),
    }
}
