//! Parse orchestration
//!
//! A session is an immutable bundle of one call's inputs. [`ParseSession::run`]
//! drives the pipeline:
//!
//! ```text
//! strict attempt ── ok ──────────────────────────────────────┐
//!      │ fails, recovery = none ──> error                    │
//!      │ fails, recovery = limited                           │
//!      ├── missing closing brace ──> append braces ──┐       │
//!      └── anything else ──────────> insert commas ──┤       │
//!                  nothing to patch ──> strict error │       │
//!                                      recovered attempt ─ ok┤
//!                                        fails ──> strict error
//!                                                            v
//!                    build → hidden nodes → remap → literals → locations → format
//! ```

use crate::ast::{visitor_keys, Program, VisitorKeys};
use crate::builder::{self, restore_original_literal_text};
use crate::error::{Error, Result, SyntaxError};
use crate::estree::{self, EstreeOptions};
use crate::hidden;
use crate::locations;
use crate::options::{AstFormat, ParserOptions, RecoveryMode};
use crate::preprocess::{
    fix_malformed_comments, is_missing_brace_error, normalize_escape_case,
    recover_source_from_missing_brace, CommentFix,
};
use crate::recovery::{self, RecoveryInsertion};
use crate::remap::Remapper;
use gml_grammar::{tokenize_and_parse, Parsed, RecognitionError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: u32 = 1;

/// Opaque metadata handed to consumers alongside the AST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserServices {
    pub schema_version: u32,
    pub file_path: Option<String>,
    pub recovery: Vec<RecoveryInsertion>,
    pub directives: Vec<String>,
    pub enums: Vec<String>,
}

/// The finished tree in the requested format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ast {
    Gml(Program),
    Estree(Value),
    /// Either format, already serialized (`asJSON`).
    Json(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryPath {
    None,
    ClosingBraces,
    ArgumentSeparators,
}

/// Internal counters, for tests and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub attempts: usize,
    pub recovery: RecoveryPath,
    /// `None` when the hidden-node pass did not run.
    pub hidden_tokens: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    pub services: ParserServices,
    pub visitor_keys: VisitorKeys,
    pub stats: ParseStats,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseSession<'a> {
    text: &'a str,
    options: &'a ParserOptions,
    file_path: Option<&'a str>,
}

/// A successful grammar run and the text it ran against.
struct Attempt {
    parsed: Parsed,
    source: String,
    insertions: Vec<RecoveryInsertion>,
    path: RecoveryPath,
    attempts: usize,
}

impl<'a> ParseSession<'a> {
    pub fn new(text: &'a str, options: &'a ParserOptions) -> Self {
        Self {
            text,
            options,
            file_path: None,
        }
    }

    pub fn with_file_path(self, file_path: &'a str) -> Self {
        Self {
            file_path: Some(file_path),
            ..self
        }
    }

    pub fn run(&self) -> Result<ParseOutput> {
        debug!("Parsing {} bytes with {:?}", self.text.len(), self.options);

        let fix = fix_malformed_comments(self.text);
        let preprocessed = normalize_escape_case(&fix.text);

        let attempt = self.attempt(preprocessed)?;
        self.finish(attempt, &fix)
    }

    fn attempt(&self, preprocessed: String) -> Result<Attempt> {
        let strict_error = match tokenize_and_parse(&preprocessed) {
            Ok(parsed) => {
                return Ok(Attempt {
                    parsed,
                    source: preprocessed,
                    insertions: Vec::new(),
                    path: RecoveryPath::None,
                    attempts: 1,
                })
            }
            Err(err) => err,
        };
        debug!("Strict parse failed: {}", strict_error);

        if self.options.recovery == RecoveryMode::None {
            return Err(syntax_error(&strict_error));
        }

        let (patched, insertions, path) = if is_missing_brace_error(&strict_error) {
            match recover_source_from_missing_brace(&preprocessed, &strict_error) {
                Some(patched) => (patched, Vec::new(), RecoveryPath::ClosingBraces),
                None => return Err(syntax_error(&strict_error)),
            }
        } else {
            let projection = recovery::project(&preprocessed);
            if projection.is_empty() {
                debug!("No argument separators to insert");
                return Err(syntax_error(&strict_error));
            }
            (
                projection.patched_text,
                projection.insertions,
                RecoveryPath::ArgumentSeparators,
            )
        };

        match tokenize_and_parse(&patched) {
            Ok(parsed) => {
                info!("Recovered from syntax error via {:?}", path);
                Ok(Attempt {
                    parsed,
                    source: patched,
                    insertions,
                    path,
                    attempts: 2,
                })
            }
            Err(recovered_error) => {
                warn!(
                    "Recovery via {:?} failed ({}); reporting the original error",
                    path, recovered_error
                );
                Err(syntax_error(&strict_error))
            }
        }
    }

    fn finish(&self, mut attempt: Attempt, fix: &CommentFix) -> Result<ParseOutput> {
        let built = builder::build(&attempt.parsed.tree, &attempt.source)?;
        let mut program = built.program;

        let hidden_tokens = if self.options.get_comments {
            let hidden = hidden::collect(&mut attempt.parsed.stream).map_err(|err| syntax_error(&err))?;
            let scanned = hidden.scanned;
            hidden::attach(&mut program, hidden);
            Some(scanned)
        } else {
            None
        };

        if attempt.path != RecoveryPath::None || !fix.index_mapper.is_identity() {
            Remapper::new(self.text, &attempt.insertions, &fix.index_mapper).remap_program(&mut program);
        }

        restore_original_literal_text(&mut program, self.text);
        locations::normalize(&mut program, self.options.location_mode());

        let ast = self.format(program)?;

        Ok(ParseOutput {
            ast,
            services: ParserServices {
                schema_version: SCHEMA_VERSION,
                file_path: self.file_path.map(str::to_string),
                recovery: attempt.insertions,
                directives: built.directives,
                enums: built.enums,
            },
            visitor_keys: visitor_keys(),
            stats: ParseStats {
                attempts: attempt.attempts,
                recovery: attempt.path,
                hidden_tokens,
            },
        })
    }

    fn format(&self, program: Program) -> Result<Ast> {
        let ast = match self.options.ast_format {
            AstFormat::Gml => {
                if self.options.as_json {
                    return Ok(Ast::Json(serde_json::to_string(&program)?));
                }
                Ast::Gml(program)
            }
            AstFormat::Estree => {
                let converted = estree::convert(
                    &serde_json::to_value(&program)?,
                    &EstreeOptions {
                        include_locations: self.options.get_locations,
                        include_range: self.options.get_locations,
                        include_comments: self.options.get_comments,
                    },
                );
                if self.options.as_json {
                    return Ok(Ast::Json(serde_json::to_string(&converted)?));
                }
                Ast::Estree(converted)
            }
        };

        Ok(ast)
    }
}

fn syntax_error(error: &RecognitionError) -> Error {
    Error::Syntax(SyntaxError::classify(error))
}
