//! Lint and format tool boundary
//!
//! Consumers hand over a file and a context carrying language options, and
//! always receive an ESTree-shaped tree.

use crate::ast::VisitorKeys;
use crate::error::{Error, Result, SyntaxError};
use crate::line_index::LineIndex;
use crate::options::{check_field, known_entries, AstFormat, ParserOptions, RecoveryMode};
use crate::paths::normalize_file_path;
use crate::session::{Ast, ParseSession, ParserServices};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageOptions {
    pub recovery: RecoveryMode,
    pub get_locations: bool,
    pub simplify_locations: bool,
    pub get_comments: bool,
}

impl Default for LanguageOptions {
    fn default() -> Self {
        Self {
            recovery: RecoveryMode::None,
            get_locations: true,
            simplify_locations: false,
            get_comments: true,
        }
    }
}

impl LanguageOptions {
    pub const KEYS: [&'static str; 4] = ["recovery", "getLocations", "simplifyLocations", "getComments"];

    fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            get_comments: self.get_comments,
            get_locations: self.get_locations,
            simplify_locations: self.simplify_locations,
            ast_format: AstFormat::Estree,
            as_json: false,
            recovery: self.recovery,
        }
    }
}

/// Reject anything but an object, and known keys of the wrong type.
pub fn validate_language_options(options: &Value) -> Result<()> {
    let entries = language_entries(options)?;
    for (key, value) in known_entries(entries, &LanguageOptions::KEYS) {
        check_field::<LanguageOptions>(key, value)?;
    }
    Ok(())
}

pub fn normalize_language_options(options: &Value) -> Result<LanguageOptions> {
    validate_language_options(options)?;

    let entries = language_entries(options)?;
    let known: Map<String, Value> = known_entries(entries, &LanguageOptions::KEYS)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    serde_json::from_value(Value::Object(known)).map_err(|err| Error::InvalidOption {
        name: "languageOptions".to_string(),
        reason: err.to_string(),
    })
}

fn language_entries(options: &Value) -> Result<&Map<String, Value>> {
    options.as_object().ok_or_else(|| Error::InvalidOption {
        name: "languageOptions".to_string(),
        reason: "expected an object".to_string(),
    })
}

/// A file as seen by a lint tool.
#[derive(Debug, Clone, Copy)]
pub struct LintFile<'a> {
    pub path: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub language_options: LanguageOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Success {
        ast: Value,
        parser_services: ParserServices,
        visitor_keys: VisitorKeys,
    },
    Failure {
        errors: Vec<SyntaxError>,
    },
}

impl ParseOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }
}

impl Serialize for ParseOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParseOutcome::Success {
                ast,
                parser_services,
                visitor_keys,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("ok", &true)?;
                map.serialize_entry("ast", ast)?;
                map.serialize_entry("parserServices", parser_services)?;
                map.serialize_entry("visitorKeys", visitor_keys)?;
                map.end()
            }
            ParseOutcome::Failure { errors } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("errors", errors)?;
                map.end()
            }
        }
    }
}

/// Syntax errors become a failed outcome; contract errors are returned as
/// `Err`.
pub fn parse(file: &LintFile<'_>, context: &ParseContext) -> Result<ParseOutcome> {
    let options = context.language_options.parser_options();
    let file_path = normalize_file_path(file.path);

    match ParseSession::new(file.text, &options)
        .with_file_path(&file_path)
        .run()
    {
        Ok(output) => match output.ast {
            Ast::Estree(ast) => Ok(ParseOutcome::Success {
                ast,
                parser_services: output.services,
                visitor_keys: output.visitor_keys,
            }),
            _ => Err(Error::Contract("expected an ESTree-shaped tree".to_string())),
        },
        Err(Error::Syntax(error)) => Ok(ParseOutcome::Failure { errors: vec![error] }),
        Err(other) => Err(other),
    }
}

/// Everything a lint tool needs about one parsed file.
#[derive(Debug, Clone)]
pub struct SourceCode {
    pub text: String,
    pub line_starts: Vec<usize>,
    pub ast: Value,
    pub parser_services: ParserServices,
    pub visitor_keys: VisitorKeys,
}

impl SourceCode {
    pub fn lines(&self) -> Vec<&str> {
        self.line_starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = self.line_starts.get(i + 1).copied().unwrap_or(self.text.len());
                self.text[start..end].trim_end_matches(['\n', '\r'])
            })
            .collect()
    }
}

pub fn create_source_code(file: &LintFile<'_>, outcome: ParseOutcome) -> Result<SourceCode> {
    match outcome {
        ParseOutcome::Success {
            ast,
            parser_services,
            visitor_keys,
        } => Ok(SourceCode {
            text: file.text.to_string(),
            line_starts: LineIndex::new(file.text).line_starts().to_vec(),
            ast,
            parser_services,
            visitor_keys,
        }),
        ParseOutcome::Failure { .. } => Err(Error::Contract(
            "cannot create source code from a failed parse".to_string(),
        )),
    }
}
