//! GML parsing and recovery pipeline
//!
//! Turns GameMaker Language source into a location-annotated AST. Inputs
//! with a missing argument separator or unclosed braces can be parsed
//! through a single retry on a patched copy of the source; every location
//! in the result refers to the original text either way.

pub mod ast;
pub mod builder;
pub mod error;
pub mod estree;
pub mod hidden;
pub mod language;
pub mod line_index;
pub mod locations;
pub mod options;
pub mod paths;
pub mod preprocess;
pub mod recovery;
pub mod remap;
pub mod scan;
pub mod session;

#[cfg(test)]
mod estree_tests;
#[cfg(test)]
mod options_tests;
#[cfg(test)]
mod preprocess_tests;
#[cfg(test)]
mod recovery_tests;
#[cfg(test)]
mod scan_tests;

pub use ast::{visitor_keys, Node, NodeKind, Position, Program, VisitorKeys};
pub use error::{Error, Result, SyntaxError};
pub use options::{AstFormat, LocationMode, ParserOptions, RecoveryMode};
pub use recovery::{map_recovered_index_to_original, RecoveryInsertion};
pub use session::{Ast, ParseOutput, ParseSession, ParseStats, ParserServices, RecoveryPath};

/// Parse `text` with `options`.
pub fn parse(text: &str, options: &ParserOptions) -> Result<ParseOutput> {
    ParseSession::new(text, options).run()
}

/// Parse `text` with the defaults merged with a JSON options object.
pub fn parse_with_overrides(text: &str, overrides: &serde_json::Value) -> Result<ParseOutput> {
    let options = ParserOptions::from_value(overrides)?;
    ParseSession::new(text, &options).run()
}
