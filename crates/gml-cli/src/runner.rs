//! File parsing and checking

use colored::*;
use gml_core::language::{self, LanguageOptions, LintFile, ParseContext, ParseOutcome};
use gml_core::paths::normalize_file_path;
use gml_core::{Ast, Error, ParseOutput, ParseSession, ParserOptions, RecoveryMode, SyntaxError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info};

type Failure = Box<dyn std::error::Error + Send + Sync>;

/// Parse every file on the blocking pool and print one JSON document per
/// file, in argument order.
pub async fn parse_files(
    files: &[PathBuf],
    options: ParserOptions,
    pretty: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut tasks = JoinSet::new();
    for (order, path) in files.iter().enumerate() {
        let path = path.clone();
        let options = options.clone();
        tasks.spawn_blocking(move || (order, parse_file(&path, &options)));
    }

    let mut results = Vec::with_capacity(files.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(order, _)| *order);

    let mut all_ok = true;
    for ((_, result), path) in results.into_iter().zip(files) {
        match result {
            Ok(output) => println!("{}", render(&output, pretty)?),
            Err(err) => {
                print_parse_error(err.as_ref(), path);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

fn parse_file(path: &Path, options: &ParserOptions) -> Result<ParseOutput, Failure> {
    let source = read_source(path)?;
    let file_path = normalize_file_path(&path.to_string_lossy());

    let start_time = Instant::now();
    let output = ParseSession::new(&source, options)
        .with_file_path(&file_path)
        .run()?;
    debug!(
        "Parsed {} in {:?} ({} attempts)",
        path.display(),
        start_time.elapsed(),
        output.stats.attempts
    );

    Ok(output)
}

fn render(output: &ParseOutput, pretty: bool) -> serde_json::Result<String> {
    match &output.ast {
        Ast::Json(text) => Ok(text.clone()),
        ast if pretty => serde_json::to_string_pretty(ast),
        ast => serde_json::to_string(ast),
    }
}

/// Parse every file through the lint boundary and report syntax errors.
pub async fn check_files(files: &[PathBuf], recovery: RecoveryMode) -> Result<bool, Box<dyn std::error::Error>> {
    let context = ParseContext {
        language_options: LanguageOptions {
            recovery,
            ..LanguageOptions::default()
        },
    };

    let mut tasks = JoinSet::new();
    for (order, path) in files.iter().enumerate() {
        let path = path.clone();
        let context = context.clone();
        tasks.spawn_blocking(move || (order, check_file(&path, &context)));
    }

    let mut results = Vec::with_capacity(files.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(order, _)| *order);

    let mut failures = 0;
    for ((_, result), path) in results.into_iter().zip(files) {
        let file_name = path.display().to_string();
        match result {
            Ok(ParseOutcome::Success { .. }) => {
                println!("{} {}", "ok".green().bold(), file_name);
            }
            Ok(ParseOutcome::Failure { errors }) => {
                failures += 1;
                for error in errors {
                    print_syntax_error(&error, &file_name);
                }
            }
            Err(err) => {
                failures += 1;
                print_parse_error(err.as_ref(), path);
            }
        }
    }

    info!("Checked {} files, {} failed", files.len(), failures);
    Ok(failures == 0)
}

fn check_file(path: &Path, context: &ParseContext) -> Result<ParseOutcome, Failure> {
    let text = read_source(path)?;
    let path = path.to_string_lossy();

    Ok(language::parse(&LintFile { path: &path, text: &text }, context)?)
}

fn read_source(path: &Path) -> Result<String, Failure> {
    let source = fs::read_to_string(path).map_err(|e| format!("Failed to read file {}: {}", path.display(), e))?;
    debug!("Read {} bytes from {}", source.len(), path.display());
    Ok(source)
}

fn print_parse_error(error: &(dyn std::error::Error + 'static), path: &Path) {
    let file_name = path.display().to_string();

    match error.downcast_ref::<Error>() {
        Some(Error::Syntax(syntax)) => print_syntax_error(syntax, &file_name),
        Some(other) if other.is_type_error() => {
            eprintln!("{}: {} in {}", "TypeError".red().bold(), other, file_name.yellow());
        }
        _ => {
            eprintln!("{}: {} in {}", "Error".red().bold(), error, file_name.yellow());
        }
    }
}

fn print_syntax_error(error: &SyntaxError, file_name: &str) {
    eprintln!(
        "{}: {} at {}:{}:{}",
        "SyntaxError".red().bold(),
        error.message,
        file_name.yellow(),
        error.line,
        error.column
    );
}
