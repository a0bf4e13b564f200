//! gmlparse command line interface

pub mod runner;

use clap::{Parser, Subcommand, ValueEnum};
use gml_core::{AstFormat, ParserOptions, RecoveryMode};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "gmlparse")]
#[command(about = "GameMaker Language parser")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Files to parse when no subcommand is given
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse files and print their AST as JSON
    Parse {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        flags: ParseFlags,
    },

    /// Parse files the way a lint tool does and report syntax errors
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Recovery mode
        #[arg(long, value_enum, default_value_t = Recovery::None)]
        recovery: Recovery,
    },

    /// Print the child fields of every node type
    Keys,
}

#[derive(clap::Args)]
pub struct ParseFlags {
    /// Output tree format
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Recovery mode
    #[arg(long, value_enum)]
    pub recovery: Option<Recovery>,

    /// Emit plain offsets instead of full locations
    #[arg(long)]
    pub simplify_locations: bool,

    /// Skip comment and whitespace collection
    #[arg(long)]
    pub no_comments: bool,

    /// Emit no location data
    #[arg(long)]
    pub no_locations: bool,

    /// JSON file with parser options, applied before the flags
    #[arg(long, value_name = "JSON")]
    pub options: Option<PathBuf>,

    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Gml,
    Estree,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Recovery {
    None,
    Limited,
}

impl From<Format> for AstFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Gml => AstFormat::Gml,
            Format::Estree => AstFormat::Estree,
        }
    }
}

impl From<Recovery> for RecoveryMode {
    fn from(recovery: Recovery) -> Self {
        match recovery {
            Recovery::None => RecoveryMode::None,
            Recovery::Limited => RecoveryMode::Limited,
        }
    }
}

impl ParseFlags {
    /// Options file first, then every flag that was given.
    pub fn parser_options(&self) -> Result<ParserOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.options {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read options file {}: {}", path.display(), e))?;
                ParserOptions::from_value(&serde_json::from_str(&text)?)?
            }
            None => ParserOptions::default(),
        };

        if let Some(format) = self.format {
            options.ast_format = format.into();
        }
        if let Some(recovery) = self.recovery {
            options.recovery = recovery.into();
        }
        if self.simplify_locations {
            options.simplify_locations = true;
        }
        if self.no_comments {
            options.get_comments = false;
        }
        if self.no_locations {
            options.get_locations = false;
        }

        debug!("Parser options: {:?}", options);
        Ok(options)
    }
}

impl Cli {
    pub fn new() -> Self {
        Self::parse()
    }

    /// Returns `false` when any file failed to parse.
    pub async fn run(&self) -> Result<bool, Box<dyn std::error::Error>> {
        match &self.command {
            Some(Commands::Parse { files, flags }) => {
                info!("Parsing {} files", files.len());
                runner::parse_files(files, flags.parser_options()?, flags.pretty).await
            }

            Some(Commands::Check { files, recovery }) => {
                info!("Checking {} files", files.len());
                runner::check_files(files, (*recovery).into()).await
            }

            Some(Commands::Keys) => {
                println!("{}", serde_json::to_string_pretty(&gml_core::visitor_keys())?);
                Ok(true)
            }

            None => {
                if self.files.is_empty() {
                    return Err("no input files".into());
                }
                runner::parse_files(&self.files, ParserOptions::default(), false).await
            }
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
