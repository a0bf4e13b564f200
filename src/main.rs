//! gmlparse
//!
//! Parses GameMaker Language files into JSON syntax trees, optionally
//! recovering from a missing argument separator or unclosed blocks.

use gml_cli::Cli;
use std::process::ExitCode;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::new();

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    info!("Starting gmlparse v{}", env!("CARGO_PKG_VERSION"));

    match cli.run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(2)
        }
    }
}
