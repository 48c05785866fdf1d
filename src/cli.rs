//! This module implements the CLI for polyglot-forge: command parsing, argument validation and
//! the async entrypoint shared by `main` and the integration tests.
//!
//! All conversion logic (prompting, generation, fallback, pacing) lives in the
//! [`polyglot-forge-core`] crate. This module is strictly glue: it loads config, builds the
//! provider client and hands off to either the HTTP server or a one-shot local conversion.
//!
//! ## Subcommands
//! - `serve`: run the HTTP API (`POST /api/convert`, `GET /api/health`)
//! - `convert`: convert local files/directories and write a ZIP archive or a directory
//!
//! [`polyglot-forge-core`]: ../../polyglot-forge-core/

use crate::archive::{write_dir, write_zip, DEFAULT_ARCHIVE_NAME};
use crate::collect::collect_input_files;
use crate::load_config::load_config;
use crate::provider::FireworksClient;
use crate::server;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use polyglot_forge_core::batch::{convert_batch, BatchSettings};
use polyglot_forge_core::contract::{
    ConversionRequest, ConversionResult, Generator, LATEST_VERSION,
};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for polyglot-forge: convert source files to another language with an LLM.
#[derive(Parser)]
#[clap(
    name = "polyglot-forge",
    version,
    about = "Convert a folder or files to another language using a schema-constrained LLM"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP conversion API
    Serve {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Port to listen on (overrides config and PORT)
        #[clap(long)]
        port: Option<u16>,
    },
    /// Convert local files or directories and package the results
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Files or directories to convert
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,
    /// Target language, e.g. Python, Go, Rust
    #[clap(long, short = 'l')]
    pub language: String,
    /// Target version or flavor; "latest" lets the model pick
    #[clap(long = "target-version", short = 't', default_value = LATEST_VERSION)]
    pub target_version: String,
    /// Write converted files into this directory instead of a ZIP archive
    #[clap(long, conflicts_with = "zip")]
    pub output: Option<PathBuf>,
    /// ZIP archive to write
    #[clap(long)]
    pub zip: Option<PathBuf>,
    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Serve { config, port } => {
            let mut config = load_config(config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!(command = "serve", bind = %config.bind_address(), "Starting server");
            let generator = Arc::new(FireworksClient::from_config(&config.provider)?);
            server::serve(&config, generator).await
        }
        Commands::Convert(args) => {
            let config = load_config(args.config.clone())?;
            let generator = FireworksClient::from_config(&config.provider)?;
            let result = convert_local(&args, &generator, &config.batch_settings()).await?;
            println!(
                "Converted {} file(s), {} returned unconverted.",
                result.files.len(),
                result.fallback_count()
            );
            Ok(())
        }
    }
}

/// Read `args.paths`, run one batch and write the results where `args` asks.
pub async fn convert_local<G>(
    args: &ConvertArgs,
    generator: &G,
    settings: &BatchSettings,
) -> Result<ConversionResult>
where
    G: Generator + ?Sized,
{
    let files = collect_input_files(&args.paths)?;
    let request = ConversionRequest {
        files,
        target_language: args.language.clone(),
        target_version: args.target_version.clone(),
    };

    tracing::info!(
        command = "convert",
        files = request.files.len(),
        target_language = %request.target_language,
        "Starting conversion"
    );
    let result = convert_batch(&request, generator, settings).await?;

    match &args.output {
        Some(dir) => write_dir(&result.files, dir)
            .with_context(|| format!("Failed to write output directory {}", dir.display()))?,
        None => {
            let dest = args
                .zip
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_NAME));
            write_zip(&result.files, &dest)
                .with_context(|| format!("Failed to write archive {}", dest.display()))?
        }
    }

    tracing::info!(
        command = "convert",
        fallback = result.fallback_count(),
        "Conversion complete"
    );
    Ok(result)
}
