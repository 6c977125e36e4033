// Entrypoint for the CLI application.
// - Keeps `main` small: parse the command line, create an API client and
//   hand it to the UI layer.
// - Returns `anyhow::Result` so every fatal error maps to a non-zero exit.

use anitrace::{api::SearchClient, ui};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anitrace", about = "Find the anime scene behind an image", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search by an image file on disk
    File {
        /// Path to the image file
        path: PathBuf,
    },
    /// Search by a direct image URL
    Url {
        /// URL of the image
        url: String,
    },
}

fn init_tracing() {
    // Warnings only by default so traces never mix into the result output;
    // RUST_LOG=debug shows the request/response details.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let api = SearchClient::from_env()?;
    match cli.command {
        Commands::File { path } => ui::search_file(&api, &path),
        Commands::Url { url } => ui::search_url(&api, &url),
    }
}
