//! gloss CLI - glossary term annotation.
//!
//! Provides commands for:
//! - `annotate`: Wrap glossary terms in a rendered HTML page
//! - `terms`: List the terms a page would be annotated with

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AnnotateArgs, TermsArgs};
use output::Output;

/// gloss - Glossary term annotation for HTML pages.
#[derive(Parser)]
#[command(name = "gloss", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate glossary terms in an HTML page.
    Annotate(AnnotateArgs),
    /// List the effective term catalog.
    Terms(TermsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = match &cli.command {
        Commands::Annotate(args) => args.verbose,
        Commands::Terms(args) => args.verbose,
    };
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Annotate(args) => args.execute(),
        Commands::Terms(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
