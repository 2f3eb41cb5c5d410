//! WT CLI - selective wikitext serializer.
//!
//! Provides commands for:
//! - `serialize`: Turn annotated HTML back into wikitext
//! - `annotate`: Record shapes on annotated HTML so later edits can be detected

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AnnotateArgs, SerializeArgs};
use output::Output;

/// WT - selective wikitext serializer.
#[derive(Parser)]
#[command(name = "wt", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serialize annotated HTML to wikitext.
    Serialize(SerializeArgs),
    /// Record element shapes on annotated HTML.
    Annotate(AnnotateArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Serialize(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serialize(args) => args.execute(),
        Commands::Annotate(args) => args.execute(),
    };

    if let Err(err) = result {
        output.failure(&err);
        std::process::exit(1);
    }
}
