//! `wt serialize` command implementation.

use std::path::PathBuf;

use clap::Args;
use wt_config::{CliSettings, Config, UnknownElementPolicy};
use wt_dom::parse_html;
use wt_serializer::{SerializeOutput, WikitextSerializer};

use super::write_result;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serialize command.
#[derive(Args)]
pub(crate) struct SerializeArgs {
    /// Path to the annotated HTML file.
    html_file: PathBuf,

    /// Original wikitext the spans in the HTML point into.
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Write wikitext to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover wt.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record shapes before serializing, treating the input as unmodified.
    #[arg(long)]
    record_shapes: bool,

    /// Regenerate everything instead of reusing unmodified source.
    #[arg(long)]
    no_selective: bool,

    /// Drop wrappers of unknown elements without a span instead of failing.
    #[arg(long)]
    unwrap_unknown: bool,

    /// Enable verbose output (debug logs and timing).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SerializeArgs {
    /// Execute the serialize command.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing or serialization fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            selective: self.no_selective.then_some(false),
            unknown_elements: self.unwrap_unknown.then_some(UnknownElementPolicy::Unwrap),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        let html = std::fs::read_to_string(&self.html_file)?;
        let source = self
            .source
            .as_deref()
            .map(std::fs::read_to_string)
            .transpose()?;

        let result = serialize_html(&html, source, self.record_shapes, &config)?;
        for note in &result.notes {
            output.lossy_note(note);
        }

        let text = finish_text(result.text, config.output.trailing_newline);
        write_result(self.output.as_deref(), &text)?;
        if let Some(path) = self.output.as_deref() {
            output.wrote(path, &result.notes);
        }
        Ok(())
    }
}

/// Parse annotated HTML and serialize it with `config`.
pub(crate) fn serialize_html(
    html: &str,
    source: Option<String>,
    record_shapes: bool,
    config: &Config,
) -> Result<SerializeOutput, CliError> {
    let mut doc = parse_html(html)?;
    if let Some(source) = source {
        doc.set_source(source);
    }
    if record_shapes {
        doc.record_shapes();
    }

    let serializer = WikitextSerializer::new(config.serializer.clone());
    Ok(serializer.serialize(&doc)?)
}

/// Apply output settings to serialized text.
fn finish_text(mut text: String, trailing_newline: bool) -> String {
    if trailing_newline && !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
