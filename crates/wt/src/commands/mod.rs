//! CLI command implementations.

pub(crate) mod annotate;
pub(crate) mod serialize;

use std::io::Write;
use std::path::Path;

pub(crate) use annotate::AnnotateArgs;
pub(crate) use serialize::SerializeArgs;

use crate::error::CliError;

/// Write `content` to `path`, or to stdout when no path is given.
fn write_result(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    if let Some(path) = path {
        std::fs::write(path, content)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}
