//! CLI error types.

use wt_config::ConfigError;
use wt_dom::DomError;
use wt_serializer::SerializeFailure;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Dom(#[from] DomError),

    #[error("{0}")]
    Serialize(#[from] SerializeFailure),
}
