//! Error types for reading and writing annotated documents.

use std::str::Utf8Error;

/// Error while reading or writing annotated HTML.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DomError {
    /// XML parsing error.
    #[error("XML parse error")]
    XmlParse(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// XML attribute error.
    #[error("XML attribute error")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// A `data-wt` or `data-mw` attribute did not hold valid JSON.
    #[error("invalid metadata on <{tag}>")]
    InvalidMetadata {
        /// Tag name of the element carrying the attribute.
        tag: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Metadata could not be encoded while writing HTML.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}
