//! Annotated HTML: the format the forward pipeline hands trees over in.
//!
//! Ordinary attributes are kept as-is. Two reserved attributes carry the
//! decorations:
//!
//! - `data-wt`: [`NodeMeta`](crate::NodeMeta) as JSON
//! - `data-mw`: the opaque extension-data blob

mod entities;
mod parser;
mod serializer;

pub use parser::parse_html;
pub use serializer::to_html;

/// Attribute holding element metadata.
pub const META_ATTR: &str = "data-wt";

/// Attribute holding extension data.
pub const EXTENSION_ATTR: &str = "data-mw";

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "wbr", "input", "meta", "link"];
