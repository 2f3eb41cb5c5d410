//! Decorated document tree for the wikitext serializer.
//!
//! The forward pipeline (markup to HTML) builds a [`Document`] whose elements
//! carry provenance metadata: the byte span they came from in the original
//! source, the syntax variant used, and a recorded shape fingerprint. The
//! serializer reads the tree without mutating it and uses the metadata to
//! decide which regions can be copied from the original source.
//!
//! # Modules
//!
//! - [`Document`]: index arena with ordered children and parent lookups
//! - [`NodeMeta`] / [`SourceRange`]: per-element provenance
//! - [`ShapeIndex`]: current wrapper and subtree fingerprints
//! - [`parse_html`] / [`to_html`]: annotated HTML boundary format
//!
//! # Example
//!
//! ```
//! use wt_dom::{Document, Element, NodeMeta, SourceRange};
//!
//! let mut doc = Document::new().with_source("* a\n* b");
//! let ul = doc.append_element(doc.root(), Element::new("ul"));
//! let li = doc.append_element(
//!     ul,
//!     Element::new("li").with_meta(NodeMeta::with_dsr(SourceRange::new(0, 3, 1, 0))),
//! );
//! doc.append_text(li, " a");
//! doc.record_shapes();
//!
//! assert!(doc.element(li).unwrap().meta.shape.is_some());
//! ```

mod document;
mod error;
mod html;
mod meta;
mod node;
mod shape;

pub use document::Document;
pub use error::DomError;
pub use html::{EXTENSION_ATTR, META_ATTR, VOID_ELEMENTS, parse_html, to_html};
pub use meta::{NodeMeta, Shape, SourceRange, Syntax};
pub use node::{Attributes, Element, NodeId, NodeKind};
pub use shape::{ShapeIndex, wrapper_fingerprint};
