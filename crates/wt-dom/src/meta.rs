//! Provenance metadata recorded by the forward pipeline.
//!
//! Each element carries a [`NodeMeta`] describing where it came from in the
//! original source and which syntax variant produced it. In annotated HTML the
//! record travels as JSON in the `data-wt` attribute:
//!
//! ```text
//! <li data-wt='{"dsr":[0,3,1,0],"stx":"html"}'>a</li>
//! ```

use serde::{Deserialize, Serialize};

/// Byte span of a node in the original source.
///
/// `open_width` and `close_width` cover the node's opening and closing syntax,
/// so `inner_start()..inner_end()` is the content between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 4]", into = "[usize; 4]")]
pub struct SourceRange {
    /// Offset of the first byte of the node.
    pub start: usize,
    /// Offset one past the last byte of the node.
    pub end: usize,
    /// Width of the opening syntax (e.g. `*` for a list item, `{|` for a table).
    pub open_width: usize,
    /// Width of the closing syntax (e.g. `|}` for a table).
    pub close_width: usize,
}

impl SourceRange {
    /// Create a range.
    #[must_use]
    pub const fn new(start: usize, end: usize, open_width: usize, close_width: usize) -> Self {
        Self {
            start,
            end,
            open_width,
            close_width,
        }
    }

    /// Range with no opening or closing syntax.
    #[must_use]
    pub const fn plain(start: usize, end: usize) -> Self {
        Self::new(start, end, 0, 0)
    }

    /// Offset where content starts (after the opening syntax).
    #[must_use]
    pub const fn inner_start(&self) -> usize {
        self.start.saturating_add(self.open_width)
    }

    /// Offset where content ends (before the closing syntax).
    #[must_use]
    pub const fn inner_end(&self) -> usize {
        self.end.saturating_sub(self.close_width)
    }

    /// Whether the range is well formed and fits a source of `len` bytes.
    #[must_use]
    pub const fn fits(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len && self.inner_start() <= self.inner_end()
    }
}

impl From<[usize; 4]> for SourceRange {
    fn from([start, end, open_width, close_width]: [usize; 4]) -> Self {
        Self::new(start, end, open_width, close_width)
    }
}

impl From<SourceRange> for [usize; 4] {
    fn from(range: SourceRange) -> Self {
        [range.start, range.end, range.open_width, range.close_width]
    }
}

/// Syntax variant that produced an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// Literal HTML tag syntax (`<li>` instead of `*`).
    Html,
    /// Same-line variant (`||` cells, `;term : def`).
    Row,
    /// Piped link (`[[target|text]]`).
    Piped,
    /// Bare URL without brackets.
    Simple,
}

/// Fingerprints of an element's shape.
///
/// Both values are hex-encoded SHA-256 digests; see [`crate::ShapeIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Covers the tag name and attribute set.
    pub wrapper: String,
    /// Covers the wrapper plus every descendant.
    pub subtree: String,
}

/// Metadata attached to every element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct NodeMeta {
    /// Original source span (absent for synthesized nodes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsr: Option<SourceRange>,
    /// Syntax variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stx: Option<Syntax>,
    /// Start tag was inserted by the forward pipeline, not written by the author.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_inserted_start: bool,
    /// End tag was inserted by the forward pipeline, not written by the author.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_inserted_end: bool,
    /// Opening syntax token used in the source (e.g. `|+`, `!!`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_tag_src: Option<String>,
    /// Closing syntax token used in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_tag_src: Option<String>,
    /// Shape recorded when the tree was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    /// Opaque extension data (`data-mw`), serialized separately.
    #[serde(skip)]
    pub data: Option<serde_json::Value>,
}

impl NodeMeta {
    /// Metadata with only a source span.
    #[must_use]
    pub fn with_dsr(dsr: SourceRange) -> Self {
        Self {
            dsr: Some(dsr),
            ..Self::default()
        }
    }

    /// Whether the element used literal HTML syntax.
    #[must_use]
    pub fn is_literal_html(&self) -> bool {
        self.stx == Some(Syntax::Html)
    }

    /// Whether nothing but the extension blob would be written to `data-wt`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Self {
            data: None,
            ..self.clone()
        } == Self::default()
    }
}
