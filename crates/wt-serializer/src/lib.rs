//! Selective HTML to wikitext serializer.
//!
//! Turns a decorated [`Document`] back into wikitext. Regions whose shape
//! still matches the recorded one are copied from the original source byte
//! for byte; everything else is regenerated by per-kind handlers, with the
//! whitespace between pieces chosen to satisfy every handler's newline
//! constraints while staying as close to the original as possible.
//!
//! # Architecture
//!
//! - [`HandlerRegistry`]: element kind to [`NodeHandler`]
//! - [`GenerationContext`]: output chunks, scoped-context stack and notes for
//!   one pass
//! - [`SeparatorConstraint`]: newline ranges merged at each boundary
//! - [`WikitextSerializer`]: entry point
//!
//! # Example
//!
//! ```
//! use wt_config::SerializerConfig;
//! use wt_dom::{Document, Element};
//! use wt_serializer::WikitextSerializer;
//!
//! let mut doc = Document::new();
//! let ul = doc.append_element(doc.root(), Element::new("ul"));
//! for item in ["a", "b"] {
//!     let li = doc.append_element(ul, Element::new("li"));
//!     doc.append_text(li, item);
//! }
//!
//! let serializer = WikitextSerializer::new(SerializerConfig::default());
//! let output = serializer.serialize(&doc).unwrap();
//! assert_eq!(output.text, "* a\n* b");
//! ```

mod constraint;
mod context;
mod error;
mod escape;
pub mod handlers;
mod separator;
mod walker;

use std::time::Instant;

use wt_config::SerializerConfig;
use wt_dom::{Document, NodeId};

pub use constraint::SeparatorConstraint;
pub use context::{Chunk, ContextEntry, GenerationContext, Output, ScopedContext};
pub use error::{SerializeError, SerializeFailure};
pub use escape::{
    TextHook, TextPosition, escape_heading, escape_list_item, escape_table_cell, escape_wikitext,
    indent_pre,
};
pub use handlers::{HandlerRegistry, NodeHandler, Resume};

/// A node that was written from its original source instead of generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossyNote {
    /// Affected node.
    pub node: NodeId,
    /// Element kind (`#text` for non-elements).
    pub kind: String,
    /// Why generation fell back.
    pub reason: String,
}

/// Result of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOutput {
    /// Regenerated wikitext.
    pub text: String,
    /// Lossy fallbacks taken during the pass.
    pub notes: Vec<LossyNote>,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Wikitext serializer.
///
/// Holds no per-document state, so one instance can serve concurrent calls.
pub struct WikitextSerializer {
    registry: HandlerRegistry,
    config: SerializerConfig,
}

impl WikitextSerializer {
    /// Create a serializer with the built-in handlers.
    #[must_use]
    pub fn new(config: SerializerConfig) -> Self {
        Self::with_registry(HandlerRegistry::with_defaults(), config)
    }

    /// Create a serializer with a custom handler registry.
    #[must_use]
    pub fn with_registry(registry: HandlerRegistry, config: SerializerConfig) -> Self {
        Self { registry, config }
    }

    /// Handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Handler registry, for registering additional kinds.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Serializer configuration.
    #[must_use]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize `doc` to wikitext.
    ///
    /// A failed pass returns the error with the notes recorded before it,
    /// never partial text.
    pub fn serialize(&self, doc: &Document) -> Result<SerializeOutput, SerializeFailure> {
        let start = Instant::now();
        tracing::debug!(
            nodes = doc.len(),
            selective = self.config.selective,
            has_source = doc.source().is_some(),
            "Serializing document"
        );

        let mut ctx = GenerationContext::new(doc, &self.registry, &self.config);
        if let Err(error) = run(&mut ctx, doc.root()) {
            tracing::debug!(%error, "Serialization failed");
            return Err(SerializeFailure {
                error,
                notes: ctx.take_notes(),
            });
        }

        let (output, notes) = ctx.into_parts();
        let text = output.text();
        tracing::info!(
            bytes = text.len(),
            chunks = output.chunks().len(),
            notes = notes.len(),
            elapsed_ms = elapsed_ms(start),
            "Document serialized"
        );
        Ok(SerializeOutput { text, notes })
    }
}

impl Default for WikitextSerializer {
    fn default() -> Self {
        Self::new(SerializerConfig::default())
    }
}

fn run(ctx: &mut GenerationContext<'_>, root: NodeId) -> Result<(), SerializeError> {
    ctx.serialize_element(root)?;
    ctx.flush_separator()?;
    ctx.check_balance(0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wt_config::UnknownElementPolicy;
    use wt_dom::{Element, NodeMeta, SourceRange, Syntax, parse_html};

    use super::*;

    static_assertions::assert_impl_all!(WikitextSerializer: Send, Sync);

    fn serialize(doc: &Document) -> SerializeOutput {
        WikitextSerializer::default().serialize(doc).unwrap()
    }

    fn spanned(name: &str, range: SourceRange) -> Element {
        Element::new(name).with_meta(NodeMeta::with_dsr(range))
    }

    #[test]
    fn test_unordered_list() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        let a = doc.append_element(ul, Element::new("li"));
        doc.append_text(a, "a");
        let b = doc.append_element(ul, Element::new("li"));
        doc.append_text(b, "b");

        assert_eq!(serialize(&doc).text, "* a\n* b");
    }

    #[test]
    fn test_nested_list_has_no_duplicate_bullets() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        let outer = doc.append_element(ul, Element::new("li"));
        let inner_list = doc.append_element(outer, Element::new("ol"));
        let inner = doc.append_element(inner_list, Element::new("li"));
        doc.append_text(inner, "deep");
        let next = doc.append_element(ul, Element::new("li"));
        doc.append_text(next, "c");

        assert_eq!(serialize(&doc).text, "*# deep\n* c");
    }

    #[test]
    fn test_item_text_then_nested_list() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        let li = doc.append_element(ul, Element::new("li"));
        doc.append_text(li, "a");
        let nested = doc.append_element(li, Element::new("ul"));
        let inner = doc.append_element(nested, Element::new("li"));
        doc.append_text(inner, "b");
        let last = doc.append_element(ul, Element::new("li"));
        doc.append_text(last, "c");

        assert_eq!(serialize(&doc).text, "* a\n** b\n* c");
    }

    #[test]
    fn test_list_item_text_is_single_line() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        let li = doc.append_element(ul, Element::new("li"));
        doc.append_text(li, "one\ntwo");

        assert_eq!(serialize(&doc).text, "* one two");
    }

    #[test]
    fn test_definition_list() {
        let mut doc = Document::new();
        let dl = doc.append_element(doc.root(), Element::new("dl"));
        let dt = doc.append_element(dl, Element::new("dt"));
        doc.append_text(dt, "term ");
        let dd = doc.append_element(
            dl,
            Element::new("dd").with_meta(NodeMeta {
                stx: Some(Syntax::Row),
                ..NodeMeta::default()
            }),
        );
        doc.append_text(dd, "definition");

        assert_eq!(serialize(&doc).text, "; term : definition");
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let mut doc = Document::new();
        let root = doc.root();
        let h2 = doc.append_element(root, Element::new("h2"));
        doc.append_text(h2, "Title");
        let p = doc.append_element(root, Element::new("p"));
        doc.append_text(p, "First.");
        let q = doc.append_element(root, Element::new("p"));
        doc.append_text(q, "Second.");

        assert_eq!(serialize(&doc).text, "== Title ==\nFirst.\n\nSecond.");
    }

    #[test]
    fn test_inline_markup() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), Element::new("p"));
        let b = doc.append_element(p, Element::new("b"));
        doc.append_text(b, "bold");
        doc.append_text(p, " and ");
        let link = doc.append_element(
            p,
            Element::new("a")
                .with_attr("rel", "mw:WikiLink")
                .with_attr("href", "./Main_Page"),
        );
        doc.append_text(link, "home");
        doc.append_text(p, " or ");
        let external = doc.append_element(
            p,
            Element::new("a").with_attr("href", "https://example.org"),
        );
        doc.append_text(external, "site");

        assert_eq!(
            serialize(&doc).text,
            "'''bold''' and [[Main Page|home]] or [https://example.org site]"
        );
    }

    #[test]
    fn test_table_with_edited_caption() {
        let mut doc = Document::new();
        let table = doc.append_element(doc.root(), Element::new("table"));
        let caption = doc.append_element(table, Element::new("caption"));
        doc.append_text(caption, "Totals 2");

        assert_eq!(serialize(&doc).text, "{|\n|+Totals 2\n|}");
    }

    #[test]
    fn test_unmodified_caption_is_reused() {
        let source = "{|\n|+ Totals\n|}";
        let mut doc = Document::new().with_source(source);
        let table = doc.append_element(doc.root(), spanned("table", SourceRange::new(0, 15, 2, 2)));
        let caption = doc.append_element(table, spanned("caption", SourceRange::new(3, 12, 2, 0)));
        doc.append_text(caption, " Totals");
        doc.record_shapes();
        doc.element_mut(table).unwrap().attrs.set("class", "wikitable");

        assert_eq!(
            serialize(&doc).text,
            "{| class=\"wikitable\"\n|+ Totals\n|}"
        );
    }

    #[test]
    fn test_caption_span_ending_in_newline_is_not_doubled() {
        let source = "{|\n|+ Totals\n|}";
        let mut doc = Document::new().with_source(source);
        let table = doc.append_element(doc.root(), spanned("table", SourceRange::new(0, 15, 2, 2)));
        let caption = doc.append_element(table, spanned("caption", SourceRange::new(3, 13, 2, 0)));
        doc.append_text(caption, " Totals");
        doc.record_shapes();
        doc.element_mut(table).unwrap().attrs.set("class", "w");

        let output = serialize(&doc);
        assert_eq!(output.text, "{| class=\"w\"\n|+ Totals\n|}");
        assert!(!output.text.contains("\n\n"));
    }

    #[test]
    fn test_table_rows_and_cells() {
        let mut doc = Document::new();
        let table = doc.append_element(doc.root(), Element::new("table"));
        let tbody = doc.append_element(table, Element::new("tbody"));
        let tr = doc.append_element(tbody, Element::new("tr"));
        let a = doc.append_element(tr, Element::new("td"));
        doc.append_text(a, "a");
        let b = doc.append_element(
            tr,
            Element::new("td").with_meta(NodeMeta {
                stx: Some(Syntax::Row),
                ..NodeMeta::default()
            }),
        );
        doc.append_text(b, "b");

        assert_eq!(serialize(&doc).text, "{|\n|-\n|a||b\n|}");
    }

    #[test]
    fn test_unknown_element_with_span_is_passed_through() {
        let source = "<mystery>x</mystery>";
        let mut doc = Document::new().with_source(source);
        let mystery = doc.append_element(
            doc.root(),
            spanned("mystery", SourceRange::new(0, source.len(), 9, 10)),
        );
        doc.append_text(mystery, "x");

        let output = serialize(&doc);
        assert_eq!(output.text, source);
        assert_eq!(output.notes.len(), 1);
        assert_eq!(output.notes[0].node, mystery);
        assert_eq!(output.notes[0].kind, "mystery");
    }

    #[test]
    fn test_unknown_element_without_span_aborts() {
        let mut doc = Document::new();
        let mystery = doc.append_element(doc.root(), Element::new("mystery"));
        doc.append_text(mystery, "x");

        let failure = WikitextSerializer::default().serialize(&doc).unwrap_err();
        assert_eq!(
            failure.error,
            SerializeError::UnknownElementKind {
                node: mystery,
                kind: "mystery".to_owned()
            }
        );
    }

    #[test]
    fn test_unwrap_policy_keeps_children() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), Element::new("p"));
        let mystery = doc.append_element(p, Element::new("mystery"));
        doc.append_text(mystery, "kept");

        let config = SerializerConfig {
            unknown_elements: UnknownElementPolicy::Unwrap,
            ..SerializerConfig::default()
        };
        let output = WikitextSerializer::new(config).serialize(&doc).unwrap();
        assert_eq!(output.text, "kept");
        assert_eq!(output.notes.len(), 1);
    }

    #[test]
    fn test_failure_keeps_earlier_notes() {
        let source = "<odd>y</odd>";
        let mut doc = Document::new().with_source(source);
        let root = doc.root();
        let p = doc.append_element(root, Element::new("p"));
        doc.append_element(p, spanned("odd", SourceRange::new(0, 12, 5, 6)));
        doc.append_element(p, Element::new("mystery"));

        let failure = WikitextSerializer::default().serialize(&doc).unwrap_err();
        assert!(matches!(failure.error, SerializeError::UnknownElementKind { .. }));
        assert_eq!(failure.notes.len(), 1);
        assert_eq!(failure.notes[0].kind, "odd");
    }

    /// `* a\n* b\n\nend` with spans for every element.
    fn list_and_paragraph() -> (Document, NodeId) {
        let source = "* a\n* b\n\nend";
        let mut doc = Document::new().with_source(source);
        let root = doc.root();
        let ul = doc.append_element(root, spanned("ul", SourceRange::plain(0, 7)));
        let a = doc.append_element(ul, spanned("li", SourceRange::new(0, 3, 1, 0)));
        doc.append_text(a, " a");
        doc.append_text(ul, "\n");
        let b = doc.append_element(ul, spanned("li", SourceRange::new(4, 7, 1, 0)));
        let b_text = doc.append_text(b, " b");
        doc.append_text(root, "\n\n");
        let p = doc.append_element(root, spanned("p", SourceRange::plain(9, 12)));
        doc.append_text(p, "end");
        doc.record_shapes();
        (doc, b_text)
    }

    #[test]
    fn test_unmodified_document_is_byte_identical() {
        let (doc, _) = list_and_paragraph();
        let output = serialize(&doc);
        assert_eq!(output.text, doc.source().unwrap());
        assert_eq!(output.notes, Vec::new());
    }

    #[test]
    fn test_edit_keeps_surrounding_source() {
        let (mut doc, b_text) = list_and_paragraph();
        doc.set_text(b_text, " B");
        assert_eq!(serialize(&doc).text, "* a\n* B\n\nend");
    }

    #[test]
    fn test_non_selective_regenerates_everything() {
        let source = "*  a";
        let mut doc = Document::new().with_source(source);
        let ul = doc.append_element(doc.root(), spanned("ul", SourceRange::plain(0, 4)));
        let li = doc.append_element(ul, spanned("li", SourceRange::new(0, 4, 1, 0)));
        doc.append_text(li, "a");
        doc.record_shapes();

        assert_eq!(serialize(&doc).text, source);

        let config = SerializerConfig {
            selective: false,
            ..SerializerConfig::default()
        };
        let output = WikitextSerializer::new(config).serialize(&doc).unwrap();
        assert_eq!(output.text, "* a");
    }

    #[test]
    fn test_encapsulated_run() {
        let html = r##"<body><p>see <span about="#mwt1" data-mw='{"src":"{{tpl}}"}'>x</span><span about="#mwt1">y</span> done</p></body>"##;
        let doc = parse_html(html).unwrap();
        assert_eq!(serialize(&doc).text, "see {{tpl}} done");
    }

    #[test]
    fn test_boundaries_satisfy_constraints() {
        let mut doc = Document::new();
        let root = doc.root();
        let h = doc.append_element(root, Element::new("h3"));
        doc.append_text(h, "H");
        doc.append_text(root, "\n\n\n\n\n");
        doc.append_element(root, Element::new("hr"));
        let ul = doc.append_element(root, Element::new("ul"));
        let li = doc.append_element(ul, Element::new("li"));
        doc.append_text(li, "x");

        let text = serialize(&doc).text;
        // The five skipped newlines exceed the range, so the minimum is used.
        assert_eq!(text, "=== H ===\n----\n* x");
        assert!(!text.contains("\n\n\n"));
    }

    /// Longest run of consecutive newlines in `text`.
    fn longest_newline_run(text: &str) -> usize {
        text.split(|c| c != '\n').map(str::len).max().unwrap_or(0)
    }

    #[test]
    fn test_reused_slices_ending_in_newlines_stay_in_range() {
        // Every element span here swallows its own trailing newline.
        let source = "{|\n|+ Totals\n|}\n\n* a\n* b\n\nend";
        let build = || {
            let mut doc = Document::new().with_source(source);
            let root = doc.root();
            let table = doc.append_element(root, spanned("table", SourceRange::new(0, 15, 2, 2)));
            let caption = doc.append_element(table, spanned("caption", SourceRange::new(3, 13, 2, 0)));
            let caption_text = doc.append_text(caption, " Totals");
            doc.append_text(root, "\n\n");
            let ul = doc.append_element(root, spanned("ul", SourceRange::plain(17, 25)));
            let a = doc.append_element(ul, spanned("li", SourceRange::new(17, 21, 1, 0)));
            let a_text = doc.append_text(a, " a");
            let b = doc.append_element(ul, spanned("li", SourceRange::new(21, 25, 1, 0)));
            doc.append_text(b, " b");
            doc.append_text(root, "\n");
            let p = doc.append_element(root, spanned("p", SourceRange::plain(26, 29)));
            doc.append_text(p, "end");
            doc.record_shapes();
            (doc, table, caption_text, a_text)
        };

        let (doc, ..) = build();
        assert_eq!(serialize(&doc).text, source);

        let edits: [&dyn Fn(&mut Document, NodeId, NodeId, NodeId); 3] = [
            &|doc, table, _, _| doc.element_mut(table).unwrap().attrs.set("class", "w"),
            &|doc, _, caption_text, _| {
                doc.set_text(caption_text, " Sums");
            },
            &|doc, _, _, a_text| {
                doc.set_text(a_text, " A");
            },
        ];
        for edit in edits {
            let (mut doc, table, caption_text, a_text) = build();
            edit(&mut doc, table, caption_text, a_text);
            let output = serialize(&doc);
            let (table_text, rest) = output.text.split_once("|}").unwrap();
            assert_eq!(longest_newline_run(table_text), 1, "{:?}", output.text);
            assert!(longest_newline_run(rest) <= 2, "{:?}", output.text);
            assert!(rest.ends_with("\nend"), "{:?}", output.text);
        }
    }

    #[test]
    fn test_context_stack_is_empty_after_failure() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        let li = doc.append_element(ul, Element::new("li"));
        doc.append_element(li, Element::new("mystery"));

        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&doc, &registry, &config);
        assert!(ctx.serialize_element(doc.root()).is_err());
        assert_eq!(ctx.depth(), 0);
    }
}
