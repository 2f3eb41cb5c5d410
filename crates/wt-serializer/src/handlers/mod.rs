//! Element handlers and their registry.
//!
//! A handler implements generation for one element kind: it emits the
//! element's own syntax, recurses into children through
//! [`GenerationContext::serialize_children`], and declares how many newlines
//! may surround the element. Adding a kind means registering one more handler;
//! the walker and separator resolver do not change.

mod body;
mod caption;
mod encapsulated;
mod heading;
mod html;
mod link;
mod list;
mod misc;
mod paragraph;
mod quote;
mod table;

use std::collections::HashMap;

use wt_dom::{Document, Element, NodeId, NodeKind};

use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;

pub use body::BodyHandler;
pub use caption::CaptionHandler;
pub use encapsulated::EncapsulatedHandler;
pub use heading::HeadingHandler;
pub use html::LiteralHtmlHandler;
pub use link::LinkHandler;
pub use list::{ListHandler, ListItemHandler};
pub use misc::{BrHandler, HrHandler, PreHandler};
pub use paragraph::ParagraphHandler;
pub use quote::QuoteHandler;
pub use table::{TableCellHandler, TableHandler, TableRowHandler, TableSectionHandler};

/// Registry key for the handler of elements written as literal HTML.
pub const LITERAL_HTML: &str = "#literal-html";

/// Registry key for the handler of elements carrying extension data.
pub const ENCAPSULATED: &str = "#encapsulated";

/// Tags that only exist as literal HTML in wikitext.
const HTML_ONLY_TAGS: &[&str] = &[
    "div",
    "span",
    "small",
    "big",
    "u",
    "s",
    "del",
    "ins",
    "sup",
    "sub",
    "code",
    "tt",
    "center",
    "font",
    "blockquote",
    "strong",
    "em",
    "cite",
    "abbr",
    "kbd",
    "var",
    "samp",
    "q",
    "ruby",
    "rt",
    "rp",
    "mark",
];

/// Where the walker continues after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// With the node's next sibling.
    Next,
    /// After `last`, a later sibling the handler consumed together with the node.
    After(NodeId),
}

/// Generation contract for one element kind.
///
/// Constraint methods receive the node and the node on the other side of the
/// boundary: a sibling, or the parent at the first/last child position.
pub trait NodeHandler: Send + Sync {
    /// Emit the node's syntax and serialize its children.
    ///
    /// `wrapper_unmodified` is true when the element's tag and attributes match
    /// its recorded shape, so its original opening syntax may be reused.
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError>;

    /// Newlines allowed before `node`, given its previous sibling or parent.
    fn before(
        &self,
        _node: NodeId,
        _other: NodeId,
        _ctx: &GenerationContext<'_>,
    ) -> SeparatorConstraint {
        SeparatorConstraint::none()
    }

    /// Newlines allowed after `node`, given its next sibling or parent.
    fn after(
        &self,
        _node: NodeId,
        _other: NodeId,
        _ctx: &GenerationContext<'_>,
    ) -> SeparatorConstraint {
        SeparatorConstraint::none()
    }

    /// Newlines allowed between `node`'s opening and its first child.
    fn first_child(
        &self,
        _node: NodeId,
        _child: NodeId,
        _ctx: &GenerationContext<'_>,
    ) -> SeparatorConstraint {
        SeparatorConstraint::none()
    }

    /// Newlines allowed between `node`'s last child and its closing.
    fn last_child(
        &self,
        _node: NodeId,
        _child: NodeId,
        _ctx: &GenerationContext<'_>,
    ) -> SeparatorConstraint {
        SeparatorConstraint::none()
    }

    /// Whether the walker runs [`handle`](Self::handle) in single-line mode.
    fn uses_single_line_context(&self) -> bool {
        false
    }
}

/// Lookup from element kind to handler.
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn NodeHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for `kind`, replacing any existing one.
    pub fn register<H: NodeHandler + 'static>(&mut self, kind: impl Into<String>, handler: H) {
        self.handlers.insert(kind.into(), Box::new(handler));
    }

    /// Handler registered for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&dyn NodeHandler> {
        self.handlers.get(kind).map(|handler| handler.as_ref())
    }

    /// Whether a handler is registered for `kind`.
    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered kinds (sorted).
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Handler that serializes `element`.
    ///
    /// Extension data takes precedence, then literal HTML syntax, then the
    /// element's kind.
    #[must_use]
    pub fn resolve(&self, element: &Element) -> Option<&dyn NodeHandler> {
        if element.meta.data.is_some()
            && let Some(handler) = self.get(ENCAPSULATED)
        {
            return Some(handler);
        }
        if element.meta.is_literal_html()
            && let Some(handler) = self.get(LITERAL_HTML)
        {
            return Some(handler);
        }
        self.get(&element.name)
    }

    /// Create a registry with the built-in handlers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("body", BodyHandler);
        registry.register("p", ParagraphHandler);
        for level in ["h1", "h2", "h3", "h4", "h5", "h6"] {
            registry.register(level, HeadingHandler);
        }
        for list in ["ul", "ol", "dl"] {
            registry.register(list, ListHandler);
        }
        for item in ["li", "dt", "dd"] {
            registry.register(item, ListItemHandler);
        }
        registry.register("table", TableHandler);
        registry.register("caption", CaptionHandler);
        for section in ["tbody", "thead", "tfoot"] {
            registry.register(section, TableSectionHandler);
        }
        registry.register("tr", TableRowHandler);
        registry.register("td", TableCellHandler);
        registry.register("th", TableCellHandler);
        registry.register("b", QuoteHandler);
        registry.register("i", QuoteHandler);
        registry.register("a", LinkHandler);
        registry.register("pre", PreHandler);
        registry.register("hr", HrHandler);
        registry.register("br", BrHandler);
        for tag in HTML_ONLY_TAGS {
            registry.register(*tag, LiteralHtmlHandler);
        }
        registry.register(LITERAL_HTML, LiteralHtmlHandler);
        registry.register(ENCAPSULATED, EncapsulatedHandler);

        registry
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Whether `id` is a `ul`, `ol` or `dl`.
pub(crate) fn is_list(doc: &Document, id: NodeId) -> bool {
    doc.is_element_in(id, &["ul", "ol", "dl"])
}

/// Whether `id` is an `li`, `dt` or `dd`.
pub(crate) fn is_list_item(doc: &Document, id: NodeId) -> bool {
    doc.is_element_in(id, &["li", "dt", "dd"])
}

/// Whether `id` is an element written as literal HTML.
pub(crate) fn is_literal_html(doc: &Document, id: NodeId) -> bool {
    doc.element(id).is_some_and(|e| e.meta.is_literal_html())
}

/// Whether `id` produces no content of its own (whitespace text or comment).
pub(crate) fn is_separator_node(doc: &Document, id: NodeId) -> bool {
    match doc.node(id) {
        NodeKind::Text(text) => text.trim().is_empty(),
        NodeKind::Comment(_) => true,
        NodeKind::Element(_) => false,
    }
}

/// First child that is not whitespace or a comment.
pub(crate) fn first_rendered_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.children(id)
        .iter()
        .copied()
        .find(|&child| !is_separator_node(doc, child))
}

/// Next sibling that is not whitespace or a comment.
pub(crate) fn next_rendered_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut current = doc.next_sibling(id);
    while let Some(sibling) = current {
        if !is_separator_node(doc, sibling) {
            return Some(sibling);
        }
        current = doc.next_sibling(sibling);
    }
    None
}

/// Whether `id` is the root element.
pub(crate) fn is_root(doc: &Document, id: NodeId) -> bool {
    id == doc.root()
}

/// Newline limit for separators around `node` inside a table.
///
/// Wikitext table syntax tolerates fewer blank lines than literal HTML tables.
pub(crate) fn max_newlines_in_table(ctx: &GenerationContext<'_>, node: NodeId) -> u32 {
    let doc = ctx.doc();
    let table = std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|&id| doc.is_element_named(id, "table"));
    match table {
        Some(table) if is_literal_html(doc, table) => ctx.config().max_newlines,
        _ => ctx.config().max_newlines_in_table,
    }
}

/// Original opening syntax of an unmodified element, when it has any.
pub(crate) fn original_open<'a>(
    ctx: &GenerationContext<'a>,
    node: NodeId,
    wrapper_unmodified: bool,
) -> Option<&'a str> {
    if !wrapper_unmodified {
        return None;
    }
    let range = ctx.span(ctx.doc().element(node)?)?;
    ctx.source_range(range.start, range.inner_start())
        .filter(|open| !open.is_empty())
}

/// Original closing syntax of an unmodified element, when it has any.
pub(crate) fn original_close<'a>(
    ctx: &GenerationContext<'a>,
    node: NodeId,
    wrapper_unmodified: bool,
) -> Option<&'a str> {
    if !wrapper_unmodified {
        return None;
    }
    let range = ctx.span(ctx.doc().element(node)?)?;
    ctx.source_range(range.inner_end(), range.end)
        .filter(|close| !close.is_empty())
}

/// Render attributes as ` key="value"` pairs.
pub(crate) fn attributes_string(element: &Element) -> String {
    let mut out = String::new();
    for (key, value) in element.attrs.iter() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    out
}

/// Space between opening syntax and content (`* a`, `== a ==`).
///
/// None for empty content or content that already starts with whitespace.
/// Unmodified wrappers keep whatever the source had.
pub(crate) fn leading_space(
    ctx: &GenerationContext<'_>,
    node: NodeId,
    wrapper_unmodified: bool,
) -> &'static str {
    let doc = ctx.doc();
    let Some(first) = doc.first_child(node) else {
        return "";
    };
    if doc.text(first).is_some_and(|t| t.starts_with(char::is_whitespace)) {
        return "";
    }
    if wrapper_unmodified
        && let Some(range) = doc.element(node).and_then(|e| ctx.span(e))
    {
        let next = ctx.source_range(range.inner_start(), range.inner_start() + 1);
        return if next == Some(" ") { " " } else { "" };
    }
    " "
}

/// Space between content and closing syntax (`== a ==`).
pub(crate) fn trailing_space(
    ctx: &GenerationContext<'_>,
    node: NodeId,
    wrapper_unmodified: bool,
) -> &'static str {
    let doc = ctx.doc();
    let Some(last) = doc.last_child(node) else {
        return "";
    };
    if doc.text(last).is_some_and(|t| t.ends_with(char::is_whitespace)) {
        return "";
    }
    if wrapper_unmodified
        && let Some(range) = doc.element(node).and_then(|e| ctx.span(e))
        && let Some(before) = range.inner_end().checked_sub(1)
    {
        let prev = ctx.source_range(before, range.inner_end());
        return if prev == Some(" ") { " " } else { "" };
    }
    " "
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(HandlerRegistry: Send, Sync);

    struct NullHandler;

    impl NodeHandler for NullHandler {
        fn handle(
            &self,
            _node: NodeId,
            _ctx: &mut GenerationContext<'_>,
            _wrapper_unmodified: bool,
        ) -> Result<Resume, SerializeError> {
            Ok(Resume::Next)
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.has("mystery"));
        registry.register("mystery", NullHandler);
        assert!(registry.has("mystery"));
        assert!(registry.get("mystery").is_some());
        assert_eq!(registry.kinds(), vec!["mystery"]);
    }

    #[test]
    fn test_defaults_cover_core_kinds() {
        let registry = HandlerRegistry::with_defaults();
        for kind in ["body", "p", "h2", "ul", "li", "dd", "table", "caption", "td", "a"] {
            assert!(registry.has(kind), "missing handler for {kind}");
        }
        assert!(registry.has(LITERAL_HTML));
        assert!(registry.has(ENCAPSULATED));
        assert!(!registry.has("mystery"));
    }

    #[test]
    fn test_kinds_sorted() {
        let registry = HandlerRegistry::with_defaults();
        let kinds = registry.kinds();
        let mut sorted = kinds.clone();
        sorted.sort_unstable();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn test_resolve_precedence() {
        let registry = HandlerRegistry::with_defaults();
        let li = Element::new("li");
        assert!(registry.resolve(&li).is_some());

        let mut mystery = Element::new("mystery");
        assert!(registry.resolve(&mystery).is_none());
        mystery.meta.stx = Some(wt_dom::Syntax::Html);
        assert!(registry.resolve(&mystery).is_some());

        let mut template = Element::new("mystery");
        template.meta.data = Some(serde_json::json!({"src": "{{x}}"}));
        assert!(registry.resolve(&template).is_some());

        let empty = HandlerRegistry::new();
        assert!(empty.resolve(&template).is_none());
    }

    #[test]
    fn test_attributes_string() {
        let element = Element::new("td")
            .with_attr("class", "x")
            .with_attr("title", "say \"hi\"");
        assert_eq!(
            attributes_string(&element),
            r#" class="x" title="say &quot;hi&quot;""#
        );
    }

    #[test]
    fn test_rendered_navigation_skips_separators() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), Element::new("ul"));
        doc.append_text(ul, "\n");
        let a = doc.append_element(ul, Element::new("li"));
        doc.append_comment(ul, "x");
        doc.append_text(ul, " ");
        let b = doc.append_element(ul, Element::new("li"));
        assert_eq!(first_rendered_child(&doc, ul), Some(a));
        assert_eq!(next_rendered_sibling(&doc, a), Some(b));
        assert_eq!(next_rendered_sibling(&doc, b), None);
    }
}
