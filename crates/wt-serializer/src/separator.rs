//! Separator resolution.
//!
//! Every boundary the walker crosses (parent start to first child, sibling to
//! sibling, last child to parent end) contributes a constraint from the
//! handlers on both sides. Boundaries with no output between them accumulate
//! into one pending separator, which is resolved and written just before the
//! next non-empty chunk.
//!
//! Resolution order:
//!
//! 1. Original bytes between the two spans, when both sides are unmodified,
//!    the bytes are whitespace and their newline count fits the range
//! 2. The whitespace text nodes skipped between the two nodes, if they fit
//! 3. `min` newlines; with `min == 0`, the skipped whitespace with newline
//!    runs collapsed to spaces
//!
//! Newlines the output already ends with (a reused slice such as `|+ x\n`)
//! count toward the range.
//!
//! A separator is capped at zero newlines only when every boundary merged
//! into it lies inside single-line mode. The end of a list item and the start
//! of the next one share one separator, and that separator is outside both.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use wt_dom::NodeId;

use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;
use crate::handlers::NodeHandler;

static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("invalid newline regex"));

/// Left side of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Left {
    /// Just inside the parent's opening syntax.
    ParentStart(NodeId),
    /// After `node`, whose output extends through sibling `last`.
    Node { node: NodeId, last: NodeId },
}

/// Right side of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Right {
    /// Before `node`.
    Node(NodeId),
    /// Just inside the parent's closing syntax.
    ParentEnd(NodeId),
}

/// Separator waiting for the next chunk.
#[derive(Debug, Clone)]
pub(crate) struct PendingSeparator {
    constraint: SeparatorConstraint,
    span: Option<Range<usize>>,
    dom_text: String,
    single_line: bool,
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

fn is_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

impl GenerationContext<'_> {
    /// Handler whose constraints apply to `node` (none for text and unknown kinds).
    fn constraint_handler(&self, node: NodeId) -> Option<&dyn NodeHandler> {
        let element = self.doc().element(node)?;
        self.registry.resolve(element)
    }

    /// Merged constraint for a boundary.
    pub(crate) fn boundary_constraint(&self, left: Left, right: Right) -> SeparatorConstraint {
        let handler = move |node| self.constraint_handler(node);
        match (left, right) {
            (Left::ParentStart(parent), Right::Node(child)) => {
                let first = handler(parent)
                    .map(|h| h.first_child(parent, child, self))
                    .unwrap_or_default();
                let before = handler(child)
                    .map(|h| h.before(child, parent, self))
                    .unwrap_or_default();
                first.merge(before)
            }
            (Left::Node { node: prev, .. }, Right::Node(next)) => {
                let after = handler(prev)
                    .map(|h| h.after(prev, next, self))
                    .unwrap_or_default();
                let before = handler(next)
                    .map(|h| h.before(next, prev, self))
                    .unwrap_or_default();
                after.merge(before)
            }
            (Left::Node { node: child, .. }, Right::ParentEnd(parent)) => {
                let after = handler(child)
                    .map(|h| h.after(child, parent, self))
                    .unwrap_or_default();
                let last = handler(parent)
                    .map(|h| h.last_child(parent, child, self))
                    .unwrap_or_default();
                after.merge(last)
            }
            (Left::ParentStart(_), Right::ParentEnd(_)) => SeparatorConstraint::none(),
        }
    }

    /// Original byte range of a boundary, when both sides are unmodified.
    ///
    /// Text and comment children carry no span. With no whitespace skipped,
    /// one at the edge of its parent starts (or ends) at the parent's inner
    /// edge.
    fn boundary_span(&self, left: Left, right: Right, dom_text: &str) -> Option<Range<usize>> {
        let doc = self.doc();
        let span_of = move |node: NodeId| {
            if !self.wrapper_unmodified(node) {
                return None;
            }
            self.span(doc.element(node)?)
        };
        let start = match (left, right) {
            (Left::ParentStart(parent), _) => span_of(parent)?.inner_start(),
            (Left::Node { last, .. }, Right::ParentEnd(parent))
                if doc.element(last).is_none() && dom_text.is_empty() =>
            {
                span_of(parent)?.inner_end()
            }
            (Left::Node { node, last }, _) => {
                span_of(node)?;
                span_of(last)?.end
            }
        };
        let end = match (left, right) {
            (Left::ParentStart(parent), Right::Node(node))
                if doc.element(node).is_none() && dom_text.is_empty() =>
            {
                span_of(parent)?.inner_start()
            }
            (_, Right::Node(node)) => span_of(node)?.start,
            (_, Right::ParentEnd(parent)) => span_of(parent)?.inner_end(),
        };
        (start <= end).then_some(start..end)
    }

    /// Add a boundary to the pending separator.
    pub(crate) fn add_boundary(&mut self, left: Left, right: Right, dom_text: &str) {
        let constraint = self.boundary_constraint(left, right);
        let span = self.boundary_span(left, right, dom_text);
        let single_line = self.single_line_active();
        tracing::trace!(
            ?left,
            ?right,
            min = constraint.min,
            max = ?constraint.max,
            single_line,
            "Separator boundary"
        );

        match &mut self.pending {
            Some(pending) => {
                pending.constraint = pending.constraint.merge(constraint);
                pending.span = match (pending.span.take(), span) {
                    (Some(a), Some(b)) if a.end == b.start => Some(a.start..b.end),
                    _ => None,
                };
                pending.dom_text.push_str(dom_text);
                pending.single_line &= single_line;
            }
            None => {
                self.pending = Some(PendingSeparator {
                    constraint,
                    span,
                    dom_text: dom_text.to_owned(),
                    single_line,
                });
            }
        }
    }

    /// Resolve and write the pending separator, if any.
    pub(crate) fn flush_separator(&mut self) -> Result<(), SerializeError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let emitted = self.output().trailing_newlines();
        let range = if pending.single_line {
            pending.constraint.cap(0)
        } else {
            pending.constraint
        }
        .effective()
        .after_emitted(u32::try_from(emitted).unwrap_or(u32::MAX));

        let original = pending
            .span
            .and_then(|span| self.source_range(span.start, span.end))
            .filter(|text| is_whitespace(text) && range.allows(count_newlines(text)));

        let text = if let Some(original) = original {
            tracing::trace!(bytes = original.len(), "Separator reused from source");
            original.to_owned()
        } else if range.allows(count_newlines(&pending.dom_text)) {
            tracing::trace!(bytes = pending.dom_text.len(), "Separator reused from tree");
            pending.dom_text
        } else if range.min == 0 {
            NEWLINE_RUN.replace_all(&pending.dom_text, " ").into_owned()
        } else {
            "\n".repeat(range.min as usize)
        };

        let newlines = count_newlines(&text);
        if !range.allows(newlines) {
            return Err(SerializeError::SeparatorRangeUnsatisfiable {
                min: range.min,
                max: range.max,
                newlines,
            });
        }
        tracing::trace!(
            min = range.min,
            max = ?range.max,
            emitted,
            newlines,
            "Separator resolved"
        );
        self.emit_separator(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;
    use wt_config::SerializerConfig;
    use wt_dom::{Document, Element, NodeMeta, SourceRange};

    struct Fixture {
        doc: Document,
        a: NodeId,
        b: NodeId,
    }

    /// Two paragraphs `a` and `b` separated by `sep` in the source.
    fn paragraphs(sep: &str) -> Fixture {
        let source = format!("a{sep}b");
        let b_start = 1 + sep.len();
        let mut doc = Document::new().with_source(source);
        let root = doc.root();
        let a = doc.append_element(
            root,
            Element::new("p").with_meta(NodeMeta::with_dsr(SourceRange::plain(0, 1))),
        );
        doc.append_text(a, "a");
        let b = doc.append_element(
            root,
            Element::new("p").with_meta(NodeMeta::with_dsr(SourceRange::plain(
                b_start,
                b_start + 1,
            ))),
        );
        doc.append_text(b, "b");
        doc.record_shapes();
        Fixture { doc, a, b }
    }

    fn resolve(fixture: &Fixture, dom_text: &str) -> String {
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        ctx.add_boundary(
            Left::Node {
                node: fixture.a,
                last: fixture.a,
            },
            Right::Node(fixture.b),
            dom_text,
        );
        ctx.flush_separator().unwrap();
        ctx.output().text()
    }

    #[test]
    fn test_original_separator_is_reused() {
        let fixture = paragraphs("\n\n");
        assert_eq!(resolve(&fixture, ""), "\n\n");
    }

    #[test]
    fn test_out_of_range_original_is_replaced() {
        // Paragraphs need exactly two newlines.
        let fixture = paragraphs("\n");
        assert_eq!(resolve(&fixture, ""), "\n\n");
    }

    #[test]
    fn test_modified_side_uses_tree_text() {
        let mut fixture = paragraphs("\n\n");
        fixture
            .doc
            .element_mut(fixture.b)
            .unwrap()
            .attrs
            .set("class", "x");
        assert_eq!(resolve(&fixture, "\n\n"), "\n\n");
        assert_eq!(resolve(&fixture, "\n"), "\n\n");
    }

    #[test]
    fn test_pending_boundaries_merge() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        let root = fixture.doc.root();
        let a = fixture.a;

        ctx.add_boundary(Left::Node { node: a, last: a }, Right::ParentEnd(root), "");
        let first = ctx.pending.clone().unwrap();
        assert_eq!(first.constraint, SeparatorConstraint::none());

        ctx.add_boundary(Left::Node { node: a, last: a }, Right::Node(fixture.b), "");
        let merged = ctx.pending.clone().unwrap();
        assert_eq!(merged.constraint, SeparatorConstraint::exactly(2));
        // The first span runs to the root's end, so the two are not contiguous.
        assert_eq!(merged.span, None);
    }

    #[test]
    fn test_single_line_collapses_newlines() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        let mut scoped = ctx.enter(crate::ContextEntry::SingleLine(true));
        scoped.add_boundary(Left::ParentStart(fixture.a), Right::ParentEnd(fixture.a), " \n ");
        scoped.flush_separator().unwrap();
        assert_eq!(scoped.output().text(), "   ");
    }

    #[test]
    fn test_single_line_min_still_wins() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        let mut scoped = ctx.enter(crate::ContextEntry::SingleLine(true));
        let (a, b) = (fixture.a, fixture.b);
        scoped.add_boundary(Left::Node { node: a, last: a }, Right::Node(b), "");
        scoped.flush_separator().unwrap();
        assert_eq!(scoped.output().text(), "\n\n");
    }

    #[test]
    fn test_boundary_outside_single_line_lifts_cap() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        {
            let mut scoped = ctx.enter(crate::ContextEntry::SingleLine(true));
            scoped.add_boundary(Left::ParentStart(fixture.a), Right::ParentEnd(fixture.a), "");
            assert!(scoped.pending.as_ref().is_some_and(|p| p.single_line));
        }
        ctx.add_boundary(Left::ParentStart(fixture.b), Right::ParentEnd(fixture.b), "\n");
        assert!(ctx.pending.as_ref().is_some_and(|p| !p.single_line));
        ctx.flush_separator().unwrap();
        assert_eq!(ctx.output().text(), "\n");
    }

    #[test]
    fn test_text_child_maps_to_parent_edge() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        let a = fixture.a;
        let text = fixture.doc.first_child(a).unwrap();

        let span = ctx.boundary_span(Left::ParentStart(a), Right::Node(text), "");
        assert_eq!(span, Some(0..0));
        let span = ctx.boundary_span(Left::Node { node: text, last: text }, Right::ParentEnd(a), "");
        assert_eq!(span, Some(1..1));
        let span = ctx.boundary_span(Left::ParentStart(a), Right::Node(text), " ");
        assert_eq!(span, None);
    }

    #[test]
    fn test_emitted_newlines_count_toward_range() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        let (a, b) = (fixture.a, fixture.b);
        ctx.emit("a\n", a).unwrap();
        ctx.add_boundary(Left::Node { node: a, last: a }, Right::Node(b), "");
        ctx.flush_separator().unwrap();
        ctx.emit("b", b).unwrap();
        assert_eq!(ctx.output().text(), "a\n\nb");
    }

    #[test]
    fn test_empty_pending_flush_is_noop() {
        let fixture = paragraphs("\n\n");
        let registry = HandlerRegistry::with_defaults();
        let config = SerializerConfig::default();
        let mut ctx = GenerationContext::new(&fixture.doc, &registry, &config);
        ctx.flush_separator().unwrap();
        assert!(ctx.output().chunks().is_empty());
    }
}
