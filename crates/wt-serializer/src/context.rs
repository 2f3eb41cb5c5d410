//! Per-call generation state.
//!
//! A [`GenerationContext`] lives for exactly one generation pass. It owns the
//! output chunks, the scoped-context stack, the pending separator and the
//! lossy-fallback notes. The document is only ever borrowed.

use std::ops::{Deref, DerefMut};

use wt_config::SerializerConfig;
use wt_dom::{Document, Element, NodeId, ShapeIndex, SourceRange};

use crate::LossyNote;
use crate::handlers::HandlerRegistry;
use crate::separator::PendingSeparator;

/// One piece of emitted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Emitted text.
    pub text: String,
    /// Node that produced it (`None` for separators).
    pub origin: Option<NodeId>,
}

/// Ordered, append-only chunk sequence.
#[derive(Debug, Default)]
pub struct Output {
    chunks: Vec<Chunk>,
}

impl Output {
    fn push(&mut self, text: String, origin: Option<NodeId>) {
        self.chunks.push(Chunk { text, origin });
    }

    /// Emitted chunks in order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Last emitted character.
    #[must_use]
    pub fn last_char(&self) -> Option<char> {
        self.chunks
            .iter()
            .rev()
            .find_map(|chunk| chunk.text.chars().next_back())
    }

    /// Newlines the output already ends with, counted across chunks.
    #[must_use]
    pub fn trailing_newlines(&self) -> usize {
        let mut count = 0;
        for chunk in self.chunks.iter().rev() {
            let run = chunk.text.bytes().rev().take_while(|&b| b == b'\n').count();
            count += run;
            if run < chunk.text.len() {
                break;
            }
        }
        count
    }

    /// Concatenate all chunks.
    #[must_use]
    pub fn text(&self) -> String {
        let len = self.chunks.iter().map(|chunk| chunk.text.len()).sum();
        let mut text = String::with_capacity(len);
        for chunk in &self.chunks {
            text.push_str(&chunk.text);
        }
        text
    }
}

/// Entry on the scoped-context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEntry {
    /// Single-line mode switched on or off for descendants.
    SingleLine(bool),
    /// Inside a wikitext list.
    List,
    /// Inside a wikitext table.
    Table,
}

/// Saved position to roll back to when a node falls back to its source.
#[derive(Debug)]
pub(crate) struct Checkpoint {
    chunks: usize,
    notes: usize,
    pending: Option<PendingSeparator>,
}

/// Mutable state of one generation pass.
pub struct GenerationContext<'a> {
    doc: &'a Document,
    source: Option<&'a str>,
    pub(crate) registry: &'a HandlerRegistry,
    config: &'a SerializerConfig,
    shapes: ShapeIndex,
    out: Output,
    pub(crate) stack: Vec<ContextEntry>,
    notes: Vec<LossyNote>,
    imbalance: Option<(usize, usize)>,
    pub(crate) pending: Option<PendingSeparator>,
}

impl<'a> GenerationContext<'a> {
    /// Create a fresh context for one pass over `doc`.
    #[must_use]
    pub fn new(
        doc: &'a Document,
        registry: &'a HandlerRegistry,
        config: &'a SerializerConfig,
    ) -> Self {
        Self {
            doc,
            source: doc.source(),
            registry,
            config,
            shapes: ShapeIndex::compute(doc),
            out: Output::default(),
            stack: Vec::new(),
            notes: Vec::new(),
            imbalance: None,
            pending: None,
        }
    }

    /// Document being serialized.
    #[must_use]
    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    /// Original source text, if attached.
    #[must_use]
    pub fn source(&self) -> Option<&'a str> {
        self.source
    }

    /// Serializer configuration.
    #[must_use]
    pub fn config(&self) -> &'a SerializerConfig {
        self.config
    }

    /// Output emitted so far.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.out
    }

    /// Lossy-fallback notes recorded so far.
    #[must_use]
    pub fn notes(&self) -> &[LossyNote] {
        &self.notes
    }

    /// Emit text produced by `node`, flushing the pending separator first.
    ///
    /// Empty text is ignored and leaves the separator pending.
    pub fn emit(&mut self, text: &str, node: NodeId) -> Result<(), crate::SerializeError> {
        if text.is_empty() {
            return Ok(());
        }
        self.flush_separator()?;
        self.out.push(text.to_owned(), Some(node));
        Ok(())
    }

    pub(crate) fn emit_separator(&mut self, text: String) {
        if !text.is_empty() {
            self.out.push(text, None);
        }
    }

    /// Record a lossy-fallback note for `node`.
    pub fn record_note(&mut self, node: NodeId, reason: impl Into<String>) {
        let kind = self.doc.name(node).unwrap_or("#text").to_owned();
        let reason = reason.into();
        tracing::warn!(node = %node, kind = %kind, reason = %reason, "Lossy fallback");
        self.notes.push(LossyNote { node, kind, reason });
    }

    /// Push a scoped-context entry; it is popped when the guard drops.
    pub fn enter(&mut self, entry: ContextEntry) -> ScopedContext<'_, 'a> {
        let depth = self.stack.len();
        self.stack.push(entry);
        ScopedContext {
            ctx: self,
            entry,
            depth,
        }
    }

    /// Current depth of the scoped-context stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether descendants must not emit bare newlines.
    #[must_use]
    pub fn single_line_active(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find_map(|entry| match entry {
                ContextEntry::SingleLine(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Number of enclosing wikitext lists.
    #[must_use]
    pub fn list_depth(&self) -> usize {
        self.count(ContextEntry::List)
    }

    /// Number of enclosing wikitext tables.
    #[must_use]
    pub fn table_depth(&self) -> usize {
        self.count(ContextEntry::Table)
    }

    fn count(&self, entry: ContextEntry) -> usize {
        self.stack.iter().filter(|&&e| e == entry).count()
    }

    /// Whether the output so far ends a line.
    #[must_use]
    pub fn at_start_of_line(&self) -> bool {
        self.out.last_char().is_none_or(|c| c == '\n')
    }

    /// Whether the element's tag and attributes match its recorded shape.
    ///
    /// Always false when selective serialization is off or the source span
    /// cannot be read.
    #[must_use]
    pub fn wrapper_unmodified(&self, node: NodeId) -> bool {
        self.unmodified(node, |recorded, current| recorded.wrapper == current.wrapper)
    }

    /// Whether the element and everything under it match the recorded shape.
    #[must_use]
    pub fn subtree_unmodified(&self, node: NodeId) -> bool {
        self.unmodified(node, |recorded, current| {
            recorded.wrapper == current.wrapper && recorded.subtree == current.subtree
        })
    }

    fn unmodified(
        &self,
        node: NodeId,
        same: impl Fn(&wt_dom::Shape, &wt_dom::Shape) -> bool,
    ) -> bool {
        if !self.config.selective {
            return false;
        }
        let Some(element) = self.doc.element(node) else {
            return false;
        };
        let (Some(recorded), Some(current)) = (&element.meta.shape, self.shapes.get(node)) else {
            return false;
        };
        same(recorded, current) && self.span(element).is_some()
    }

    /// Source span of an element, if it fits the attached source.
    #[must_use]
    pub fn span(&self, element: &Element) -> Option<SourceRange> {
        let source = self.source?;
        element.meta.dsr.filter(|range| range.fits(source.len()))
    }

    /// Original source text of a node.
    #[must_use]
    pub fn source_slice(&self, node: NodeId) -> Option<&'a str> {
        let range = self.span(self.doc.element(node)?)?;
        self.source_range(range.start, range.end)
    }

    /// Original source text between two offsets.
    #[must_use]
    pub fn source_range(&self, start: usize, end: usize) -> Option<&'a str> {
        self.source?.get(start..end)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            chunks: self.out.chunks.len(),
            notes: self.notes.len(),
            pending: self.pending.clone(),
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.out.chunks.truncate(checkpoint.chunks);
        self.notes.truncate(checkpoint.notes);
        self.pending = checkpoint.pending;
    }

    /// Take a recorded guard imbalance, if any.
    pub(crate) fn take_imbalance(&mut self) -> Option<(usize, usize)> {
        self.imbalance.take()
    }

    pub(crate) fn into_parts(self) -> (Output, Vec<LossyNote>) {
        (self.out, self.notes)
    }

    pub(crate) fn take_notes(&mut self) -> Vec<LossyNote> {
        std::mem::take(&mut self.notes)
    }
}

/// Guard for one scoped-context entry.
///
/// Dereferences to the context, so handlers keep working through it. The
/// entry is popped on every exit path when the guard drops.
pub struct ScopedContext<'c, 'a> {
    ctx: &'c mut GenerationContext<'a>,
    entry: ContextEntry,
    depth: usize,
}

impl<'a> Deref for ScopedContext<'_, 'a> {
    type Target = GenerationContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ScopedContext<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ScopedContext<'_, '_> {
    fn drop(&mut self) {
        let expected = self.depth + 1;
        let actual = self.ctx.stack.len();
        if actual != expected || self.ctx.stack.last() != Some(&self.entry) {
            tracing::debug!(expected, actual, "Scoped context popped out of order");
            self.ctx.imbalance.get_or_insert((expected, actual));
        }
        self.ctx.stack.truncate(self.depth);
    }
}
