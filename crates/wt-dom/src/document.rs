//! Arena-backed document tree.
//!
//! Parents own their children through ordered [`NodeId`] lists. The parent link
//! stored on each node is a lookup key only; nothing is ever freed through it.
//! Detached nodes stay in the arena but are unreachable from the root.

use crate::meta::SourceRange;
use crate::node::{Element, NodeId, NodeKind};
use crate::shape::ShapeIndex;

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Decorated document tree with an optional copy of its original source.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    source: Option<String>,
}

impl Document {
    /// Create a document with an empty `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Element::new("body"))
    }

    /// Create a document with the given root element.
    #[must_use]
    pub fn with_root(root: Element) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Element(root),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId::from_index(0),
            source: None,
        }
    }

    /// Root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Original source text, if attached.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Attach the original source text.
    ///
    /// A root without a span is given one covering the whole source.
    pub fn set_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        let len = source.len();
        let root = self.root;
        if let Some(element) = self.element_mut(root)
            && element.meta.dsr.is_none()
        {
            element.meta.dsr = Some(SourceRange::plain(0, len));
        }
        self.source = Some(source);
    }

    /// Builder form of [`set_source`](Self::set_source).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.set_source(source);
        self
    }

    /// Number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds only the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Node payload.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Node payload, or `None` for a foreign id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|data| &data.kind)
    }

    /// Element payload, if `id` is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id).and_then(NodeKind::as_element)
    }

    /// Mutable element payload.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.index()).map(|data| &mut data.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Text content, if `id` is a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(NodeKind::as_text)
    }

    /// Tag name, if `id` is an element.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.name.as_str())
    }

    /// Whether `id` is an element with the given tag name.
    #[must_use]
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Whether `id` is an element whose tag is one of `names`.
    #[must_use]
    pub fn is_element_in(&self, id: NodeId, names: &[&str]) -> bool {
        self.name(id).is_some_and(|name| names.contains(&name))
    }

    /// Parent of `id` (`None` for the root and detached nodes).
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|data| data.parent)
    }

    /// Ordered children of `id`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |data| data.children.as_slice())
    }

    /// First child of `id`.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last child of `id`.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Following sibling of `id`.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&sibling| sibling == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Preceding sibling of `id`.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&sibling| sibling == id)?;
        pos.checked_sub(1).map(|prev| siblings[prev])
    }

    /// Ancestors of `id`, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    /// Concatenated text of `id` and all its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Element(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Append an element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.append(parent, NodeKind::Element(element))
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Text(text.into()))
    }

    /// Append a comment as the last child of `parent`.
    pub fn append_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Comment(text.into()))
    }

    /// Append any node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind, Some(parent));
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Insert a node immediately before `reference`.
    ///
    /// Returns `None` when `reference` is detached or the root.
    pub fn insert_before(&mut self, reference: NodeId, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent(reference)?;
        let pos = self
            .children(parent)
            .iter()
            .position(|&sibling| sibling == reference)?;
        let id = self.alloc(kind, Some(parent));
        self.nodes[parent.index()].children.insert(pos, id);
        Some(id)
    }

    /// Detach `id` (and its subtree) from its parent.
    ///
    /// Returns `false` if the node was already detached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        self.nodes[parent.index()]
            .children
            .retain(|&child| child != id);
        self.nodes[id.index()].parent = None;
        true
    }

    /// Replace the content of a text or comment node.
    ///
    /// Returns `false` if `id` is an element.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match self.nodes.get_mut(id.index()).map(|data| &mut data.kind) {
            Some(NodeKind::Text(content) | NodeKind::Comment(content)) => {
                *content = text.into();
                true
            }
            _ => false,
        }
    }

    /// Stamp every element that has a source span with its current shape.
    ///
    /// The forward pipeline calls this once the tree mirrors the source; any
    /// later edit makes the affected elements' current shape diverge.
    pub fn record_shapes(&mut self) {
        let index = ShapeIndex::compute(self);
        for position in 0..self.nodes.len() {
            let id = NodeId::from_index(position);
            let shape = index.get(id).cloned();
            if let Some(element) = self.element_mut(id)
                && element.meta.dsr.is_some()
            {
                element.meta.shape = shape;
            }
        }
    }

    /// Make a detached or nested element the document root.
    pub(crate) fn promote_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    /// Mutable text of a text node.
    pub(crate) fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.nodes.get_mut(id.index()).map(|data| &mut data.kind) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
