//! Tree walker.
//!
//! Visits a parent's children in document order, alternating separators and
//! nodes:
//!
//! ```text
//! Descend -> (EmitSeparator -> EmitNode)* -> EmitSeparator -> Ascend -> Done
//! ```
//!
//! Whitespace-only text between children is separator text: it never reaches
//! the output directly, only through the separator resolver.

use wt_config::UnknownElementPolicy;
use wt_dom::{NodeId, NodeKind};

use crate::SerializeError;
use crate::context::{ContextEntry, GenerationContext};
use crate::escape::{TextHook, TextPosition, escape_wikitext};
use crate::handlers::Resume;
use crate::separator::{Left, Right};

#[derive(Debug, Clone, Copy)]
enum WalkState {
    Descend,
    EmitSeparator,
    EmitNode(NodeId),
    Ascend,
    Done,
}

impl<'a> GenerationContext<'a> {
    /// Serialize the children of `parent`, including the separators between
    /// them and at both edges.
    ///
    /// Text children go through `hook` when given, the default escaper
    /// otherwise.
    pub fn serialize_children(
        &mut self,
        parent: NodeId,
        hook: Option<TextHook>,
    ) -> Result<(), SerializeError> {
        let doc = self.doc();
        let children = doc.children(parent);
        let keep_whitespace = doc.is_element_named(parent, "pre");
        let is_separator_text = |id: NodeId| {
            !keep_whitespace && doc.text(id).is_some_and(|text| text.trim().is_empty())
        };

        let mut left = Left::ParentStart(parent);
        let mut index = 0;
        let mut state = WalkState::Descend;
        loop {
            state = match state {
                WalkState::Descend => {
                    tracing::trace!(parent = %parent, children = children.len(), "Descend");
                    WalkState::EmitSeparator
                }
                WalkState::EmitSeparator => {
                    let mut dom_text = String::new();
                    while let Some(&child) = children.get(index)
                        && is_separator_text(child)
                    {
                        dom_text.push_str(doc.text(child).unwrap_or_default());
                        index += 1;
                    }
                    match children.get(index) {
                        Some(&next) => {
                            self.add_boundary(left, Right::Node(next), &dom_text);
                            WalkState::EmitNode(next)
                        }
                        None => {
                            self.add_boundary(left, Right::ParentEnd(parent), &dom_text);
                            WalkState::Ascend
                        }
                    }
                }
                WalkState::EmitNode(node) => {
                    let last = match doc.node(node) {
                        NodeKind::Text(text) => {
                            let pos = TextPosition {
                                at_line_start: false,
                                first: children[..index].iter().all(|&c| is_separator_text(c)),
                                last: children[index + 1..]
                                    .iter()
                                    .all(|&c| is_separator_text(c)),
                                in_table: self.table_depth() > 0,
                            };
                            self.serialize_text(node, text, pos, hook)?;
                            node
                        }
                        NodeKind::Comment(comment) => {
                            self.emit(&format!("<!--{comment}-->"), node)?;
                            node
                        }
                        NodeKind::Element(_) => self.serialize_element(node)?,
                    };
                    index = children
                        .iter()
                        .position(|&c| c == last)
                        .map_or(children.len(), |i| i + 1);
                    left = Left::Node { node, last };
                    WalkState::EmitSeparator
                }
                WalkState::Ascend => {
                    tracing::trace!(parent = %parent, "Ascend");
                    WalkState::Done
                }
                WalkState::Done => break,
            };
        }
        Ok(())
    }

    fn serialize_text(
        &mut self,
        node: NodeId,
        text: &str,
        mut pos: TextPosition,
        hook: Option<TextHook>,
    ) -> Result<(), SerializeError> {
        self.flush_separator()?;
        pos.at_line_start = self.at_start_of_line();
        let escaped = hook.unwrap_or(escape_wikitext)(text, pos);
        if self.single_line_active() && escaped.contains('\n') {
            self.emit(&escaped.replace('\n', " "), node)
        } else {
            self.emit(&escaped, node)
        }
    }

    /// Serialize one element, falling back to its original source when it
    /// cannot be generated.
    ///
    /// Returns the last sibling consumed (the element itself unless its
    /// handler swallowed following siblings).
    pub(crate) fn serialize_element(&mut self, node: NodeId) -> Result<NodeId, SerializeError> {
        let checkpoint = self.checkpoint();
        match self.dispatch_element(node) {
            Ok(last) => Ok(last),
            Err(err) if err.node() == Some(node) => {
                if let Some((expected, actual)) = self.take_imbalance() {
                    return Err(SerializeError::ContextStackImbalance { expected, actual });
                }
                let Some(slice) = self.source_slice(node) else {
                    return Err(err);
                };
                self.rollback(checkpoint);
                self.emit(slice, node)?;
                self.record_note(node, err.to_string());
                Ok(node)
            }
            Err(err) => Err(err),
        }
    }

    fn dispatch_element(&mut self, node: NodeId) -> Result<NodeId, SerializeError> {
        let doc = self.doc();
        let Some(element) = doc.element(node) else {
            return Err(SerializeError::structural(node, "#text", "expected an element"));
        };

        if element.meta.data.is_none()
            && self.subtree_unmodified(node)
            && self.subtree_has_handlers(node)
            && let Some(slice) = self.source_slice(node)
        {
            tracing::trace!(node = %node, kind = %element.name, "Subtree reused from source");
            self.emit(slice, node)?;
            return Ok(node);
        }

        let registry = self.registry;
        let Some(handler) = registry.resolve(element) else {
            return self.handle_unknown(node);
        };

        let wrapper_unmodified = self.wrapper_unmodified(node);
        let depth = self.depth();
        let result = if handler.uses_single_line_context() {
            let mut scoped = self.enter(ContextEntry::SingleLine(true));
            handler.handle(node, &mut scoped, wrapper_unmodified)
        } else {
            handler.handle(node, self, wrapper_unmodified)
        };
        self.check_balance(depth)?;

        match result? {
            Resume::Next => Ok(node),
            Resume::After(last) => {
                let mut sibling = doc.next_sibling(node);
                while let Some(current) = sibling {
                    if current == last {
                        return Ok(last);
                    }
                    sibling = doc.next_sibling(current);
                }
                Err(SerializeError::structural(
                    node,
                    &element.name,
                    format!("handler resumed at {last}, which is not a later sibling"),
                ))
            }
        }
    }

    /// Whether every element under `node` (itself included) has a handler.
    /// Unknown kinds must reach [`Self::handle_unknown`] to be noted.
    fn subtree_has_handlers(&self, node: NodeId) -> bool {
        let doc = self.doc();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(element) = doc.element(current) {
                if self.registry.resolve(element).is_none() {
                    return false;
                }
                stack.extend_from_slice(doc.children(current));
            }
        }
        true
    }

    /// Element with no handler: unwrap it when allowed and no source is
    /// available, otherwise raise for the fallback to handle.
    fn handle_unknown(&mut self, node: NodeId) -> Result<NodeId, SerializeError> {
        let kind = self.doc().name(node).unwrap_or_default().to_owned();
        if self.config().unknown_elements == UnknownElementPolicy::Unwrap
            && self.source_slice(node).is_none()
        {
            self.record_note(node, format!("no handler for <{kind}>; wrapper dropped"));
            self.serialize_children(node, None)?;
            return Ok(node);
        }
        Err(SerializeError::UnknownElementKind { node, kind })
    }

    /// Fail when a handler left the scoped-context stack unbalanced.
    pub(crate) fn check_balance(&mut self, depth: usize) -> Result<(), SerializeError> {
        if let Some((expected, actual)) = self.take_imbalance() {
            return Err(SerializeError::ContextStackImbalance { expected, actual });
        }
        if self.depth() != depth {
            return Err(SerializeError::ContextStackImbalance {
                expected: depth,
                actual: self.depth(),
            });
        }
        Ok(())
    }
}
