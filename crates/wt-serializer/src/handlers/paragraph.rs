//! Paragraphs.

use wt_dom::NodeId;

use super::{NodeHandler, Resume};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;

/// Paragraphs: content only, separated from each other by a blank line.
pub struct ParagraphHandler;

fn around(node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
    let doc = ctx.doc();
    if doc.parent(node) == Some(other) {
        SeparatorConstraint::none()
    } else if doc.is_element_named(other, "p") {
        SeparatorConstraint::exactly(2)
    } else {
        SeparatorConstraint::range(1, ctx.config().max_newlines)
    }
}

impl NodeHandler for ParagraphHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        ctx.serialize_children(node, None)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        around(node, other, ctx)
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        around(node, other, ctx)
    }
}
