//! Preformatted text, rules and line breaks.

use wt_dom::NodeId;

use super::{NodeHandler, Resume};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;
use crate::escape::indent_pre;

/// Indent-preformatted block: every line starts with a space.
pub struct PreHandler;

/// Horizontal rule: `----`.
pub struct HrHandler;

/// Line break.
pub struct BrHandler;

/// `[0, max]` against the parent, `[1, max]` against a sibling.
fn block(node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
    let min = u32::from(ctx.doc().parent(node) != Some(other));
    SeparatorConstraint::range(min, ctx.config().max_newlines)
}

impl NodeHandler for PreHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        ctx.emit(" ", node)?;
        ctx.serialize_children(node, Some(indent_pre))?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        block(node, other, ctx)
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        block(node, other, ctx)
    }
}

impl NodeHandler for HrHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        ctx.emit("----", node)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        block(node, other, ctx)
    }

    fn after(&self, _node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        SeparatorConstraint::range(0, ctx.config().max_newlines)
    }
}

impl NodeHandler for BrHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let tag = ctx
            .doc()
            .element(node)
            .and_then(|e| e.meta.start_tag_src.as_deref())
            .unwrap_or("<br>");
        ctx.emit(tag, node)?;
        Ok(Resume::Next)
    }
}
