//! Section headings.

use wt_dom::NodeId;

use super::{NodeHandler, Resume, leading_space, trailing_space};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;
use crate::escape::escape_heading;

/// `h1`..`h6`: `== content ==`, on one line.
pub struct HeadingHandler;

fn level(ctx: &GenerationContext<'_>, node: NodeId) -> Result<usize, SerializeError> {
    let name = ctx.doc().name(node).unwrap_or_default();
    name.strip_prefix('h')
        .and_then(|digits| digits.parse().ok())
        .filter(|level| (1..=6).contains(level))
        .ok_or_else(|| SerializeError::structural(node, name, "not a heading level"))
}

impl NodeHandler for HeadingHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let marks = "=".repeat(level(ctx, node)?);
        ctx.emit(&marks, node)?;
        ctx.emit(leading_space(ctx, node, wrapper_unmodified), node)?;
        ctx.serialize_children(node, Some(escape_heading))?;
        ctx.emit(trailing_space(ctx, node, wrapper_unmodified), node)?;
        ctx.emit(&marks, node)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let min = u32::from(ctx.doc().parent(node) != Some(other));
        SeparatorConstraint::range(min, ctx.config().max_newlines)
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        self.before(node, other, ctx)
    }

    fn first_child(&self, _node: NodeId, _child: NodeId, _ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        SeparatorConstraint::exactly(0)
    }

    fn last_child(&self, _node: NodeId, _child: NodeId, _ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        SeparatorConstraint::exactly(0)
    }

    fn uses_single_line_context(&self) -> bool {
        true
    }
}
