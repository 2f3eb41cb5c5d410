//! Table captions.

use wt_dom::NodeId;

use super::{
    NodeHandler, Resume, attributes_string, first_rendered_child, max_newlines_in_table,
    original_open,
};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::GenerationContext;

/// Table caption: `|+ text`.
pub struct CaptionHandler;

impl NodeHandler for CaptionHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let doc = ctx.doc();
        let Some(element) = doc.element(node) else {
            return Ok(Resume::Next);
        };
        let Some(table) = doc.parent(node).filter(|&p| doc.is_element_named(p, "table")) else {
            return Err(SerializeError::structural(node, "caption", "caption outside of a table"));
        };
        if first_rendered_child(doc, table) != Some(node) {
            return Err(SerializeError::structural(
                node,
                "caption",
                "caption is not the first child of its table",
            ));
        }

        if let Some(open) = original_open(ctx, node, wrapper_unmodified) {
            ctx.emit(open, node)?;
        } else {
            let mut open = element
                .meta
                .start_tag_src
                .clone()
                .unwrap_or_else(|| "|+".to_owned());
            if !element.attrs.is_empty() {
                open.push_str(&attributes_string(element));
                open.push_str(" |");
            }
            ctx.emit(&open, node)?;
        }
        ctx.serialize_children(node, None)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let min = u32::from(!ctx.doc().is_element_named(other, "table"));
        SeparatorConstraint::range(min, max_newlines_in_table(ctx, node))
    }

    fn after(&self, node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        SeparatorConstraint::range(1, max_newlines_in_table(ctx, node))
    }
}
