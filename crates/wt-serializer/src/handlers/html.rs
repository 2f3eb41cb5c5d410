//! Literal HTML tags kept in wikitext.

use wt_dom::{NodeId, VOID_ELEMENTS};

use super::{NodeHandler, Resume, attributes_string, original_close, original_open};
use crate::SerializeError;
use crate::context::GenerationContext;

/// Elements written as HTML tags inside wikitext.
///
/// Tags the forward pipeline inserted on its own are not written back.
pub struct LiteralHtmlHandler;

impl NodeHandler for LiteralHtmlHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let Some(element) = ctx.doc().element(node) else {
            return Ok(Resume::Next);
        };
        let name = element.name.as_str();

        if !element.meta.auto_inserted_start {
            match original_open(ctx, node, wrapper_unmodified) {
                Some(open) => ctx.emit(open, node)?,
                None => ctx.emit(&format!("<{name}{}>", attributes_string(element)), node)?,
            }
        }
        ctx.serialize_children(node, None)?;
        if VOID_ELEMENTS.contains(&name) || element.meta.auto_inserted_end {
            return Ok(Resume::Next);
        }
        match original_close(ctx, node, wrapper_unmodified) {
            Some(close) => ctx.emit(close, node)?,
            None => ctx.emit(&format!("</{name}>"), node)?,
        }
        Ok(Resume::Next)
    }
}
