//! Bold and italic quotes.

use wt_dom::NodeId;

use super::{NodeHandler, Resume};
use crate::SerializeError;
use crate::context::GenerationContext;

/// `b` and `i`: `'''bold'''`, `''italic''`.
pub struct QuoteHandler;

impl NodeHandler for QuoteHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let quotes = if ctx.doc().is_element_named(node, "b") {
            "'''"
        } else {
            "''"
        };
        ctx.emit(quotes, node)?;
        ctx.serialize_children(node, None)?;
        ctx.emit(quotes, node)?;
        Ok(Resume::Next)
    }
}
