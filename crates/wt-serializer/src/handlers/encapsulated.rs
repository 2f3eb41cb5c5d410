//! Extension output written back from its stored source.

use serde_json::Value;
use wt_dom::NodeId;

use super::{NodeHandler, Resume, is_separator_node};
use crate::SerializeError;
use crate::context::GenerationContext;

/// Content generated by an extension (templates, tags), written back from
/// the source string stored in its extension data.
///
/// Output spread over several sibling elements shares one `about` id; the
/// whole run is written once.
pub struct EncapsulatedHandler;

impl NodeHandler for EncapsulatedHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let doc = ctx.doc();
        let Some(element) = doc.element(node) else {
            return Ok(Resume::Next);
        };

        let src = element
            .meta
            .data
            .as_ref()
            .and_then(|data| data.get("src"))
            .and_then(Value::as_str);
        if let Some(src) = src {
            ctx.emit(src, node)?;
        } else if let Some(slice) = ctx.source_slice(node) {
            ctx.emit(slice, node)?;
            ctx.record_note(node, "extension data has no source string; original source reused");
        } else {
            return Err(SerializeError::structural(
                node,
                &element.name,
                "extension data has no source string and no source span",
            ));
        }

        let Some(about) = element.attr("about") else {
            return Ok(Resume::Next);
        };
        let mut last = node;
        let mut sibling = doc.next_sibling(node);
        while let Some(current) = sibling {
            match doc.element(current) {
                Some(next) if next.attr("about") == Some(about) => last = current,
                None if is_separator_node(doc, current) => {}
                _ => break,
            }
            sibling = doc.next_sibling(current);
        }
        if last == node {
            Ok(Resume::Next)
        } else {
            tracing::trace!(node = %node, last = %last, about, "Consumed about-sibling run");
            Ok(Resume::After(last))
        }
    }
}
