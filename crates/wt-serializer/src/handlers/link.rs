//! Wiki links and external links.

use wt_dom::{NodeId, Syntax};

use super::{NodeHandler, Resume};
use crate::SerializeError;
use crate::context::GenerationContext;

/// `rel` value marking a link to another page.
const WIKI_LINK_REL: &str = "mw:WikiLink";

/// Links: `[[Target|text]]`, `[https://example.org text]` or a bare URL.
pub struct LinkHandler;

/// Page title from a wiki link `href` (`./Main_Page` -> `Main Page`).
fn link_target(href: &str) -> String {
    href.strip_prefix("./").unwrap_or(href).replace('_', " ")
}

impl NodeHandler for LinkHandler {
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
        let href = element
            .attr("href")
            .ok_or_else(|| SerializeError::structural(node, "a", "link without href"))?;
        let has_content = !doc.children(node).is_empty();

        if element.attr("rel") == Some(WIKI_LINK_REL) {
            let target = link_target(href);
            let piped = element.meta.stx == Some(Syntax::Piped)
                || (has_content && doc.text_content(node) != target);
            if piped {
                ctx.emit(&format!("[[{target}|"), node)?;
                ctx.serialize_children(node, None)?;
                ctx.emit("]]", node)?;
            } else {
                ctx.emit(&format!("[[{target}]]"), node)?;
            }
            return Ok(Resume::Next);
        }

        if element.meta.stx == Some(Syntax::Simple) {
            ctx.emit(href, node)?;
            return Ok(Resume::Next);
        }
        ctx.emit(&format!("[{href}"), node)?;
        if has_content {
            ctx.emit(" ", node)?;
            ctx.serialize_children(node, None)?;
        }
        ctx.emit("]", node)?;
        Ok(Resume::Next)
    }
}
