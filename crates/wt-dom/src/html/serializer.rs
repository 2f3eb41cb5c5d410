//! Annotated HTML writer.

use super::{EXTENSION_ATTR, META_ATTR, VOID_ELEMENTS};
use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKind};

/// Write a document as annotated HTML, root element included.
///
/// Output read back with [`parse_html`](super::parse_html) yields an
/// equivalent document.
///
/// # Errors
///
/// Returns an error if element metadata cannot be encoded as JSON.
pub fn to_html(doc: &Document) -> Result<String, DomError> {
    let mut out = String::with_capacity(doc.len() * 16);
    write_node(doc, doc.root(), &mut out)?;
    Ok(out)
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) -> Result<(), DomError> {
    let element = match doc.node(id) {
        NodeKind::Text(text) => {
            out.push_str(&escape_xml(text, false));
            return Ok(());
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
            return Ok(());
        }
        NodeKind::Element(element) => element,
    };

    out.push('<');
    out.push_str(&element.name);
    for (key, value) in element.attrs.iter() {
        push_attr(out, key, value);
    }
    if !element.meta.is_empty() {
        push_attr(out, META_ATTR, &serde_json::to_string(&element.meta)?);
    }
    if let Some(data) = &element.meta.data {
        push_attr(out, EXTENSION_ATTR, &serde_json::to_string(data)?);
    }

    let children = doc.children(id);
    if children.is_empty() && VOID_ELEMENTS.contains(&element.name.as_str()) {
        out.push_str(" />");
        return Ok(());
    }
    out.push('>');
    for &child in children {
        write_node(doc, child, out)?;
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
    Ok(())
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_xml(value, true));
    out.push('"');
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}
