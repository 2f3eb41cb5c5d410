//! Annotated HTML reader.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use super::entities::convert_html_entities;
use super::{EXTENSION_ATTR, META_ATTR};
use crate::document::Document;
use crate::error::DomError;
use crate::meta::NodeMeta;
use crate::node::{Element, NodeId};

/// HTML void elements written without a closing slash (`<br>`).
static VOID_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|wbr|input|meta|link)\b([^>]*?)\s*/?>")
        .expect("invalid void tag regex")
});

/// Parse annotated HTML into a [`Document`].
///
/// Element metadata is read from the `data-wt` attribute and extension data
/// from `data-mw`; both attributes are removed from the element's attribute
/// list. A single top-level `body` element becomes the root; any other
/// fragment is placed under a fresh `body`.
///
/// # Errors
///
/// Returns an error if the input is not well-formed XML after void tags are
/// closed, or if a metadata attribute does not hold valid JSON.
pub fn parse_html(html: &str) -> Result<Document, DomError> {
    let html = convert_html_entities(html);
    let html = VOID_TAG_PATTERN.replace_all(&html, "<$1$2 />");

    let mut reader = Reader::from_str(&html);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new();
    let mut stack = vec![doc.root()];

    loop {
        let top = *stack.last().unwrap_or(&doc.root());
        match reader.read_event()? {
            Event::Start(e) => {
                let element = decode_element(&reader, &e)?;
                let id = doc.append_element(top, element);
                stack.push(id);
            }
            Event::Empty(e) => {
                let element = decode_element(&reader, &e)?;
                doc.append_element(top, element);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut doc, top, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                append_text(&mut doc, top, &decode_entity(&entity));
            }
            Event::CData(e) => {
                append_text(&mut doc, top, &String::from_utf8_lossy(&e));
            }
            Event::Comment(e) => {
                let text = reader.decoder().decode(&e)?.into_owned();
                doc.append_comment(top, text);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(body) = sole_body(&doc) {
        doc.promote_root(body);
    }
    Ok(doc)
}

/// The only element child of the wrapper, if it is a `body` surrounded by
/// nothing but whitespace.
fn sole_body(doc: &Document) -> Option<NodeId> {
    let mut body = None;
    for &child in doc.children(doc.root()) {
        if let Some(text) = doc.text(child)
            && text.trim().is_empty()
        {
            continue;
        }
        if body.is_some() || !doc.is_element_named(child, "body") {
            return None;
        }
        body = Some(child);
    }
    body
}

fn decode_element(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<Element, DomError> {
    let name = decode_name(reader, e.name().as_ref());
    let mut element = Element::new(name);

    for attr in e.attributes() {
        let attr = attr?;
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            Cow::into_owned,
        );

        match key.as_str() {
            META_ATTR => {
                let data = element.meta.data.take();
                element.meta = serde_json::from_str::<NodeMeta>(&value).map_err(|source| {
                    DomError::InvalidMetadata {
                        tag: element.name.clone(),
                        source,
                    }
                })?;
                element.meta.data = data;
            }
            EXTENSION_ATTR => {
                let data = serde_json::from_str(&value).map_err(|source| {
                    DomError::InvalidMetadata {
                        tag: element.name.clone(),
                        source,
                    }
                })?;
                element.meta.data = Some(data);
            }
            _ => element.attrs.set(key, value),
        }
    }
    Ok(element)
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(|_| String::from_utf8_lossy(name).into_owned(), Cow::into_owned)
}

/// Append text, merging with a preceding text node.
fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = doc.last_child(parent)
        && let Some(existing) = doc.text_mut(last)
    {
        existing.push_str(text);
        return;
    }
    doc.append_text(parent, text);
}

/// Decode an XML entity or character reference.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if let Some(hex) = s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}
