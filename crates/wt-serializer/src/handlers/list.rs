//! Lists and list items.
//!
//! Bullets are not emitted by the list elements but by each item, which
//! rebuilds its full prefix (`**`, `#:`, ...) from its ancestor chain. An item
//! whose first rendered child is a nested wikitext list emits nothing: the
//! nested item supplies the combined prefix.

use wt_dom::{NodeId, Syntax};

use super::{
    NodeHandler, Resume, first_rendered_child, is_list, is_list_item, is_literal_html, is_root,
    leading_space, next_rendered_sibling,
};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::{ContextEntry, GenerationContext};
use crate::escape::escape_list_item;

/// `ul`, `ol`, `dl`.
pub struct ListHandler;

/// `li`, `dt`, `dd`.
pub struct ListItemHandler;

/// Bullet prefix for `node`, read off its ancestor chain.
pub(crate) fn list_bullets(ctx: &GenerationContext<'_>, node: NodeId) -> Result<String, SerializeError> {
    let doc = ctx.doc();
    let mut reversed = String::new();
    let mut current = Some(node);
    while let Some(id) = current {
        let Some(element) = doc.element(id) else {
            break;
        };
        if element.meta.is_literal_html() {
            if element.meta.auto_inserted_start && element.meta.auto_inserted_end {
                current = doc.parent(id);
                continue;
            }
            break;
        }
        match element.name.as_str() {
            "li" => {
                let marker = doc
                    .ancestors(id)
                    .find_map(|ancestor| match doc.name(ancestor) {
                        Some("ul") => Some('*'),
                        Some("ol") => Some('#'),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        SerializeError::structural(id, "li", "list item outside of ul or ol")
                    })?;
                reversed.push(marker);
            }
            "dt" => reversed.push(';'),
            "dd" => reversed.push(':'),
            "ul" if id == node => reversed.push('*'),
            "ol" if id == node => reversed.push('#'),
            "dl" if id == node => reversed.push(':'),
            "ul" | "ol" | "dl" => {}
            _ => break,
        }
        current = doc.parent(id);
    }
    Ok(reversed.chars().rev().collect())
}

/// Newlines allowed after a list or list item.
pub(crate) fn list_eol(ctx: &GenerationContext<'_>, node: NodeId, other: NodeId) -> SeparatorConstraint {
    let doc = ctx.doc();
    let max = ctx.config().max_newlines;
    if doc.element(other).is_none() || is_root(doc, other) {
        return SeparatorConstraint::range(0, max);
    }

    let next = next_rendered_sibling(doc, node);
    if next == Some(other) && is_literal_html(doc, other) {
        return SeparatorConstraint::range(0, max);
    }
    if next == Some(other) && (is_list(doc, other) || is_list_item(doc, other)) {
        let nested = doc
            .parent(node)
            .is_some_and(|parent| doc.is_element_in(parent, &["li", "dd"]));
        if is_list(doc, node) && doc.name(node) == doc.name(other) {
            return SeparatorConstraint::exactly(2);
        }
        if is_list_item(doc, node) || nested {
            return SeparatorConstraint::exactly(1);
        }
        return SeparatorConstraint::range(1, max);
    }

    if is_list(doc, other) || is_literal_html(doc, other) {
        return SeparatorConstraint::none();
    }
    if doc.parent(node).is_some_and(|parent| is_root(doc, parent)) {
        SeparatorConstraint::range(0, max)
    } else {
        SeparatorConstraint::range(1, max)
    }
}

impl NodeHandler for ListHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let mut multi_line = ctx.enter(ContextEntry::SingleLine(false));
        let mut list = multi_line.enter(ContextEntry::List);

        let doc = list.doc();
        if !first_rendered_child(doc, node).is_some_and(|child| is_list_item(doc, child)) {
            let bullets = list_bullets(&list, node)?;
            list.emit(&bullets, node)?;
        }
        list.serialize_children(node, None)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let doc = ctx.doc();
        let parent = doc.parent(node);
        let in_item = parent.is_some_and(|parent| is_list_item(doc, parent));
        if parent == Some(other) {
            if in_item && first_rendered_child(doc, other) == Some(node) {
                SeparatorConstraint::exactly(0)
            } else {
                SeparatorConstraint::none()
            }
        } else if in_item {
            SeparatorConstraint::exactly(1)
        } else {
            SeparatorConstraint::range(1, ctx.config().max_newlines)
        }
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        list_eol(ctx, node, other)
    }
}

impl NodeHandler for ListItemHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let doc = ctx.doc();
        let starts_with_list = first_rendered_child(doc, node)
            .is_some_and(|child| is_list(doc, child) && !is_literal_html(doc, child));
        let inline_definition = is_inline_definition(ctx, node);

        if inline_definition {
            ctx.emit(":", node)?;
        } else if !starts_with_list {
            let bullets = list_bullets(ctx, node)?;
            ctx.emit(&bullets, node)?;
        }
        if inline_definition || !starts_with_list {
            ctx.emit(leading_space(ctx, node, wrapper_unmodified), node)?;
        }
        ctx.serialize_children(node, Some(escape_list_item))?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let doc = ctx.doc();
        if is_inline_definition(ctx, node) {
            return SeparatorConstraint::exactly(0);
        }
        if (doc.parent(node) == Some(other) && is_list(doc, other)) || is_literal_html(doc, other) {
            SeparatorConstraint::none()
        } else {
            SeparatorConstraint::range(1, ctx.config().max_newlines)
        }
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        if ctx.doc().is_element_named(node, "dt") && is_inline_definition(ctx, other) {
            return SeparatorConstraint::exactly(0);
        }
        list_eol(ctx, node, other)
    }

    fn first_child(&self, _node: NodeId, child: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        if is_list(ctx.doc(), child) {
            SeparatorConstraint::none()
        } else {
            SeparatorConstraint::exactly(0)
        }
    }

    fn uses_single_line_context(&self) -> bool {
        true
    }
}

/// `dd` written on its term's line (`;term : definition`).
fn is_inline_definition(ctx: &GenerationContext<'_>, node: NodeId) -> bool {
    ctx.doc()
        .element(node)
        .is_some_and(|e| e.name == "dd" && e.meta.stx == Some(Syntax::Row))
}
