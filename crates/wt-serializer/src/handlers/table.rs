//! Wikitext tables.
//!
//! ```text
//! {| class="wikitable"
//! |+ caption
//! |-
//! ! head !! head
//! |-
//! | cell || cell
//! |}
//! ```

use wt_dom::{Element, NodeId, Syntax};

use super::{
    NodeHandler, Resume, attributes_string, is_root, max_newlines_in_table, original_open,
};
use crate::SerializeError;
use crate::constraint::SeparatorConstraint;
use crate::context::{ContextEntry, GenerationContext};
use crate::escape::escape_table_cell;

/// `table`.
pub struct TableHandler;

/// `tbody`, `thead`, `tfoot`: no syntax of their own.
pub struct TableSectionHandler;

/// `tr`.
pub struct TableRowHandler;

/// `td`, `th`.
pub struct TableCellHandler;

fn in_table(ctx: &GenerationContext<'_>, node: NodeId, min: u32) -> SeparatorConstraint {
    SeparatorConstraint::range(min, max_newlines_in_table(ctx, node))
}

impl NodeHandler for TableHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let Some(element) = ctx.doc().element(node) else {
            return Ok(Resume::Next);
        };
        match original_open(ctx, node, wrapper_unmodified) {
            Some(open) => ctx.emit(open, node)?,
            None => ctx.emit(&format!("{{|{}", attributes_string(element)), node)?,
        }

        {
            let mut table = ctx.enter(ContextEntry::Table);
            table.serialize_children(node, None)?;
        }

        if element.meta.auto_inserted_end && wrapper_unmodified {
            return Ok(Resume::Next);
        }
        ctx.flush_separator()?;
        if !ctx.at_start_of_line() {
            ctx.emit("\n", node)?;
        }
        ctx.emit(element.meta.end_tag_src.as_deref().unwrap_or("|}"), node)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let doc = ctx.doc();
        let min = u32::from(!(doc.parent(node) == Some(other) && is_root(doc, other)));
        SeparatorConstraint::range(min, ctx.config().max_newlines)
    }

    fn after(&self, node: NodeId, other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        self.before(node, other, ctx)
    }

    fn first_child(&self, node: NodeId, _child: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        in_table(ctx, node, 1)
    }

    fn last_child(&self, node: NodeId, _child: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        in_table(ctx, node, 1)
    }
}

impl NodeHandler for TableSectionHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        ctx.serialize_children(node, None)?;
        Ok(Resume::Next)
    }
}

/// Whether a row is written with its own `|-` line.
///
/// The first row of a table may omit it, in which case the row was
/// auto-inserted or its span has no opening syntax.
fn has_row_syntax(element: &Element) -> bool {
    let implicit = element.meta.auto_inserted_start
        || (element.attrs.is_empty() && element.meta.dsr.is_some_and(|r| r.open_width == 0));
    !implicit
}

impl NodeHandler for TableRowHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let Some(element) = ctx.doc().element(node) else {
            return Ok(Resume::Next);
        };
        if has_row_syntax(element) {
            match original_open(ctx, node, wrapper_unmodified) {
                Some(open) => ctx.emit(open, node)?,
                None => ctx.emit(&format!("|-{}", attributes_string(element)), node)?,
            }
        }
        ctx.serialize_children(node, None)?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        in_table(ctx, node, 1)
    }

    fn after(&self, node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        in_table(ctx, node, 0)
    }

    fn first_child(&self, node: NodeId, _child: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        let row_syntax = ctx.doc().element(node).is_some_and(has_row_syntax);
        in_table(ctx, node, u32::from(row_syntax))
    }
}

/// Whether a cell shares its line with the previous one (`||`, `!!`).
fn is_inline_cell(ctx: &GenerationContext<'_>, node: NodeId) -> bool {
    ctx.doc()
        .element(node)
        .is_some_and(|e| e.meta.stx == Some(Syntax::Row))
}

impl NodeHandler for TableCellHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        let Some(element) = ctx.doc().element(node) else {
            return Ok(Resume::Next);
        };
        if let Some(open) = original_open(ctx, node, wrapper_unmodified) {
            ctx.emit(open, node)?;
        } else {
            let symbol = match (element.name == "th", is_inline_cell(ctx, node)) {
                (false, false) => "|",
                (false, true) => "||",
                (true, false) => "!",
                (true, true) => "!!",
            };
            let mut open = element
                .meta
                .start_tag_src
                .clone()
                .unwrap_or_else(|| symbol.to_owned());
            if !element.attrs.is_empty() {
                open.push_str(&attributes_string(element));
                open.push_str(" |");
            }
            ctx.emit(&open, node)?;
        }
        ctx.serialize_children(node, Some(escape_table_cell))?;
        Ok(Resume::Next)
    }

    fn before(&self, node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        if is_inline_cell(ctx, node) {
            SeparatorConstraint::exactly(0)
        } else {
            in_table(ctx, node, 1)
        }
    }

    fn after(&self, node: NodeId, _other: NodeId, ctx: &GenerationContext<'_>) -> SeparatorConstraint {
        in_table(ctx, node, 0)
    }
}
