//! Text escaping.
//!
//! Text content must not be re-parsed as markup. Text that would be is wrapped
//! in `<nowiki>`; stray tag openers become `&lt;`. Handlers that add
//! context-specific hazards (list markers, heading `=`, cell separators) pass
//! one of the hooks below to the walker.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Where a text chunk sits relative to its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    /// Output so far ends a line.
    pub at_line_start: bool,
    /// No content precedes the text inside its parent.
    pub first: bool,
    /// No content follows the text inside its parent.
    pub last: bool,
    /// Inside wikitext table syntax.
    pub in_table: bool,
}

/// Per-text rewrite passed to [`serialize_children`](crate::GenerationContext::serialize_children).
pub type TextHook = fn(&str, TextPosition) -> Cow<'_, str>;

/// Sequences that are markup anywhere in a line.
static INLINE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[|\]\]|\{\{|\}\}|''|~~~|\[(?:https?:)?//|__[A-Z]+__|</?nowiki")
        .expect("invalid inline markup regex")
});

/// Sequences that are markup at the start of a line.
static LINE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[*#:;= ]|----|\{\|)").expect("invalid line markup regex")
});

/// Line-start markup after an embedded newline.
static EMBEDDED_LINE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n(?:[*#:;= ]|----|\{\|)").expect("invalid embedded line markup regex")
});

static TAG_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z/!])").expect("invalid tag opener regex"));

fn nowiki(text: &str) -> String {
    format!("<nowiki>{}</nowiki>", text.replace("</nowiki>", "&lt;/nowiki>"))
}

/// Default escaping for text content.
pub fn escape_wikitext(text: &str, pos: TextPosition) -> Cow<'_, str> {
    let line_start = pos.at_line_start
        && (LINE_MARKUP.is_match(text) || (pos.in_table && text.starts_with(['|', '!'])));
    if line_start || INLINE_MARKUP.is_match(text) || EMBEDDED_LINE_MARKUP.is_match(text) {
        return Cow::Owned(nowiki(text));
    }
    TAG_OPENER.replace_all(text, "&lt;$1")
}

/// List item content: a leading list marker would extend the bullets.
pub fn escape_list_item(text: &str, pos: TextPosition) -> Cow<'_, str> {
    if pos.first && text.starts_with(['*', '#', ':', ';']) {
        let (marker, rest) = text.split_at(1);
        let rest_pos = TextPosition {
            at_line_start: false,
            first: false,
            ..pos
        };
        return Cow::Owned(format!(
            "<nowiki>{marker}</nowiki>{}",
            escape_wikitext(rest, rest_pos)
        ));
    }
    escape_wikitext(text, pos)
}

/// Heading content: `=` at either edge would change the level.
pub fn escape_heading(text: &str, pos: TextPosition) -> Cow<'_, str> {
    if (pos.first && text.starts_with('=')) || (pos.last && text.ends_with('=')) {
        return Cow::Owned(nowiki(text));
    }
    escape_wikitext(text, pos)
}

/// Table cell content: cell separators and leading row/caption/end markers.
pub fn escape_table_cell(text: &str, pos: TextPosition) -> Cow<'_, str> {
    if (pos.first && text.starts_with(['-', '+', '}'])) || text.contains("||") || text.contains("!!")
    {
        return Cow::Owned(nowiki(text));
    }
    escape_wikitext(text, pos)
}

/// Preformatted content: every line starts with a space.
pub fn indent_pre(text: &str, _pos: TextPosition) -> Cow<'_, str> {
    if text.contains('\n') {
        Cow::Owned(text.replace('\n', "\n "))
    } else {
        Cow::Borrowed(text)
    }
}
