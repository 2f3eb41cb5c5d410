//! Named HTML entity conversion.
//!
//! The reader parses annotated HTML as XML, which only knows the five
//! predefined entities. Other named entities are replaced by their characters
//! beforehand; unknown names and the predefined ones are left alone.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

/// Replace named HTML entities with the characters they stand for.
pub(crate) fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            entity_char(&caps[1]).map_or_else(|| caps[0].to_owned(), String::from)
        })
        .into_owned()
}

fn entity_char(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "\u{00ad}",
        "zwj" => "\u{200d}",
        "zwnj" => "\u{200c}",
        "lrm" => "\u{200e}",
        "rlm" => "\u{200f}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{00b0}",
        "times" => "\u{00d7}",
        "minus" => "\u{2212}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        _ => return None,
    })
}
