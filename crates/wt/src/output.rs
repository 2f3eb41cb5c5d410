//! Status reporting for `wt` commands.
//!
//! Messages go to stderr; stdout carries wikitext or annotated HTML.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use wt_serializer::LossyNote;

/// Reports command progress, lossy fallbacks and failures.
pub(crate) struct Output {
    term: Term,
    done: Style,
    lossy: Style,
    failed: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            done: Style::new().green(),
            lossy: Style::new().yellow(),
            failed: Style::new().red(),
        }
    }

    /// Report a node that was copied from the original source.
    pub(crate) fn lossy_note(&self, note: &LossyNote) {
        self.line(&self.lossy, &note_message(note));
    }

    /// Report serialized wikitext written to `path`.
    pub(crate) fn wrote(&self, path: &Path, notes: &[LossyNote]) {
        let style = if notes.is_empty() { &self.done } else { &self.lossy };
        self.line(style, &wrote_message(path, notes.len()));
    }

    /// Report annotated HTML written to `path`.
    pub(crate) fn recorded(&self, path: &Path, stamped: usize) {
        self.line(&self.done, &format!("Recorded {stamped} shape(s) in {}", path.display()));
    }

    /// Report a command failure.
    pub(crate) fn failure(&self, err: &dyn Display) {
        self.line(&self.failed, &format!("Error: {err}"));
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}

fn note_message(note: &LossyNote) -> String {
    format!(
        "Reused original source for <{}> {}: {}",
        note.kind, note.node, note.reason
    )
}

fn wrote_message(path: &Path, notes: usize) -> String {
    match notes {
        0 => format!("Wrote {}", path.display()),
        1 => format!("Wrote {} (1 lossy fallback)", path.display()),
        n => format!("Wrote {} ({n} lossy fallbacks)", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wt_dom::{Document, Element};

    use super::*;

    #[test]
    fn test_note_message_names_kind_and_node() {
        let mut doc = Document::new();
        let node = doc.append_element(doc.root(), Element::new("mystery"));
        let note = LossyNote {
            node,
            kind: "mystery".to_owned(),
            reason: "no handler".to_owned(),
        };
        assert_eq!(
            note_message(&note),
            format!("Reused original source for <mystery> {node}: no handler")
        );
    }

    #[test]
    fn test_wrote_message_counts_fallbacks() {
        let path = Path::new("out.wiki");
        assert_eq!(wrote_message(path, 0), "Wrote out.wiki");
        assert_eq!(wrote_message(path, 1), "Wrote out.wiki (1 lossy fallback)");
        assert_eq!(wrote_message(path, 3), "Wrote out.wiki (3 lossy fallbacks)");
    }
}
