//! `wt annotate` command implementation.

use std::path::PathBuf;

use clap::Args;
use wt_dom::{Document, NodeKind, parse_html, to_html};

use super::write_result;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the annotate command.
#[derive(Args)]
pub(crate) struct AnnotateArgs {
    /// Path to the annotated HTML file.
    html_file: PathBuf,

    /// Original wikitext the spans in the HTML point into.
    #[arg(short, long)]
    source: PathBuf,

    /// Write annotated HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl AnnotateArgs {
    /// Execute the annotate command.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing or writing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let html = std::fs::read_to_string(&self.html_file)?;
        let source = std::fs::read_to_string(&self.source)?;
        let (annotated, stamped) = annotate_html(&html, source)?;
        tracing::debug!(stamped, "Recorded shapes");

        write_result(self.output.as_deref(), &annotated)?;
        if let Some(path) = &self.output {
            output.recorded(path, stamped);
        }
        Ok(())
    }
}

/// Record shapes on every spanned element and write the tree back out.
///
/// Returns the annotated HTML and the number of elements stamped.
pub(crate) fn annotate_html(html: &str, source: String) -> Result<(String, usize), CliError> {
    let mut doc = parse_html(html)?;
    doc.set_source(source);
    doc.record_shapes();
    let stamped = count_shapes(&doc);
    Ok((to_html(&doc)?, stamped))
}

fn count_shapes(doc: &Document) -> usize {
    let mut count = 0;
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        if let NodeKind::Element(element) = doc.node(id) {
            count += usize::from(element.meta.shape.is_some());
            stack.extend_from_slice(doc.children(id));
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wt_dom::parse_html;

    use super::*;

    #[test]
    fn test_only_spanned_elements_are_stamped() {
        let html = r#"<ul data-wt='{"dsr":[0,7,0,0]}'><li data-wt='{"dsr":[0,3,1,0]}'>a</li><li>b</li></ul>"#;
        let (annotated, stamped) = annotate_html(html, "* a\n* b".to_owned()).unwrap();
        // The root picks up a span covering the whole source.
        assert_eq!(stamped, 3);

        let doc = parse_html(&annotated).unwrap();
        let ul = doc.first_child(doc.root()).unwrap();
        let items = doc.children(ul);
        assert!(doc.element(ul).unwrap().meta.shape.is_some());
        assert!(doc.element(items[0]).unwrap().meta.shape.is_some());
        assert!(doc.element(items[1]).unwrap().meta.shape.is_none());
    }
}
