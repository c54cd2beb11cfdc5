//! Visible text extraction

use scraper::Html;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "meta", "link"];

/// Whether text inside an element named `name` is hidden from the reader
pub(crate) fn is_hidden_element(name: &str) -> bool {
    HIDDEN_ELEMENTS.contains(&name)
}

/// Visible text of a document: each non-empty text node, trimmed, on its own line.
pub fn visible_text(document: &Html) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| is_hidden_element(el.name()))
        });
        if !hidden {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}
