//! In-page legal text detection

use scraper::{ElementRef, Html, Selector};

use crate::fetch::is_hidden_element;
use crate::util::char_len;

/// Inline elements skipped when looking for the block that holds a line
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "em", "font", "i", "kbd", "label", "mark",
    "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Decides whether a page's visible text is (or contains) a legal document
#[derive(Debug, Clone)]
pub struct LegalDetector {
    fragments: Vec<String>,
    heading_keywords: Vec<String>,
    min_chars: usize,
    context_window: usize,
}

impl LegalDetector {
    /// Keywords are matched case-insensitively as substrings.
    pub fn new<F, H>(fragments: F, heading_keywords: H) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        Self {
            fragments: lowercase_all(fragments),
            heading_keywords: lowercase_all(heading_keywords),
            min_chars: 600,
            context_window: 5,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn with_context_window(mut self, lines: usize) -> Self {
        self.context_window = lines;
        self
    }

    /// Legal sections of `text`, or `None` when the page does not look legal.
    ///
    /// Each line containing a keyword contributes its surrounding window, or
    /// the text of its enclosing block when `document` is given. When no line
    /// matches, a legal-sounding heading or title makes the whole text count.
    pub fn detect(&self, text: &str, document: Option<&Html>) -> Option<String> {
        if char_len(text) < self.min_chars {
            return None;
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let mut sections: Vec<String> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();
            if !self.fragments.iter().any(|f| lower.contains(f.as_str())) {
                continue;
            }

            let block = document.and_then(|doc| enclosing_block_text(doc, line));
            let section = block.unwrap_or_else(|| {
                let start = idx.saturating_sub(self.context_window);
                let end = (idx + self.context_window + 1).min(lines.len());
                lines[start..end].join("\n")
            });

            // Neighbouring hits in one block yield the same section
            if !sections.contains(&section) {
                sections.push(section);
            }
        }

        if !sections.is_empty() {
            return Some(sections.join("\n\n"));
        }

        match document {
            Some(doc) if self.has_legal_heading(doc) => Some(text.to_string()),
            _ => None,
        }
    }

    fn has_legal_heading(&self, document: &Html) -> bool {
        let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6, title") else {
            return false;
        };
        document.select(&selector).any(|heading| {
            let text = heading.text().collect::<String>().to_lowercase();
            self.heading_keywords.iter().any(|k| text.contains(k.as_str()))
        })
    }
}

fn lowercase_all<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text of the nearest block element around the visible text node that is `line`
fn enclosing_block_text(document: &Html, line: &str) -> Option<String> {
    let node = document.root_element().descendants().find(|n| {
        n.value().as_text().is_some_and(|t| t.trim() == line)
            && !n.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| is_hidden_element(el.name()))
            })
    })?;

    let block = node
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| !INLINE_ELEMENTS.contains(&el.value().name()))?;

    let text = block
        .descendants()
        .filter(|n| {
            !n.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| is_hidden_element(el.value().name()))
        })
        .filter_map(|n| n.value().as_text().map(|t| t.trim()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}
