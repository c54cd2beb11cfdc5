//! Risk classifier configuration

use serde::{Deserialize, Serialize};

/// One named risk pattern supplied through configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Category name reported for matches
    pub category: String,
    /// Case-insensitive regular expression tested against each sentence
    pub regex: String,
}

/// Risk classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Texts shorter than this are reported as having no content to analyze
    pub min_text_chars: usize,
    /// Sentence fragments of this length or shorter are discarded
    pub min_sentence_chars: usize,
    /// Maximum number of suspicious clauses reported
    pub max_clauses: usize,
    /// Replacement pattern table, in priority order (empty = built-in table)
    pub patterns: Vec<PatternSpec>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            min_sentence_chars: 10,
            max_clauses: 5,
            patterns: Vec::new(),
        }
    }
}
