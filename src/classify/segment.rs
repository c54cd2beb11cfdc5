//! Sentence segmentation

/// Split `text` on runs of `.`, `!` and `?`, keeping trimmed fragments longer
/// than `min_chars` characters.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > min_chars)
        .collect()
}
