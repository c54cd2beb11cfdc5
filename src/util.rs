//! Shared utility functions

/// Keep the first `max_chars` characters of `s`, appending "..." when
/// anything was cut.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// Number of characters (not bytes) in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate_str("We collect data.", 150), "We collect data.");
        assert_eq!(truncate_str("exact", 5), "exact");
    }

    #[test]
    fn long_strings_are_cut_on_char_boundaries() {
        assert_eq!(truncate_str("abcdefgh", 3), "abc...");
        assert_eq!(truncate_str("données personnelles", 4), "donn...");
        assert_eq!(truncate_str("ééééé", 2), "éé...");
    }

    #[test]
    fn char_len_counts_characters() {
        assert_eq!(char_len("café"), 4);
        assert_eq!(char_len(""), 0);
    }
}
