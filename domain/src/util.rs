//! Shared utility functions.

/// Truncate a string to at most `max_bytes`, backing up to the nearest UTF-8
/// character boundary. Returns a sub-slice; short inputs are unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_snippets() {
        let snippet = "Total revenue was $24.578 billion for the year ended December 31, 2019.";
        assert_eq!(truncate_str(snippet, 13), "Total revenue");
    }

    #[test]
    fn short_input_unchanged() {
        assert_eq!(truncate_str("10-K", 1400), "10-K");
    }

    #[test]
    fn respects_char_boundaries() {
        // '∆' is 3 bytes; cutting inside it must back up.
        let s = "∆ revenue";
        assert_eq!(truncate_str(s, 2), "");
        assert_eq!(truncate_str(s, 3), "∆");
    }
}
