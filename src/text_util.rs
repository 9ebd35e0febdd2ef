/// Characters that end a sentence for header classification.
const SENTENCE_END: &[char] = &['.', '!', '?', '…'];

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True when the text contains at least one cased letter and none of its
/// letters are lower-case.
pub fn is_upper_case(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

pub fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(SENTENCE_END)
}

/// The first `n` characters of `text` (not bytes).
pub fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_basic() {
        assert_eq!(word_count("Chapter One"), 2);
        assert_eq!(word_count("  spaced   out  "), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn upper_case_detection() {
        assert!(is_upper_case("INTRODUCTION"));
        assert!(is_upper_case("PART 2: SCOPE"));
        assert!(!is_upper_case("Introduction"));
        assert!(!is_upper_case("1234"));
        assert!(!is_upper_case(""));
        assert!(is_upper_case("ÉTAT"));
    }

    #[test]
    fn sentence_endings() {
        assert!(ends_sentence("A full sentence."));
        assert!(ends_sentence("Really?"));
        assert!(ends_sentence("Wait… "));
        assert!(!ends_sentence("A heading"));
        assert!(!ends_sentence("Items:"));
    }

    #[test]
    fn char_prefix_counts_chars() {
        assert_eq!(char_prefix("hello world", 5), "hello");
        assert_eq!(char_prefix("short", 20), "short");
        assert_eq!(char_prefix("日本語テキスト", 3), "日本語");
        assert_eq!(char_prefix("", 3), "");
    }
}
