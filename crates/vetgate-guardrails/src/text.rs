//! Shared text helpers for similarity-based guardrails

use std::collections::HashSet;

/// Split content into normalized tokens: lowercase, whitespace-separated,
/// with non-alphanumeric characters trimmed from both ends of each token.
/// Tokens that become empty after trimming are dropped.
pub(crate) fn tokenize(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .filter_map(|raw| {
            let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_lowercase())
            }
        })
        .collect()
}

/// Jaccard similarity between the token sets of two texts
///
/// Both empty counts as identical (1.0) so that repeated empty messages are
/// treated as repetition rather than silently passing.
pub(crate) fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = tokenize(a).into_iter().collect();
    let set_b: HashSet<String> = tokenize(b).into_iter().collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_trims() {
        let tokens = tokenize("Hello, World! (rust)");
        assert_eq!(tokens, vec!["hello", "world", "rust"]);
    }

    #[test]
    fn test_tokenize_drops_pure_punctuation() {
        let tokens = tokenize("wait... --- !!! ok");
        assert_eq!(tokens, vec!["wait", "ok"]);
    }

    #[test]
    fn test_tokenize_keeps_interior_punctuation() {
        let tokens = tokenize("user@example.com isn't");
        assert_eq!(tokens, vec!["user@example.com", "isn't"]);
    }

    #[test]
    fn test_jaccard_identical() {
        assert_eq!(jaccard_similarity("the same words", "the same words"), 1.0);
    }

    #[test]
    fn test_jaccard_disjoint() {
        assert_eq!(jaccard_similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        // sets {a, b, c} and {b, c, d}: intersection 2, union 4
        let sim = jaccard_similarity("a b c", "b c d");
        assert!((sim - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard_both_empty() {
        assert_eq!(jaccard_similarity("", "   "), 1.0);
    }

    #[test]
    fn test_jaccard_case_insensitive() {
        assert_eq!(jaccard_similarity("Hello World", "hello world"), 1.0);
    }
}
