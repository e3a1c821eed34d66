//! Text matching helpers shared by the rule tables and reply parsers.
//!
//! All matching is plain case-insensitive substring containment. Callers pass
//! already lower-cased haystacks where they match many keywords in a row.

/// First candidate whose label matches `value` by bidirectional
/// case-insensitive containment (`value ⊂ label` or `label ⊂ value`).
///
/// An empty (or whitespace-only) value never matches; it would otherwise be
/// a substring of every label.
pub fn match_label<T: Copy>(value: &str, candidates: &[(&str, T)]) -> Option<T> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    candidates.iter().find_map(|(label, item)| {
        let label = label.to_lowercase();
        (label.contains(&value) || value.contains(&label)).then_some(*item)
    })
}

/// Whether any keyword occurs in `haystack_lower`.
pub fn contains_any(haystack_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack_lower.contains(k))
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether any multiple of 50 in `50..1000`, or "100", appears as a
/// substring.
pub fn mentions_round_number(text: &str) -> bool {
    text.contains("100") || (50..1000).step_by(50).any(|n| text.contains(&n.to_string()))
}

/// Whether any integer in `50..1000` appears as a substring.
pub fn mentions_large_number(text: &str) -> bool {
    (50..1000).any(|n| text.contains(&n.to_string()))
}

/// One named boolean heuristic in a "complex case" vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub name: &'static str,
    pub fired: bool,
}

impl Signal {
    pub fn new(name: &'static str, fired: bool) -> Self {
        Self { name, fired }
    }
}

/// Signals that must fire before an optional inference call is made.
pub const COMPLEX_CASE_THRESHOLD: usize = 2;

/// Count fired signals and compare against [`COMPLEX_CASE_THRESHOLD`].
pub fn is_complex_case(signals: &[Signal]) -> bool {
    signals.iter().filter(|s| s.fired).count() >= COMPLEX_CASE_THRESHOLD
}

/// Names of the fired signals, for log lines.
pub fn fired_names(signals: &[Signal]) -> Vec<&'static str> {
    signals.iter().filter(|s| s.fired).map(|s| s.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: &[(&str, u8)] = &[("Red", 1), ("Dark Red", 2), ("Blue", 3)];

    #[test]
    fn match_label_is_bidirectional() {
        assert_eq!(match_label("red", COLORS), Some(1));
        assert_eq!(match_label("BLUE", COLORS), Some(3));
        // label contained in value
        assert_eq!(match_label("very blue sky", COLORS), Some(3));
        // value contained in label, first in order wins
        assert_eq!(match_label("ed", COLORS), Some(1));
        assert_eq!(match_label("dark", COLORS), Some(2));
    }

    #[test]
    fn match_label_rejects_empty_and_unknown() {
        assert_eq!(match_label("", COLORS), None);
        assert_eq!(match_label("   ", COLORS), None);
        assert_eq!(match_label("green", COLORS), None);
    }

    #[test]
    fn keyword_helpers() {
        assert!(contains_any("a small fire", &["blaze", "fire"]));
        assert!(!contains_any("all calm", &["fire"]));
        assert_eq!(word_count("  one two\tthree\nfour "), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn number_mentions() {
        assert!(mentions_round_number("about 100 people"));
        assert!(mentions_round_number("nearly 250 cars"));
        assert!(mentions_round_number("1500 runners"));
        assert!(!mentions_round_number("3 people"));
        assert!(!mentions_round_number("49 people"));
        assert!(mentions_large_number("73 people"));
        assert!(!mentions_large_number("12 people"));
    }

    #[test]
    fn complex_case_needs_two_signals() {
        let one = [Signal::new("a", true), Signal::new("b", false)];
        let two = [Signal::new("a", true), Signal::new("b", true), Signal::new("c", false)];
        assert!(!is_complex_case(&one));
        assert!(is_complex_case(&two));
        assert_eq!(fired_names(&two), vec!["a", "b"]);
    }
}
