// src/matching.rs
//! Fuzzy lookup of free-text labels against enumerated option keys.
//!
//! Region names arrive as whatever the user typed ("kiev", "Kyiv city",
//! "lviv"); option maps carry canonical keys. Scoring is token-order
//! insensitive: both sides are lowercased, split on whitespace, sorted and
//! rejoined before a normalized indel comparison, scaled to 0-100.

use rapidfuzz::distance::indel;

/// Sort the whitespace tokens of a string so word order stops mattering.
fn token_sort_key(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity between two strings on a 0-100 scale.
///
/// The indel ratio (insertions and deletions only, no substitutions) is
/// more forgiving of transliteration variants than plain Levenshtein:
/// "kiev" against "kyiv" scores 75, not 50.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let key_a = token_sort_key(a);
    let key_b = token_sort_key(b);
    indel::normalized_similarity(key_a.chars(), key_b.chars()) * 100.0
}

/// Best-matching key strictly above `threshold`, or None.
///
/// An exact key match (modulo case and token order) scores 100 and resolves
/// for any threshold below 100.
pub fn most_similar<'a, I>(needle: &str, keys: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .map(|key| (key, token_sort_ratio(needle, key)))
        .filter(|(_, score)| *score > threshold)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_scores_full() {
        assert_eq!(token_sort_ratio("Kyiv", "Kyiv"), 100.0);
        assert_eq!(token_sort_ratio("kyiv", "Kyiv"), 100.0);
    }

    #[test]
    fn test_token_order_is_ignored() {
        assert_eq!(token_sort_ratio("city Kyiv", "Kyiv city"), 100.0);
    }

    #[test]
    fn test_exact_match_resolves_at_any_threshold() {
        let keys = ["Kyiv", "Lviv"];
        assert_eq!(most_similar("Lviv", keys, 99.0), Some("Lviv"));
        assert_eq!(most_similar("Lviv", keys, 0.0), Some("Lviv"));
    }

    #[test]
    fn test_below_threshold_yields_none() {
        let keys = ["Kyiv", "Lviv"];
        assert_eq!(most_similar("Zhytomyrshchyna", keys, 70.0), None);
    }

    #[test]
    fn test_kiev_resolves_to_kyiv_at_default_threshold() {
        let keys = ["Kyiv", "Lviv"];
        assert!(token_sort_ratio("kiev", "Kyiv") > 70.0);
        assert_eq!(most_similar("kiev", keys, 70.0), Some("Kyiv"));
    }

    #[test]
    fn test_picks_highest_scoring_key() {
        let keys = ["Kharkiv", "Kyiv"];
        assert_eq!(most_similar("Kharkiw", keys, 50.0), Some("Kharkiv"));
    }
}
