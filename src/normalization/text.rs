// src/normalization/text.rs
//
// Review text cleanup and the informativeness heuristic.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::utils::constants::{
    MIN_INFORMATIVE_DISTINCT_TOKENS, MIN_INFORMATIVE_TOKENS, MISENCODED_SEQUENCE,
};

/// Low-information stock phrases that never feed label extraction.
pub const STOCK_PHRASES: &[&str] = &[
    "good",
    "bad",
    "nice",
    "great",
    "ok",
    "okay",
    "fine",
    "works",
    "cool",
    "love it",
    "hate it",
    "very good app",
    "wow",
    "happy",
    "gud",
    "excellent",
    "fantastic",
    "best",
    "super",
    "amazing",
    "terrible",
];

static STOCK_PHRASE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOCK_PHRASES.iter().copied().collect());

static PICTOGRAPH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}\x{2700}-\x{27BF}\x{24C2}-\x{1F251}]+",
    )
    .expect("pictograph pattern is a valid regex")
});

/// Turns raw review content into the text used for embedding and labeling.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait TextNormalizer: Send + Sync {
    fn clean(&self, raw: Option<&str>) -> String;
}

/// Lower-cases, strips the known mis-encoded sequence and pictographic symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicNormalizer;

impl TextNormalizer for BasicNormalizer {
    fn clean(&self, raw: Option<&str>) -> String {
        let Some(text) = raw else {
            return String::new();
        };
        let text = text.replace(MISENCODED_SEQUENCE, "").to_lowercase();
        let text = PICTOGRAPH_PATTERN.replace_all(text.trim(), "");
        text.trim().to_string()
    }
}

/// True when the text has at least five whitespace tokens, three of them distinct.
pub fn is_informative(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.len() < MIN_INFORMATIVE_TOKENS {
        return false;
    }
    let distinct: HashSet<&str> = tokens.iter().copied().collect();
    distinct.len() >= MIN_INFORMATIVE_DISTINCT_TOKENS
}

/// Exact match against the stock-phrase list. Expects already-cleaned text.
pub fn is_stock_phrase(text: &str) -> bool {
    STOCK_PHRASE_SET.contains(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_noise() {
        let normalizer = BasicNormalizer;
        assert_eq!(
            normalizer.clean(Some("  Great APP 😀👍 keeps CrashingÃƒ ")),
            "great app  keeps crashing"
        );
        assert_eq!(normalizer.clean(Some("✨ love it ✨")), "love it");
        assert_eq!(normalizer.clean(None), "");
        assert_eq!(normalizer.clean(Some("   ")), "");
    }

    #[test]
    fn test_clean_keeps_accents_and_punctuation() {
        let normalizer = BasicNormalizer;
        assert_eq!(normalizer.clean(Some("Café, très bien!")), "café, très bien!");
    }

    #[test]
    fn test_is_informative() {
        assert!(!is_informative("good"));
        assert!(!is_informative("good good good good good"));
        assert!(is_informative("the app keeps crashing on startup every time"));
        assert!(is_informative("  The app KEEPS crashing now "));
        assert!(!is_informative(""));
    }

    #[test]
    fn test_stock_phrases() {
        assert!(is_stock_phrase("love it"));
        assert!(is_stock_phrase("very good app"));
        assert!(!is_stock_phrase("love it so much"));
        assert!(!is_stock_phrase("Good"));
    }
}
