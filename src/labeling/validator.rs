// src/labeling/validator.rs
//
// Rejects labels that are mostly misspellings or non-English fragments.

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is a valid regex"));

const BUNDLED_WORDS: &str = include_str!("../../data/english_words.txt");

/// Lower-cased reference word set.
#[derive(Debug, Clone, Default)]
pub struct EnglishLexicon {
    words: HashSet<String>,
}

impl EnglishLexicon {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// One word per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list {}", path.display()))?;
        Ok(Self::from_words(raw.lines()))
    }

    pub fn bundled() -> Self {
        Self::from_words(BUNDLED_WORDS.lines())
    }

    /// Reads `path` when possible, falling back to the bundled list.
    pub fn load_or_bundled(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(lexicon) if !lexicon.is_empty() => {
                info!("📖 Loaded {} English words from {}", lexicon.len(), path.display());
                lexicon
            }
            Ok(_) => {
                warn!("Word list {} is empty, using bundled list", path.display());
                Self::bundled()
            }
            Err(e) => {
                warn!("{:#}; using bundled word list", e);
                Self::bundled()
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Fraction of `\w+` tokens that are purely alphabetic dictionary words.
/// `None` when the label has no tokens.
pub fn english_ratio(label: &str, lexicon: &EnglishLexicon) -> Option<f64> {
    let tokens: Vec<&str> = WORD.find_iter(label).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return None;
    }
    let valid = tokens
        .iter()
        .filter(|t| t.chars().all(char::is_alphabetic) && lexicon.contains(t))
        .count();
    Some(valid as f64 / tokens.len() as f64)
}

pub fn is_valid_label(label: &str, lexicon: &EnglishLexicon, threshold: f64) -> bool {
    english_ratio(label, lexicon).map_or(false, |ratio| ratio >= threshold)
}
