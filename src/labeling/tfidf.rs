// src/labeling/tfidf.rs
//
// Word n-gram TF-IDF keyword extraction.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::labeling::stopwords::is_stopword;
use crate::utils::constants::{LABEL_NGRAM_MAX, LABEL_NGRAM_MIN};

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Picks the `k` most representative terms of a small corpus.
pub trait KeywordExtractor: Send + Sync {
    fn top_terms(&self, texts: &[String], k: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy)]
pub struct NgramTfIdfExtractor {
    min_n: usize,
    max_n: usize,
}

impl Default for NgramTfIdfExtractor {
    fn default() -> Self {
        Self::new(LABEL_NGRAM_MIN, LABEL_NGRAM_MAX)
    }
}

fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Accent-stripped, lower-cased tokens of two or more word characters,
/// stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = strip_accents(text).to_lowercase();
    TOKEN
        .find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}

impl NgramTfIdfExtractor {
    pub fn new(min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        Self {
            min_n,
            max_n: max_n.max(min_n),
        }
    }

    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let mut grams = Vec::new();
        for n in self.min_n..=self.max_n {
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    /// Summed, per-document L2-normalized TF-IDF weight of every term, using
    /// smoothed IDF `ln((1 + n) / (1 + df)) + 1`.
    pub fn term_scores(&self, texts: &[String]) -> HashMap<String, f64> {
        let doc_counts: Vec<BTreeMap<String, f64>> = texts
            .iter()
            .map(|text| {
                let mut counts = BTreeMap::new();
                for gram in self.ngrams(&tokenize(text)) {
                    *counts.entry(gram).or_insert(0.0) += 1.0;
                }
                counts
            })
            .collect();

        let mut df: HashMap<&str, f64> = HashMap::new();
        for counts in &doc_counts {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0.0) += 1.0;
            }
        }

        let n_docs = texts.len() as f64;
        let mut scores: HashMap<String, f64> = HashMap::new();
        for counts in &doc_counts {
            let weighted: Vec<(&String, f64)> = counts
                .iter()
                .map(|(term, tf)| {
                    let idf = ((1.0 + n_docs) / (1.0 + df[term.as_str()])).ln() + 1.0;
                    (term, tf * idf)
                })
                .collect();
            let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (term, w) in weighted {
                *scores.entry(term.clone()).or_insert(0.0) += w / norm;
            }
        }
        scores
    }
}

impl KeywordExtractor for NgramTfIdfExtractor {
    /// Highest summed score first; ties broken alphabetically. Empty when no
    /// text is long enough to form an n-gram.
    fn top_terms(&self, texts: &[String], k: usize) -> Result<Vec<String>> {
        let mut ranked: Vec<(String, f64)> = self.term_scores(texts).into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked.into_iter().take(k).map(|(term, _)| term).collect())
    }
}
