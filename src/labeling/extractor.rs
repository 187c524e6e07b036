// src/labeling/extractor.rs

use anyhow::Result;
use std::sync::Arc;

use crate::labeling::tfidf::{KeywordExtractor, NgramTfIdfExtractor};
use crate::normalization::{is_informative, is_stock_phrase};
use crate::utils::constants::{LABEL_DELIMITER, LABEL_TOP_TERMS};

/// Builds a cluster label from its members' cleaned texts.
#[derive(Clone)]
pub struct LabelExtractor {
    keywords: Arc<dyn KeywordExtractor>,
    top_terms: usize,
}

impl Default for LabelExtractor {
    fn default() -> Self {
        Self::new(Arc::new(NgramTfIdfExtractor::default()), LABEL_TOP_TERMS)
    }
}

impl LabelExtractor {
    pub fn new(keywords: Arc<dyn KeywordExtractor>, top_terms: usize) -> Self {
        Self {
            keywords,
            top_terms: top_terms.max(1),
        }
    }

    /// Member texts that are neither stock phrases nor uninformative.
    pub fn label_corpus<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        texts
            .into_iter()
            .filter(|t| !is_stock_phrase(t) && is_informative(t))
            .map(str::to_string)
            .collect()
    }

    /// `None` when no member text is usable for labeling.
    pub fn extract<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Result<Option<String>> {
        let corpus = Self::label_corpus(texts);
        if corpus.is_empty() {
            return Ok(None);
        }
        let terms = self.keywords.top_terms(&corpus, self.top_terms)?;
        Ok(Some(terms.join(LABEL_DELIMITER)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_excludes_stock_and_short_texts() {
        let corpus = LabelExtractor::label_corpus([
            "good",
            "love it",
            "crashes crashes crashes crashes crashes",
            "the app crashes on startup after update",
        ]);
        assert_eq!(corpus, vec!["the app crashes on startup after update"]);
    }

    #[test]
    fn test_no_usable_text_yields_none() {
        let extractor = LabelExtractor::default();
        assert_eq!(extractor.extract(["good", "nice", "ok", "fine"]).unwrap(), None);
    }

    #[test]
    fn test_label_is_joined_terms() {
        let extractor = LabelExtractor::default();
        let label = extractor
            .extract([
                "the app crashes on startup after update",
                "app crashes on startup after the update",
                "good",
            ])
            .unwrap()
            .unwrap();
        assert!(label.starts_with("app crashes startup"));
        assert!(label.contains(", "));
    }
}
