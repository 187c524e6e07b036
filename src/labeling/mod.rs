// src/labeling/mod.rs

pub mod extractor;
pub mod stopwords;
pub mod tfidf;
pub mod validator;

pub use extractor::LabelExtractor;
pub use tfidf::{KeywordExtractor, NgramTfIdfExtractor};
pub use validator::{is_valid_label, EnglishLexicon};
