// src/normalization/mod.rs

pub mod text;

pub use text::{is_informative, is_stock_phrase, BasicNormalizer, TextNormalizer, STOCK_PHRASES};
