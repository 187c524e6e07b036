// src/loading/mod.rs

pub mod csv_tables;

pub use csv_tables::{decode_bytes, load_releases, load_reviews, ReviewTable};
