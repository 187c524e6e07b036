// src/utils/constants.rs

/// Buckets with fewer informative reviews than this are skipped entirely.
pub const MIN_BUCKET_REVIEWS: usize = 5;

/// Smallest group the clustering pass may report as a cluster.
pub const MIN_CLUSTER_SIZE: usize = 5;

/// Informativeness gate: minimum whitespace tokens and minimum distinct tokens.
pub const MIN_INFORMATIVE_TOKENS: usize = 5;
pub const MIN_INFORMATIVE_DISTINCT_TOKENS: usize = 3;

/// Label extraction: n-gram range and number of phrases kept.
pub const LABEL_NGRAM_MIN: usize = 3;
pub const LABEL_NGRAM_MAX: usize = 4;
pub const LABEL_TOP_TERMS: usize = 5;
pub const LABEL_DELIMITER: &str = ", ";

/// Minimum fraction of dictionary words a label needs to be kept.
pub const DEFAULT_LABEL_VALIDITY_THRESHOLD: f64 = 0.3;

/// Euclidean neighbourhood radius for DBSCAN over unit-length sentence
/// embeddings. 0.6 corresponds to a cosine similarity of roughly 0.82.
pub const DEFAULT_DBSCAN_TOLERANCE: f32 = 0.6;

/// Radius for the sparse hashing embedder, where reviews sharing no token sit
/// at sqrt(2). 1.0 corresponds to a cosine similarity of 0.5.
pub const HASHING_DBSCAN_TOLERANCE: f32 = 1.0;

/// Dimensionality of the offline hashing embedder.
pub const HASHING_EMBEDDING_DIM: usize = 384;

/// Mis-encoded byte sequence that shows up in cp1252-exported review dumps.
pub const MISENCODED_SEQUENCE: &str = "Ãƒ";
