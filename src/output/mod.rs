// src/output/mod.rs

pub mod assembler;
pub mod report;
pub mod timeline;
pub mod writer;

pub use assembler::{AssembledOutput, OutputAssembler};
pub use report::{OutputDigest, RunReport};
pub use timeline::{build_timeline, write_timeline, TimelineEntry};
pub use writer::{write_labeled_reviews, write_summary};
