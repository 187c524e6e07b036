pub mod cluster;
pub mod review;
pub mod stats_models;

pub use cluster::{
    BucketKey, Cluster, ClusterAssignment, ClusterSummaryRecord, LabeledReviewRecord, VersionKey,
};
pub use review::{NormalizedReview, Release, Review, ReviewId};
