// src/models/review.rs

use crate::models::cluster::BucketKey;

/// Row position of a review in the input table.
pub type ReviewId = usize;

/// One review row as loaded. Never modified after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub raw_version: Option<String>,
    pub raw_timestamp: Option<String>,
    /// Star rating; `None` when missing, unparsable or outside 1..=5.
    pub rating: Option<f64>,
    pub raw_content: Option<String>,
    /// Every original column value, in header order, for the labeled output table.
    pub raw_record: Vec<String>,
}

/// One release-log row.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub raw_date: Option<String>,
    pub raw_version: Option<String>,
    pub description: Option<String>,
}

/// A review after text cleaning and release alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReview {
    pub review: Review,
    pub cleaned_content: String,
    pub informative: bool,
    /// `None` when no version/date could be resolved or matched; such reviews
    /// never reach clustering.
    pub bucket_key: Option<BucketKey>,
}

impl NormalizedReview {
    pub fn id(&self) -> ReviewId {
        self.review.id
    }

    pub fn rating(&self) -> Option<f64> {
        self.review.rating
    }
}
