use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A forum post with its comments, collected from a gallery.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub url: String,
    pub content: String,
    pub comments: String,
    pub created_at: DateTime<FixedOffset>,
}

/// One sentence mentioning a tracked brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub url: String,
    pub title: String,
}

/// Aggregated VOC result: mentions grouped per brand (roster order) and
/// the overall top keywords.
#[derive(Debug, Clone, Default)]
pub struct SignalReport {
    pub brands: Vec<(String, Vec<Mention>)>,
    pub top_keywords: Vec<(String, usize)>,
}
