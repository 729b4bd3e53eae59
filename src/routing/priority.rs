//! Priority scoring

use crate::taxonomy::Taxonomy;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_URGENCY_KEYWORDS: &[&str] = &["urgent", "immediate"];

/// Category, confidence and computed priority of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIntent {
    pub category: String,
    pub confidence: f32,
    pub priority: u32,
}

/// Derives a priority from the category and the body text
///
/// The result is not capped: a category at the top of the table still gains +1
/// when urgent, leaving headroom above any declared maximum.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    base: AHashMap<String, u32>,
    default_priority: u32,
    urgency_keywords: Vec<String>,
}

impl PriorityScorer {
    pub fn new(
        base: impl IntoIterator<Item = (String, u32)>,
        default_priority: u32,
        urgency_keywords: &[String],
    ) -> Self {
        Self {
            base: base.into_iter().collect(),
            default_priority,
            urgency_keywords: urgency_keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn from_taxonomy(
        taxonomy: &Taxonomy,
        default_priority: u32,
        urgency_keywords: &[String],
    ) -> Self {
        Self::new(
            taxonomy
                .categories
                .iter()
                .map(|c| (c.name.clone(), c.priority)),
            default_priority,
            urgency_keywords,
        )
    }

    /// Base priority for a category; unknown categories get the default
    pub fn base_priority(&self, category: &str) -> u32 {
        self.base
            .get(category)
            .copied()
            .unwrap_or(self.default_priority)
    }

    /// Whether any urgency keyword occurs in the body, case-insensitively
    pub fn is_urgent(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        self.urgency_keywords
            .iter()
            .any(|keyword| body.contains(keyword.as_str()))
    }

    /// Priority for `(category, body)`: base plus at most one for urgency
    pub fn priority(&self, category: &str, body: &str) -> u32 {
        let base = self.base_priority(category);
        if self.is_urgent(body) {
            base + 1
        } else {
            base
        }
    }

    pub fn score(&self, category: &str, confidence: f32, body: &str) -> ScoredIntent {
        ScoredIntent {
            category: category.to_string(),
            confidence,
            priority: self.priority(category, body),
        }
    }
}
