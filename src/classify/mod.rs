//! Intent classification
//!
//! The classifier itself is an external collaborator behind the `IntentClassifier`
//! trait. This module owns the contract and the two-stage use of it:
//! - classify against the top-level category set
//! - re-classify the same text against the winning category's sub-categories,
//!   when it has any
//!
//! `KeywordClassifier` is a deterministic bundled implementation so the CLI can run
//! without a model runtime; tests substitute their own stubs.

mod keyword;
mod segment;

pub use keyword::KeywordClassifier;
pub use segment::{analyze_segments, primary_intent, split_segments, SegmentIntent};

use crate::error::{Result, TriageError};
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};

/// Ranked labels with a parallel score array, highest score first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl Classification {
    /// Winning label and its confidence (`labels[0]`, `scores[0]`)
    pub fn top(&self) -> Option<(&str, f32)> {
        match (self.labels.first(), self.scores.first()) {
            (Some(label), Some(score)) => Some((label.as_str(), *score)),
            _ => None,
        }
    }
}

/// Zero-shot style text classifier collaborator
///
/// Implementations are loaded once at startup and shared read-only. The pipeline
/// issues one call at a time, unless a call was abandoned after a timeout and is
/// still running.
pub trait IntentClassifier: Send + Sync {
    /// Rank `labels` for `text`; returned labels are ordered by descending score
    fn classify(&self, text: &str, labels: &[String]) -> Result<Classification>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}

/// Two-level classification of one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub category: String,
    pub category_confidence: f32,
    pub subcategory: Option<String>,
    pub subcategory_confidence: f32,
}

/// Classify text into a category, then into one of that category's sub-categories
///
/// Sub-classification is skipped (no subcategory, confidence 0) when the winning
/// category declares no sub-categories.
pub fn classify_intent(
    classifier: &dyn IntentClassifier,
    taxonomy: &Taxonomy,
    text: &str,
) -> Result<Intent> {
    let labels = taxonomy.category_labels();
    let result = classifier.classify(text, &labels)?;
    let (category, category_confidence) = top_label(&result, classifier)?;

    let sub_labels = taxonomy.subcategory_labels(&category);
    let (subcategory, subcategory_confidence) = if sub_labels.is_empty() {
        (None, 0.0)
    } else {
        let sub_result = classifier.classify(text, &sub_labels)?;
        let (sub, confidence) = top_label(&sub_result, classifier)?;
        (Some(sub), confidence)
    };

    Ok(Intent {
        category,
        category_confidence,
        subcategory,
        subcategory_confidence,
    })
}

fn top_label(result: &Classification, classifier: &dyn IntentClassifier) -> Result<(String, f32)> {
    result
        .top()
        .map(|(label, score)| (label.to_string(), score))
        .ok_or_else(|| {
            TriageError::Classification(format!(
                "{} returned no labels",
                classifier.name()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{CategorySpec, SubcategorySpec};
    use std::sync::Mutex;

    /// Ranks labels in the order given, recording every call
    struct OrderedStub {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl OrderedStub {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl IntentClassifier for OrderedStub {
        fn classify(&self, _text: &str, labels: &[String]) -> Result<Classification> {
            self.calls.lock().unwrap().push(labels.to_vec());
            let n = labels.len() as f32;
            Ok(Classification {
                labels: labels.to_vec(),
                scores: (0..labels.len()).map(|i| (n - i as f32) / (n * 2.0)).collect(),
            })
        }

        fn name(&self) -> &str {
            "ordered-stub"
        }
    }

    struct EmptyStub;

    impl IntentClassifier for EmptyStub {
        fn classify(&self, _text: &str, _labels: &[String]) -> Result<Classification> {
            Ok(Classification {
                labels: vec![],
                scores: vec![],
            })
        }

        fn name(&self) -> &str {
            "empty-stub"
        }
    }

    #[test]
    fn test_two_stage_classification() {
        let stub = OrderedStub::new();
        let taxonomy = Taxonomy::default();

        let intent = classify_intent(&stub, &taxonomy, "anything").unwrap();
        assert_eq!(intent.category, "Payment Inquiry");
        assert_eq!(intent.subcategory.as_deref(), Some("Payment Confirmation"));
        assert!(intent.category_confidence > 0.0);
        assert!(intent.subcategory_confidence > 0.0);

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec!["Payment Confirmation", "Payment Delay"]);
    }

    #[test]
    fn test_subclassification_skipped_without_subcategories() {
        let stub = OrderedStub::new();
        let taxonomy = Taxonomy {
            default_team: "Default Team".to_string(),
            categories: vec![CategorySpec {
                name: "General".to_string(),
                team: "Front Desk".to_string(),
                priority: 1,
                keywords: vec![],
                subcategories: Vec::<SubcategorySpec>::new(),
            }],
        };

        let intent = classify_intent(&stub, &taxonomy, "hello").unwrap();
        assert_eq!(intent.category, "General");
        assert_eq!(intent.subcategory, None);
        assert_eq!(intent.subcategory_confidence, 0.0);
        assert_eq!(stub.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_ranking_is_classification_error() {
        let err = classify_intent(&EmptyStub, &Taxonomy::default(), "x").unwrap_err();
        assert!(matches!(err, TriageError::Classification(_)));
    }
}
