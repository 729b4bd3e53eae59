//! Multi-request handling: per-paragraph classification of a message body

use super::IntentClassifier;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Classification of a single body segment against the top-level categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentIntent {
    pub segment: String,
    pub category: String,
    pub confidence: f32,
}

/// Split a body on blank-line (`\n\n`) boundaries, dropping whitespace-only segments
///
/// Runs of three or more newlines leave segments that are empty or start with `\n`;
/// empty ones are dropped and the rest are kept verbatim.
pub fn split_segments(body: &str) -> Vec<&str> {
    body.split("\n\n")
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

/// Highest-confidence segment; the first one wins ties
pub fn primary_intent(segments: &[SegmentIntent]) -> Option<&SegmentIntent> {
    let mut best: Option<&SegmentIntent> = None;
    for segment in segments {
        match best {
            Some(current) if segment.confidence <= current.confidence => {}
            _ => best = Some(segment),
        }
    }
    best
}

/// Classify every non-empty segment of `body` against `labels`
///
/// An empty result is not an error: the caller treats the primary intent as absent.
/// A segment the classifier returns no labels for is left out with a warning.
pub fn analyze_segments(
    classifier: &dyn IntentClassifier,
    labels: &[String],
    body: &str,
) -> Result<Vec<SegmentIntent>> {
    let mut intents = Vec::new();

    for segment in split_segments(body) {
        let result = classifier.classify(segment, labels)?;
        match result.top() {
            Some((category, confidence)) => intents.push(SegmentIntent {
                segment: segment.to_string(),
                category: category.to_string(),
                confidence,
            }),
            None => warn!(
                classifier = classifier.name(),
                "Segment returned no labels, leaving it out: {:?}",
                segment
            ),
        }
    }

    Ok(intents)
}
