//! Per-message state and batch result types

use crate::classify::{primary_intent, Intent, SegmentIntent};
use crate::entities::Context;
use crate::error::TriageError;
use crate::message::EmailRecord;
use crate::routing::{Routing, ScoredIntent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage, used to label failures in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Classify,
    Context,
    Segments,
    Store,
    Audit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Classify => "classify",
            Stage::Context => "context",
            Stage::Segments => "segments",
            Stage::Store => "store",
            Stage::Audit => "audit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one message through the batch
///
/// `Extracted -> Classified -> ContextExtracted -> SegmentAnalyzed` happens in
/// phase 1; `ScoredAndStored` in phase 2. `Skipped` is terminal from any phase-1
/// state except `SegmentAnalyzed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Extracted,
    Classified,
    ContextExtracted,
    SegmentAnalyzed,
    ScoredAndStored,
    Skipped,
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageState::Extracted => "extracted",
            MessageState::Classified => "classified",
            MessageState::ContextExtracted => "context_extracted",
            MessageState::SegmentAnalyzed => "segment_analyzed",
            MessageState::ScoredAndStored => "scored_and_stored",
            MessageState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// A per-message error tagged with the file and stage it happened in
#[derive(Debug)]
pub struct StageFailure {
    pub file: String,
    pub stage: Stage,
    pub error: TriageError,
}

impl StageFailure {
    pub fn new(file: impl Into<String>, stage: Stage, error: TriageError) -> Self {
        Self {
            file: file.into(),
            stage,
            error,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed at {}: {}", self.file, self.stage, self.error)
    }
}

/// Phase-1 output handed to a phase-2 worker
#[derive(Debug, Clone)]
pub struct AnalyzedMessage {
    pub record: EmailRecord,
    pub intent: Intent,
    pub context: Context,
    pub segments: Vec<SegmentIntent>,
}

impl AnalyzedMessage {
    /// Highest-confidence segment, absent when the body had no non-empty segments
    pub fn primary_intent(&self) -> Option<&SegmentIntent> {
        primary_intent(&self.segments)
    }
}

/// Externally visible result for one processed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub filename: String,
    pub intent: ScoredIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub context: Context,
    pub is_duplicate: bool,
    pub primary_intent: Option<SegmentIntent>,
    pub all_segment_intents: Vec<SegmentIntent>,
    pub routing: Routing,
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Files matching the extension filter
    pub discovered: usize,
    /// Dropped in phase 1 (extract, classify, context)
    pub skipped: usize,
    /// Dropped in phase 2 (store)
    pub failed: usize,
    /// Results in the batch
    pub processed: usize,
    pub duration_ms: u64,
}

/// Results of a batch run; result order is unspecified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<RoutingResult>,
    pub stats: BatchStats,
}
