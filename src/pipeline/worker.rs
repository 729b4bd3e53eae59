//! Phase-2 worker: score, fingerprint, dedup, store, route and audit one message
//!
//! Runs on a blocking thread. Each call opens its own store session and either
//! commits it or drops it (rolling back), so no connection outlives the task.

use super::audit::AuditLog;
use super::types::{AnalyzedMessage, RoutingResult, Stage, StageFailure};
use crate::error::TriageError;
use crate::routing::{PriorityScorer, Router};
use crate::storage::{fingerprint, RecordStore, StoredRecord};
use std::sync::Arc;
use tracing::{debug, error};

/// Everything a phase-2 task needs; cloned cheaply into each task
#[derive(Clone)]
pub struct Finalizer {
    pub(crate) scorer: Arc<PriorityScorer>,
    pub(crate) router: Arc<Router>,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) audit: Arc<AuditLog>,
}

impl Finalizer {
    pub fn new(
        scorer: Arc<PriorityScorer>,
        router: Arc<Router>,
        store: Arc<dyn RecordStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            scorer,
            router,
            store,
            audit,
        }
    }

    /// Finish one analyzed message
    ///
    /// Store failures drop the message. A failed audit write is logged but the
    /// result is kept, since the record is already committed by then.
    pub fn finalize(&self, message: AnalyzedMessage) -> Result<RoutingResult, StageFailure> {
        let file = message.record.id.as_str();
        let store_err = |e: TriageError| StageFailure::new(file, Stage::Store, e);

        let scored = self.scorer.score(
            &message.intent.category,
            message.intent.category_confidence,
            &message.record.body,
        );
        debug!(file, priority = scored.priority, "Priority assigned");

        let fp = fingerprint(&message.record.subject, &message.record.body);

        let context_json = serde_json::to_string(&message.context).map_err(|e| {
            store_err(TriageError::Json {
                source: e,
                context: "Failed to serialize context".to_string(),
            })
        })?;

        let mut session = self.store.open_session().map_err(store_err)?;
        let is_duplicate = session.exists(&fp).map_err(store_err)?;
        debug!(file, fingerprint = %fp, is_duplicate, "Duplicate check");

        session
            .insert(&StoredRecord {
                filename: message.record.id.clone(),
                sender: message.record.from.clone(),
                category: message.intent.category.clone(),
                subcategory: message.intent.subcategory.clone(),
                confidence: message.intent.category_confidence,
                context: context_json,
                fingerprint: fp,
            })
            .map_err(store_err)?;

        let routing = self.router.route(&scored.category);
        debug!(file, team = %routing.team, "Routed");

        session.commit().map_err(store_err)?;

        if let Err(e) = self.audit.record(file, &message.intent) {
            error!(file, stage = %Stage::Audit, "Audit log write failed: {}", e);
        }

        let primary = message.primary_intent().cloned();
        let AnalyzedMessage {
            record,
            intent,
            context,
            segments,
        } = message;

        Ok(RoutingResult {
            filename: record.id,
            intent: scored,
            subcategory: intent.subcategory,
            context,
            is_duplicate,
            primary_intent: primary,
            all_segment_intents: segments,
            routing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Intent, SegmentIntent};
    use crate::entities::Context;
    use crate::message::EmailRecord;
    use crate::storage::MemoryRecordStore;
    use crate::taxonomy::Taxonomy;
    use tempfile::TempDir;

    fn finalizer(store: Arc<dyn RecordStore>, dir: &TempDir) -> Finalizer {
        let taxonomy = Taxonomy::default();
        let keywords = vec!["urgent".to_string(), "immediate".to_string()];
        Finalizer::new(
            Arc::new(PriorityScorer::from_taxonomy(&taxonomy, 1, &keywords)),
            Arc::new(Router::from_taxonomy(&taxonomy).unwrap()),
            store,
            Arc::new(AuditLog::open(&dir.path().join("audit.txt")).unwrap()),
        )
    }

    fn message(id: &str, body: &str, segments: Vec<SegmentIntent>) -> AnalyzedMessage {
        AnalyzedMessage {
            record: EmailRecord {
                id: id.to_string(),
                from: "jane@example.com".to_string(),
                subject: "Loan".to_string(),
                body: body.to_string(),
                attachments: vec![],
            },
            intent: Intent {
                category: "Loan Request".to_string(),
                category_confidence: 0.7,
                subcategory: Some("New Loan".to_string()),
                subcategory_confidence: 0.6,
            },
            context: Context::default(),
            segments,
        }
    }

    #[test]
    fn test_finalize_scores_routes_and_stores() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryRecordStore::new());
        let worker = finalizer(store.clone(), &temp_dir);

        let segments = vec![
            SegmentIntent {
                segment: "a".to_string(),
                category: "Loan Request".to_string(),
                confidence: 0.4,
            },
            SegmentIntent {
                segment: "b".to_string(),
                category: "Account Update".to_string(),
                confidence: 0.9,
            },
        ];
        let result = worker
            .finalize(message("a.eml", "Immediate loan needed", segments))
            .unwrap();

        assert_eq!(result.intent.priority, 3);
        assert_eq!(result.routing.team, "Loan Processing Team");
        assert_eq!(result.subcategory.as_deref(), Some("New Loan"));
        assert!(!result.is_duplicate);
        assert_eq!(result.primary_intent.unwrap().category, "Account Update");
        assert_eq!(result.all_segment_intents.len(), 2);

        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sender, "jane@example.com");
        assert_eq!(records[0].subcategory.as_deref(), Some("New Loan"));
    }

    #[test]
    fn test_second_identical_message_is_duplicate_and_stored() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryRecordStore::new());
        let worker = finalizer(store.clone(), &temp_dir);

        let first = worker.finalize(message("a.eml", "body", vec![])).unwrap();
        let second = worker.finalize(message("b.eml", "body", vec![])).unwrap();

        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert!(second.primary_intent.is_none());
        assert_eq!(store.count().unwrap(), 2);
    }

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn ensure_schema(&self) -> crate::error::Result<()> {
            Ok(())
        }

        fn open_session(&self) -> crate::error::Result<Box<dyn crate::storage::StoreSession + '_>> {
            Err(TriageError::Store("connection refused".to_string()))
        }

        fn count(&self) -> crate::error::Result<usize> {
            Ok(0)
        }

        fn count_fingerprint(&self, _fingerprint: &str) -> crate::error::Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_store_failure_is_tagged() {
        let temp_dir = TempDir::new().unwrap();
        let worker = finalizer(Arc::new(BrokenStore), &temp_dir);

        let failure = worker.finalize(message("a.eml", "body", vec![])).unwrap_err();
        assert_eq!(failure.file, "a.eml");
        assert_eq!(failure.stage, Stage::Store);
        assert!(matches!(failure.error, TriageError::Store(_)));
    }
}
