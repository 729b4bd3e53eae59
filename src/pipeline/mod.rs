//! Batch orchestrator
//!
//! A run goes through two phases:
//! - phase 1, sequential over the batch: extract, classify, extract context and
//!   analyze segments. The classifier and entity extractor are shared instances and
//!   see one call at a time, unless a call was abandoned after a timeout and is
//!   still running alongside the next message's calls.
//! - phase 2, one task per analyzed message on a bounded worker pool: score,
//!   fingerprint, dedup check, store, route and audit (see [`worker`]).
//!
//! Per-message failures are logged with filename and stage and the message is left
//! out of the batch. Only an unreadable input directory or an unusable store
//! schema fails the whole run.

pub mod audit;
pub mod types;
pub mod worker;

pub use audit::AuditLog;
pub use types::{
    AnalyzedMessage, BatchReport, BatchStats, MessageState, RoutingResult, Stage, StageFailure,
};
pub use worker::Finalizer;

use crate::classify::{analyze_segments, classify_intent, IntentClassifier};
use crate::config::{expand_tilde, Config};
use crate::entities::{ContextExtractor, EntityExtractor};
use crate::error::{Result, TriageError};
use crate::message::ComponentExtractor;
use crate::patterns::PatternRegistry;
use crate::routing::{PriorityScorer, Router};
use crate::storage::RecordStore;
use crate::taxonomy::Taxonomy;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Injected collaborators, constructed once at startup
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub entities: Arc<dyn EntityExtractor>,
    pub store: Arc<dyn RecordStore>,
}

/// Two-phase batch pipeline
pub struct Pipeline {
    extractor: ComponentExtractor,
    classifier: Arc<dyn IntentClassifier>,
    context: ContextExtractor,
    taxonomy: Arc<Taxonomy>,
    finalizer: Finalizer,
    workers: usize,
    timeout: Option<Duration>,
    extension: String,
}

impl Pipeline {
    /// Build a pipeline from configuration and the injected collaborators
    pub fn from_config(config: &Config, collaborators: Collaborators) -> Result<Self> {
        info!(
            classifier = collaborators.classifier.name(),
            entities = collaborators.entities.name(),
            "Building pipeline"
        );

        let patterns = Arc::new(PatternRegistry::from_config(&config.patterns)?);
        let taxonomy = Arc::new(config.taxonomy.clone());

        let scorer = PriorityScorer::from_taxonomy(
            &taxonomy,
            config.scoring.default_priority,
            &config.scoring.urgency_keywords,
        );
        let router = Router::from_taxonomy(&taxonomy)?;
        let audit = AuditLog::open(&expand_tilde(&config.output.audit_log))?;

        let finalizer = Finalizer::new(
            Arc::new(scorer),
            Arc::new(router),
            collaborators.store,
            Arc::new(audit),
        );

        Ok(Self {
            extractor: ComponentExtractor::new(),
            classifier: collaborators.classifier,
            context: ContextExtractor::new(collaborators.entities, patterns),
            taxonomy,
            finalizer,
            workers: config.pipeline.worker_count().max(1),
            timeout: config.pipeline.timeout()?,
            extension: config.input.extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every matching message file in `dir`
    pub async fn run(&self, dir: &Path) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", %run_id);
        self.run_batch(dir).instrument(span).await
    }

    /// Run a batch on a dedicated runtime from synchronous code
    ///
    /// The runtime is shut down without waiting on blocking threads, so collaborator
    /// calls abandoned after a timeout cannot hold up the caller once the batch is done.
    pub fn run_blocking(&self, dir: &Path) -> Result<BatchReport> {
        let rt = tokio::runtime::Runtime::new().map_err(|e| TriageError::Io {
            source: e,
            context: "Failed to create tokio runtime".to_string(),
        })?;
        let report = rt.block_on(self.run(dir));
        rt.shutdown_background();
        report
    }

    async fn run_batch(&self, dir: &Path) -> Result<BatchReport> {
        let start = Instant::now();
        let files = self.discover(dir)?;
        info!("Found {} .{} files in {:?}", files.len(), self.extension, dir);

        let store = self.finalizer.store.clone();
        tokio::task::spawn_blocking(move || store.ensure_schema())
            .await
            .map_err(|e| TriageError::Other(anyhow::anyhow!("Schema task failed: {}", e)))??;

        let mut stats = BatchStats {
            discovered: files.len(),
            ..Default::default()
        };

        // Phase 1: one message at a time through the shared collaborators
        let mut analyzed = Vec::with_capacity(files.len());
        for path in &files {
            match self.analyze(path).await {
                Ok(message) => analyzed.push(message),
                Err(failure) => {
                    warn!(
                        file = %failure.file,
                        stage = %failure.stage,
                        state = %MessageState::Skipped,
                        "Skipping message: {}",
                        failure.error
                    );
                    stats.skipped += 1;
                }
            }
        }
        info!(
            "Phase 1 complete: {} analyzed, {} skipped",
            analyzed.len(),
            stats.skipped
        );

        // Phase 2: independent tasks on a bounded pool
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        for message in analyzed {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| TriageError::Other(e.into()))?;
            let finalizer = self.finalizer.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                finalizer.finalize(message)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(result)) => {
                    debug!(
                        file = %result.filename,
                        state = %MessageState::ScoredAndStored,
                        "Message processed"
                    );
                    results.push(result);
                }
                Ok(Err(failure)) => {
                    error!(
                        file = %failure.file,
                        stage = %failure.stage,
                        "Dropping message: {}",
                        failure.error
                    );
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("Worker task did not complete: {}", e);
                    stats.failed += 1;
                }
            }
        }

        stats.processed = results.len();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Batch complete: {} processed, {} skipped, {} failed, {}ms",
            stats.processed, stats.skipped, stats.failed, stats.duration_ms
        );

        Ok(BatchReport { results, stats })
    }

    /// Matching files in `dir`, sorted by name
    fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let input_err = |e: std::io::Error| TriageError::InputDirectory {
            path: dir.to_path_buf(),
            source: e,
        };

        let suffix = format!(".{}", self.extension);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(input_err)? {
            let path = entry.map_err(input_err)?.path();
            let matches = path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(&suffix))
                .unwrap_or(false);
            if matches && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Phase 1 for a single file
    async fn analyze(&self, path: &Path) -> std::result::Result<AnalyzedMessage, StageFailure> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let fail = |stage: Stage| {
            let file = file.clone();
            move |e: TriageError| StageFailure::new(file, stage, e)
        };

        let extractor = self.extractor;
        let owned_path = path.to_path_buf();
        let record = self
            .bounded(Stage::Extract, move || extractor.extract_file(&owned_path))
            .await
            .map_err(fail(Stage::Extract))?;
        debug!(file = %file, state = %MessageState::Extracted, "Extracted");

        let text = Arc::new(record.analysis_text());

        let classifier = self.classifier.clone();
        let taxonomy = self.taxonomy.clone();
        let input = text.clone();
        let intent = self
            .bounded(Stage::Classify, move || {
                classify_intent(classifier.as_ref(), &taxonomy, &input)
            })
            .await
            .map_err(fail(Stage::Classify))?;
        debug!(
            file = %file,
            state = %MessageState::Classified,
            category = %intent.category,
            confidence = intent.category_confidence,
            "Classified"
        );

        let context_extractor = self.context.clone();
        let input = text.clone();
        let context = self
            .bounded(Stage::Context, move || context_extractor.extract(&input))
            .await
            .map_err(fail(Stage::Context))?;
        debug!(
            file = %file,
            state = %MessageState::ContextExtracted,
            entities = context.entities.len(),
            "Context extracted"
        );

        let classifier = self.classifier.clone();
        let labels = self.taxonomy.category_labels();
        let body = record.body.clone();
        let segments = match self
            .bounded(Stage::Segments, move || {
                analyze_segments(classifier.as_ref(), &labels, &body)
            })
            .await
        {
            Ok(segments) => segments,
            Err(e) => {
                warn!(
                    file = %file,
                    stage = %Stage::Segments,
                    "Segment analysis failed, continuing without segments: {}",
                    e
                );
                Vec::new()
            }
        };
        debug!(
            file = %file,
            state = %MessageState::SegmentAnalyzed,
            segments = segments.len(),
            "Segments analyzed"
        );

        Ok(AnalyzedMessage {
            record,
            intent,
            context,
            segments,
        })
    }

    /// Run a collaborator call on a blocking thread, bounded by the configured timeout
    ///
    /// An expired call is abandoned rather than cancelled; its thread runs to completion
    /// in the background.
    async fn bounded<T, F>(&self, stage: Stage, call: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(call);

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
                TriageError::Timeout {
                    stage: stage.to_string(),
                    millis: limit.as_millis() as u64,
                }
            })?,
            None => handle.await,
        };

        joined.map_err(|e| TriageError::Other(anyhow::anyhow!("{} task failed: {}", stage, e)))?
    }
}

/// Write the batch results as a pretty-printed JSON array
pub fn write_results(path: &Path, results: &[RoutingResult]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| TriageError::Io {
                source: e,
                context: format!("Failed to create results directory: {:?}", parent),
            })?;
        }
    }

    let json = serde_json::to_string_pretty(results).map_err(|e| TriageError::Json {
        source: e,
        context: "Failed to serialize results".to_string(),
    })?;

    std::fs::write(path, json).map_err(|e| TriageError::Io {
        source: e,
        context: format!("Failed to write results: {:?}", path),
    })?;

    Ok(())
}
