//! Context extraction: named entities plus pattern-matched amounts and dates
//!
//! Entity recognition is an external collaborator behind `EntityExtractor`.
//! Amounts and dates come from the pattern registry and never involve a model.

mod pattern;

pub use pattern::PatternEntityExtractor;

use crate::error::Result;
use crate::patterns::PatternRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Recognized entity span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// Structured context of one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub entities: Vec<Entity>,
    pub amounts: Vec<String>,
    pub dates: Vec<String>,
}

/// Named-entity recognizer collaborator
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> Result<Vec<Entity>>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}

/// Combines the entity collaborator with lexical amount/date patterns
#[derive(Clone)]
pub struct ContextExtractor {
    entities: Arc<dyn EntityExtractor>,
    patterns: Arc<PatternRegistry>,
}

impl ContextExtractor {
    pub fn new(entities: Arc<dyn EntityExtractor>, patterns: Arc<PatternRegistry>) -> Self {
        Self { entities, patterns }
    }

    /// Extract the full context of `text`
    ///
    /// Entity extraction failure fails the whole step; no partial context is returned.
    pub fn extract(&self, text: &str) -> Result<Context> {
        let amounts = self.patterns.find_amounts(text);
        let dates = self.patterns.find_dates(text);
        let entities = self.entities.extract_entities(text)?;

        Ok(Context {
            entities,
            amounts,
            dates,
        })
    }
}
