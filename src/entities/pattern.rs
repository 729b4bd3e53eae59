//! Entity recognition driven by configured regex patterns

use super::{Entity, EntityExtractor};
use crate::error::Result;
use crate::patterns::PatternRegistry;
use std::sync::Arc;

/// Entity extractor using PatternRegistry
///
/// Labels and patterns come from `[[patterns.entity]]` in the config file.
pub struct PatternEntityExtractor {
    registry: Arc<PatternRegistry>,
}

impl PatternEntityExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

impl EntityExtractor for PatternEntityExtractor {
    fn extract_entities(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self
            .registry
            .find_entities(text)
            .into_iter()
            .map(|(text, label, _)| Entity { text, label })
            .collect())
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{EntityPatternConfig, PatternsConfig};

    fn create_test_extractor() -> PatternEntityExtractor {
        let config = PatternsConfig {
            entities: vec![
                EntityPatternConfig {
                    label: "EMAIL".to_string(),
                    pattern: r"[a-z.]+@[a-z]+\.[a-z]{2,}".to_string(),
                },
                EntityPatternConfig {
                    label: "REFERENCE".to_string(),
                    pattern: r"\bLN-\d{5,}\b".to_string(),
                },
            ],
            ..PatternsConfig::default()
        };
        let registry = PatternRegistry::from_config(&config).unwrap();
        PatternEntityExtractor::new(Arc::new(registry))
    }

    #[test]
    fn test_extract_basic() {
        let extractor = create_test_extractor();
        let entities = extractor
            .extract_entities("Loan LN-123456 for bob@example.com")
            .unwrap();

        assert_eq!(
            entities,
            vec![
                Entity {
                    text: "LN-123456".to_string(),
                    label: "REFERENCE".to_string()
                },
                Entity {
                    text: "bob@example.com".to_string(),
                    label: "EMAIL".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        let extractor = create_test_extractor();
        assert!(extractor.extract_entities("").unwrap().is_empty());
    }

    #[test]
    fn test_dates_are_not_references_with_default_patterns() {
        let registry = PatternRegistry::from_config(&PatternsConfig::default()).unwrap();
        let extractor = PatternEntityExtractor::new(Arc::new(registry));

        let entities = extractor.extract_entities("due on 05-JAN-2024").unwrap();
        assert!(entities.is_empty());
    }
}
