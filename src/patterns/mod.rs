//! Pattern registry for configuration-driven lexical extraction
//!
//! This module provides:
//! - Pre-compiled monetary amount and date patterns for context extraction
//! - Entity recognition patterns used by the bundled entity extractor
//!
//! Matching here is pure and deterministic; no model is involved.

use crate::error::{Result, TriageError};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Currency amounts such as "USD 1,200.00"
pub const DEFAULT_AMOUNT_PATTERN: &str = r"USD\s*[\d,]+\.\d{2}";

/// Dates such as "05-JAN-2024"
pub const DEFAULT_DATE_PATTERN: &str = r"\d{1,2}-[A-Z]{3}-\d{4}";

/// Entity pattern configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPatternConfig {
    pub label: String,
    pub pattern: String,
}

/// Pattern configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default = "default_amount_pattern")]
    pub amount: String,
    #[serde(default = "default_date_pattern")]
    pub date: String,
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityPatternConfig>,
}

fn default_amount_pattern() -> String {
    DEFAULT_AMOUNT_PATTERN.to_string()
}

fn default_date_pattern() -> String {
    DEFAULT_DATE_PATTERN.to_string()
}

impl Default for PatternsConfig {
    fn default() -> Self {
        let entity = |label: &str, pattern: &str| EntityPatternConfig {
            label: label.to_string(),
            pattern: pattern.to_string(),
        };

        Self {
            amount: default_amount_pattern(),
            date: default_date_pattern(),
            entities: vec![
                entity("EMAIL", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
                entity(
                    "ACCOUNT",
                    r"(?i)\b(?:account|acct|a/c)\s*(?:no\.?|number|#)?\s*[:#]?\s*\d{6,18}\b",
                ),
                entity("REFERENCE", r"\b[A-Z]{2,5}-\d{5,}\b"),
                entity(
                    "ORG",
                    r"\b[A-Z][A-Za-z&]+(?:\s+[A-Z][A-Za-z&]+)*\s+(?:Bank|Ltd|Inc|LLC|Corp|PLC)\b",
                ),
            ],
        }
    }
}

/// Compiled entity pattern with pre-compiled regex
#[derive(Debug, Clone)]
pub struct CompiledEntityPattern {
    pub label: String,
    pub regex: Regex,
}

/// Pattern registry with all pre-compiled patterns
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    amount: Regex,
    date: Regex,
    /// Entity recognition patterns in declaration order
    pub entities: Vec<CompiledEntityPattern>,
}

impl PatternRegistry {
    /// Build pattern registry from the parsed configuration
    pub fn from_config(config: &PatternsConfig) -> Result<Self> {
        let amount = compile("patterns.amount", &config.amount)?;
        let date = compile("patterns.date", &config.date)?;

        let entities = config
            .entities
            .iter()
            .map(|e| {
                compile(&format!("patterns.entity.{}", e.label), &e.pattern).map(|regex| {
                    CompiledEntityPattern {
                        label: e.label.clone(),
                        regex,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            amount,
            date,
            entities,
        })
    }

    /// All monetary amounts in text, in order of appearance
    pub fn find_amounts(&self, text: &str) -> Vec<String> {
        self.amount
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// All dates in text, in order of appearance
    pub fn find_dates(&self, text: &str) -> Vec<String> {
        self.date
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// All entity matches as (matched text, label, start offset), sorted by position
    pub fn find_entities(&self, text: &str) -> Vec<(String, String, usize)> {
        let mut found: Vec<(String, String, usize)> = self
            .entities
            .iter()
            .flat_map(|pattern| {
                pattern
                    .regex
                    .find_iter(text)
                    .map(|m| (m.as_str().to_string(), pattern.label.clone(), m.start()))
            })
            .collect();
        found.sort_by_key(|(_, _, start)| *start);
        found
    }
}

fn compile(path: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TriageError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Invalid regex: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_registry() -> PatternRegistry {
        PatternRegistry::from_config(&PatternsConfig::default()).unwrap()
    }

    #[test]
    fn test_amount_and_date_extraction() {
        let registry = default_registry();
        let text = "Please confirm my USD 1,200.00 payment on 05-JAN-2024. This is urgent.";

        assert_eq!(registry.find_amounts(text), vec!["USD 1,200.00"]);
        assert_eq!(registry.find_dates(text), vec!["05-JAN-2024"]);
    }

    #[test]
    fn test_amount_requires_two_decimals() {
        let registry = default_registry();
        assert!(registry.find_amounts("USD 1,200 only").is_empty());
        assert_eq!(registry.find_amounts("USD500.25 and USD 7.10"), vec!["USD500.25", "USD 7.10"]);
    }

    #[test]
    fn test_date_is_case_sensitive_month() {
        let registry = default_registry();
        assert!(registry.find_dates("due 5-Jan-2024").is_empty());
        assert_eq!(registry.find_dates("due 5-JAN-2024"), vec!["5-JAN-2024"]);
    }

    #[test]
    fn test_entities_sorted_by_position() {
        let registry = default_registry();
        let text = "Ref INV-20240 from jane.doe@example.com at Northwind Bank";
        let entities = registry.find_entities(text);

        let labels: Vec<&str> = entities.iter().map(|(_, l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["REFERENCE", "EMAIL", "ORG"]);
        assert_eq!(entities[1].0, "jane.doe@example.com");
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let config = PatternsConfig {
            amount: "USD(".to_string(),
            ..PatternsConfig::default()
        };

        match PatternRegistry::from_config(&config) {
            Err(TriageError::InvalidConfigValue { path, .. }) => {
                assert_eq!(path, "patterns.amount")
            }
            other => panic!("expected invalid config value, got {:?}", other.map(|_| ())),
        }
    }
}
