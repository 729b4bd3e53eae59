use crate::config::{parse_duration, Config};
use crate::error::{Result, TriageError, ValidationError};
use crate::patterns::PatternRegistry;
use ahash::AHashSet;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        // Validate schema version
        Self::validate_schema_version(config, &mut errors);

        // Validate input filter
        Self::validate_input(config, &mut errors);

        // Validate storage settings
        Self::validate_storage(config, &mut errors);

        // Validate pipeline settings
        Self::validate_pipeline(config, &mut errors);

        // Validate scoring settings
        Self::validate_scoring(config, &mut errors);

        // Validate regexes compile
        Self::validate_patterns(config, &mut errors);

        // Validate category tables
        Self::validate_taxonomy(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TriageError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_input(config: &Config, errors: &mut Vec<ValidationError>) {
        let ext = config.input.extension.trim_start_matches('.');
        if ext.is_empty() {
            errors.push(ValidationError::new(
                "input.extension",
                "Extension cannot be empty",
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.pool_size == 0 {
            errors.push(ValidationError::new(
                "storage.pool_size",
                "Pool size must be greater than 0",
            ));
        }

        if config.storage.database.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.database",
                "Database path cannot be empty",
            ));
        }
    }

    fn validate_pipeline(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Some(timeout) = &config.pipeline.collaborator_timeout {
            match parse_duration(timeout) {
                Some(d) if !d.is_zero() => {}
                _ => errors.push(ValidationError::new(
                    "pipeline.collaborator_timeout",
                    format!("Invalid duration format: {}", timeout),
                )),
            }
        }
    }

    fn validate_scoring(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.scoring.urgency_keywords.is_empty()
            || config
                .scoring
                .urgency_keywords
                .iter()
                .any(|k| k.trim().is_empty())
        {
            errors.push(ValidationError::new(
                "scoring.urgency_keywords",
                "Urgency keywords must be non-empty strings",
            ));
        }
    }

    fn validate_patterns(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Err(e) = PatternRegistry::from_config(&config.patterns) {
            match e {
                TriageError::InvalidConfigValue { path, message } => {
                    errors.push(ValidationError::new(path, message))
                }
                other => errors.push(ValidationError::new("patterns", other.to_string())),
            }
        }
    }

    fn validate_taxonomy(config: &Config, errors: &mut Vec<ValidationError>) {
        let taxonomy = &config.taxonomy;

        if taxonomy.default_team.trim().is_empty() {
            errors.push(ValidationError::new(
                "taxonomy.default_team",
                "Default team cannot be empty",
            ));
        }

        if taxonomy.categories.is_empty() {
            errors.push(ValidationError::new(
                "taxonomy.category",
                "At least one category is required",
            ));
        }

        let mut seen = AHashSet::new();
        for (i, category) in taxonomy.categories.iter().enumerate() {
            let path = format!("taxonomy.category[{}]", i);

            if category.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{}.name", path),
                    "Category name cannot be empty",
                ));
            } else if !seen.insert(category.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("{}.name", path),
                    format!("Duplicate category: {}", category.name),
                ));
            }

            if category.team.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{}.team", path),
                    format!("Category '{}' has no team", category.name),
                ));
            }

            if category
                .subcategories
                .iter()
                .any(|s| s.name.trim().is_empty())
            {
                errors.push(ValidationError::new(
                    format!("{}.subcategory", path),
                    "Subcategory name cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(TriageError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_schema_version() {
        let mut config = Config::default();
        config.meta.schema_version = "2.0.0".to_string();
        assert_eq!(error_paths(&config), vec!["_meta.schema_version"]);
    }

    #[test]
    fn test_zero_pool_size() {
        let mut config = Config::default();
        config.storage.pool_size = 0;
        assert_eq!(error_paths(&config), vec!["storage.pool_size"]);
    }

    #[test]
    fn test_bad_timeout() {
        let mut config = Config::default();
        config.pipeline.collaborator_timeout = Some("forever".to_string());
        assert_eq!(error_paths(&config), vec!["pipeline.collaborator_timeout"]);

        config.pipeline.collaborator_timeout = Some("0s".to_string());
        assert_eq!(error_paths(&config), vec!["pipeline.collaborator_timeout"]);
    }

    #[test]
    fn test_bad_regex() {
        let mut config = Config::default();
        config.patterns.amount = "USD (".to_string();
        assert_eq!(error_paths(&config), vec!["patterns.amount"]);
    }

    #[test]
    fn test_duplicate_category_and_empty_team() {
        let mut config = Config::default();
        let mut dup = config.taxonomy.categories[0].clone();
        dup.team = String::new();
        config.taxonomy.categories.push(dup);

        let paths = error_paths(&config);
        assert!(paths.contains(&"taxonomy.category[3].name".to_string()));
        assert!(paths.contains(&"taxonomy.category[3].team".to_string()));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.input.extension = String::new();
        config.scoring.urgency_keywords.clear();
        config.taxonomy.default_team = " ".to_string();

        let paths = error_paths(&config);
        assert_eq!(paths.len(), 3);
    }
}
