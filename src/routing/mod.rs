//! Routing and prioritization of classified requests
//!
//! - `Router`: category to destination team, with an explicit default team
//! - `PriorityScorer`: base priority per category plus urgency adjustment

mod priority;

pub use priority::{PriorityScorer, ScoredIntent, DEFAULT_URGENCY_KEYWORDS};

use crate::error::{Result, TriageError};
use crate::taxonomy::Taxonomy;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Routing decision attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    pub team: String,
}

/// Total category-to-team lookup
#[derive(Debug, Clone)]
pub struct Router {
    teams: AHashMap<String, String>,
    default_team: String,
}

impl Router {
    /// Build the routing table; every team name must be non-empty so that
    /// `route` can never produce an empty destination
    pub fn new(
        entries: impl IntoIterator<Item = (String, String)>,
        default_team: impl Into<String>,
    ) -> Result<Self> {
        let default_team = default_team.into();
        if default_team.trim().is_empty() {
            return Err(TriageError::Routing("Default team is empty".to_string()));
        }

        let mut teams = AHashMap::new();
        for (category, team) in entries {
            if team.trim().is_empty() {
                return Err(TriageError::Routing(format!(
                    "Category '{}' routes to an empty team",
                    category
                )));
            }
            teams.insert(category, team);
        }

        Ok(Self {
            teams,
            default_team,
        })
    }

    pub fn from_taxonomy(taxonomy: &Taxonomy) -> Result<Self> {
        Self::new(
            taxonomy
                .categories
                .iter()
                .map(|c| (c.name.clone(), c.team.clone())),
            taxonomy.default_team.clone(),
        )
    }

    /// Destination team for a category; unmapped categories go to the default team
    pub fn route(&self, category: &str) -> Routing {
        let team = self
            .teams
            .get(category)
            .unwrap_or(&self.default_team)
            .clone();
        Routing { team }
    }

    pub fn default_team(&self) -> &str {
        &self.default_team
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_known_categories() {
        let router = Router::from_taxonomy(&Taxonomy::default()).unwrap();

        assert_eq!(router.route("Payment Inquiry").team, "Finance Team");
        assert_eq!(router.route("Loan Request").team, "Loan Processing Team");
        assert_eq!(router.route("Account Update").team, "Customer Support Team");
    }

    #[test]
    fn test_routing_is_total() {
        let taxonomy = Taxonomy::default();
        let router = Router::from_taxonomy(&taxonomy).unwrap();

        for label in taxonomy.category_labels() {
            assert!(!router.route(&label).team.is_empty());
        }
        assert_eq!(router.route("Wire Transfer").team, "Default Team");
        assert_eq!(router.route("").team, router.default_team());
    }

    #[test]
    fn test_empty_team_rejected_at_construction() {
        let err = Router::new(
            vec![("Payment Inquiry".to_string(), " ".to_string())],
            "Default Team",
        )
        .unwrap_err();
        assert!(matches!(err, TriageError::Routing(_)));

        assert!(Router::new(Vec::new(), "").is_err());
    }
}
