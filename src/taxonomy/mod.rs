//! Request taxonomy: categories, sub-categories, destination teams and base priorities
//!
//! These tables are static configuration data. They are loaded from the `[taxonomy]`
//! section of the config file, and default to the three banking request categories.

use serde::{Deserialize, Serialize};

/// Team used when a category has no explicit routing entry
pub const DEFAULT_TEAM: &str = "Default Team";

/// Second-level classification label with its keyword hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategorySpec {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Top-level request category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    /// Destination team for requests of this category
    pub team: String,
    /// Base priority before urgency adjustment
    pub priority: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, rename = "subcategory")]
    pub subcategories: Vec<SubcategorySpec>,
}

impl CategorySpec {
    fn new(
        name: &str,
        team: &str,
        priority: u32,
        keywords: &[&str],
        subcategories: &[(&str, &[&str])],
    ) -> Self {
        Self {
            name: name.to_string(),
            team: team.to_string(),
            priority,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            subcategories: subcategories
                .iter()
                .map(|(name, keywords)| SubcategorySpec {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// The full two-level classification taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default = "default_team")]
    pub default_team: String,
    #[serde(rename = "category")]
    pub categories: Vec<CategorySpec>,
}

fn default_team() -> String {
    DEFAULT_TEAM.to_string()
}

impl Taxonomy {
    /// Top-level candidate labels in declaration order
    pub fn category_labels(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a category by name
    pub fn category(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Sub-category labels for a category; empty when the category is unknown
    /// or declares no sub-categories
    pub fn subcategory_labels(&self, category: &str) -> Vec<String> {
        self.category(category)
            .map(|c| c.subcategories.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Every (label, keywords) pair across both levels
    pub fn keyword_table(&self) -> Vec<(String, Vec<String>)> {
        let mut table = Vec::new();
        for category in &self.categories {
            table.push((category.name.clone(), category.keywords.clone()));
            for sub in &category.subcategories {
                table.push((sub.name.clone(), sub.keywords.clone()));
            }
        }
        table
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            default_team: default_team(),
            categories: vec![
                CategorySpec::new(
                    "Payment Inquiry",
                    "Finance Team",
                    3,
                    &["payment", "paid", "pay", "invoice", "transaction", "remittance"],
                    &[
                        (
                            "Payment Confirmation",
                            &["confirm", "confirmation", "received", "receipt", "proof"],
                        ),
                        (
                            "Payment Delay",
                            &["delay", "delayed", "late", "overdue", "pending", "not received"],
                        ),
                    ],
                ),
                CategorySpec::new(
                    "Loan Request",
                    "Loan Processing Team",
                    2,
                    &["loan", "borrow", "credit", "financing", "facility", "mortgage"],
                    &[
                        (
                            "New Loan",
                            &["new", "apply", "application", "request a loan", "borrow"],
                        ),
                        (
                            "Loan Extension",
                            &["extend", "extension", "term", "tenor", "rollover"],
                        ),
                    ],
                ),
                CategorySpec::new(
                    "Account Update",
                    "Customer Support Team",
                    1,
                    &["account", "update", "change", "details", "profile", "modify"],
                    &[
                        (
                            "Address Change",
                            &["address", "moved", "relocated", "street", "postal"],
                        ),
                        (
                            "Contact Details Change",
                            &["phone", "email", "contact", "mobile", "number"],
                        ),
                    ],
                ),
            ],
        }
    }
}
