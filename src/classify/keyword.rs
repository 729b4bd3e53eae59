//! Keyword-frequency classifier
//!
//! Scores each candidate label by how often its keywords occur in the text and
//! normalizes the add-one smoothed counts into a distribution. Labels without a
//! keyword entry receive only the smoothing mass.

use super::{Classification, IntentClassifier};
use crate::error::{Result, TriageError};
use crate::taxonomy::Taxonomy;
use ahash::AHashMap;

pub struct KeywordClassifier {
    keywords: AHashMap<String, Vec<String>>,
}

impl KeywordClassifier {
    /// Build from explicit (label, keywords) pairs; keywords match case-insensitively
    ///
    /// Repeated labels (e.g. a sub-category reused under two categories) have their
    /// keyword lists merged.
    pub fn new(table: Vec<(String, Vec<String>)>) -> Self {
        let mut keywords: AHashMap<String, Vec<String>> = AHashMap::new();
        for (label, words) in table {
            let entry = keywords.entry(label).or_default();
            for word in words {
                let word = word.to_lowercase();
                if !word.is_empty() && !entry.contains(&word) {
                    entry.push(word);
                }
            }
        }

        Self { keywords }
    }

    /// Build from the keyword hints declared in the taxonomy
    pub fn from_taxonomy(taxonomy: &Taxonomy) -> Self {
        Self::new(taxonomy.keyword_table())
    }

    fn hits(&self, label: &str, text: &str) -> usize {
        self.keywords
            .get(label)
            .map(|words| words.iter().map(|w| text.matches(w.as_str()).count()).sum())
            .unwrap_or(0)
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str, labels: &[String]) -> Result<Classification> {
        if labels.is_empty() {
            return Err(TriageError::Classification(
                "No candidate labels supplied".to_string(),
            ));
        }

        let lowered = text.to_lowercase();
        let weights: Vec<f32> = labels
            .iter()
            .map(|label| (self.hits(label, &lowered) + 1) as f32)
            .collect();
        let total: f32 = weights.iter().sum();

        let mut ranked: Vec<(usize, f32)> = weights
            .iter()
            .enumerate()
            .map(|(idx, w)| (idx, w / total))
            .collect();
        // Stable sort keeps candidate order for equal scores
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(Classification {
            labels: ranked.iter().map(|(idx, _)| labels[*idx].clone()).collect(),
            scores: ranked.iter().map(|(_, score)| *score).collect(),
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(taxonomy: &Taxonomy) -> Vec<String> {
        taxonomy.category_labels()
    }

    #[test]
    fn test_payment_text_ranks_payment_first() {
        let taxonomy = Taxonomy::default();
        let classifier = KeywordClassifier::from_taxonomy(&taxonomy);
        let text = "Payment confirmation needed Please confirm my USD 1,200.00 payment on 05-JAN-2024. This is urgent.";

        let result = classifier.classify(text, &labels(&taxonomy)).unwrap();
        assert_eq!(result.labels[0], "Payment Inquiry");
        assert!(result.scores[0] > result.scores[1]);

        let sub = classifier
            .classify(text, &taxonomy.subcategory_labels("Payment Inquiry"))
            .unwrap();
        assert_eq!(sub.labels[0], "Payment Confirmation");
    }

    #[test]
    fn test_scores_form_a_distribution() {
        let taxonomy = Taxonomy::default();
        let classifier = KeywordClassifier::from_taxonomy(&taxonomy);

        let result = classifier
            .classify("please extend my loan term", &labels(&taxonomy))
            .unwrap();
        let sum: f32 = result.scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(result.scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(result.labels[0], "Loan Request");
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let classifier = KeywordClassifier::new(vec![]);
        let candidates = vec!["B".to_string(), "A".to_string(), "C".to_string()];

        let result = classifier.classify("nothing relevant", &candidates).unwrap();
        assert_eq!(result.labels, candidates);
        assert!((result.scores[0] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_keywords_match_case_insensitively() {
        let classifier = KeywordClassifier::new(vec![(
            "Loan Request".to_string(),
            vec!["LOAN".to_string()],
        )]);
        let candidates = vec!["Account Update".to_string(), "Loan Request".to_string()];

        let result = classifier.classify("Loan loan", &candidates).unwrap();
        assert_eq!(result.labels[0], "Loan Request");
        assert!((result.scores[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_label_merges_keywords() {
        let classifier = KeywordClassifier::new(vec![
            ("Other".to_string(), vec!["misc".to_string()]),
            ("Loan Request".to_string(), vec!["loan".to_string()]),
            ("Other".to_string(), vec!["general".to_string(), "MISC".to_string()]),
        ]);
        let candidates = vec!["Loan Request".to_string(), "Other".to_string()];

        // Both lists count: "misc" once (deduplicated) plus "general" once
        let result = classifier.classify("misc general", &candidates).unwrap();
        assert_eq!(result.labels[0], "Other");
        assert!((result.scores[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_no_labels_is_error() {
        let classifier = KeywordClassifier::new(vec![]);
        assert!(classifier.classify("text", &[]).is_err());
    }
}
