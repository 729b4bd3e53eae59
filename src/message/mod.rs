//! Parsed email messages
//!
//! An `EmailRecord` is produced once by the component extractor and never mutated
//! afterwards; every later stage borrows it.

mod extractor;

pub use extractor::ComponentExtractor;

use serde::{Deserialize, Serialize};

/// Named binary attachment carried by a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Subject/body/attachments tuple extracted from a raw message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    /// Source file name, used as the message id throughout the pipeline
    pub id: String,
    /// First From address, empty when absent
    pub from: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailRecord {
    /// Text handed to the classifier and the context extractor
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_text_joins_subject_and_body() {
        let record = EmailRecord {
            id: "a.eml".to_string(),
            from: String::new(),
            subject: "Loan".to_string(),
            body: "Need an extension".to_string(),
            attachments: vec![],
        };
        assert_eq!(record.analysis_text(), "Loan Need an extension");
    }
}
