//! Append-only classification decision log

use crate::classify::Intent;
use crate::error::{Result, TriageError};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Shared audit log; each entry is written with a single `write_all` under the lock
/// so entries from concurrent workers never interleave.
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TriageError::Io {
                    source: e,
                    context: format!("Failed to create audit log directory: {:?}", parent),
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| TriageError::Io {
                source: e,
                context: format!("Failed to open audit log: {:?}", path),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the decision for one message
    pub fn record(&self, filename: &str, intent: &Intent) -> Result<()> {
        let entry = format_entry(Local::now(), filename, intent);

        let mut file = self
            .file
            .lock()
            .map_err(|_| TriageError::Other(anyhow::anyhow!("Audit log lock poisoned")))?;
        file.write_all(entry.as_bytes()).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to append to audit log: {:?}", self.path),
        })?;

        Ok(())
    }
}

/// Render one entry; confidences are shown as percentages with two decimals and
/// the entry ends with a blank line
pub fn format_entry(timestamp: DateTime<Local>, filename: &str, intent: &Intent) -> String {
    let mut entry = format!(
        "{} - Email: {}, Intent: {}, Confidence: {:.2}%\n",
        timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
        filename,
        intent.category,
        intent.category_confidence * 100.0
    );

    if let Some(sub) = &intent.subcategory {
        entry.push_str(&format!(
            "Sub-Intent: {}, Sub-Confidence: {:.2}%\n",
            sub,
            intent.subcategory_confidence * 100.0
        ));
    }

    entry.push('\n');
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn intent(subcategory: Option<&str>) -> Intent {
        Intent {
            category: "Payment Inquiry".to_string(),
            category_confidence: 0.8734,
            subcategory: subcategory.map(str::to_string),
            subcategory_confidence: if subcategory.is_some() { 0.5 } else { 0.0 },
        }
    }

    #[test]
    fn test_format_entry_with_sub_intent() {
        let ts = Local.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        let entry = format_entry(ts, "a.eml", &intent(Some("Payment Delay")));

        assert_eq!(
            entry,
            "2024-01-05 09:30:00.000000 - Email: a.eml, Intent: Payment Inquiry, Confidence: 87.34%\n\
             Sub-Intent: Payment Delay, Sub-Confidence: 50.00%\n\n"
        );
    }

    #[test]
    fn test_format_entry_without_sub_intent() {
        let ts = Local.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        let entry = format_entry(ts, "b.eml", &intent(None));

        assert!(entry.ends_with("Confidence: 87.34%\n\n"));
        assert!(!entry.contains("Sub-Intent"));
    }

    #[test]
    fn test_record_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("audit.txt");

        let log = AuditLog::open(&path).unwrap();
        log.record("a.eml", &intent(None)).unwrap();
        log.record("b.eml", &intent(None)).unwrap();
        drop(log);

        // Reopening appends rather than truncating
        let log = AuditLog::open(&path).unwrap();
        log.record("c.eml", &intent(None)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Email: ").count(), 3);
        assert!(content.contains("Email: c.eml"));
    }
}
