//! User feedback persistence.

use crate::types::{AppError, FeedbackRecord, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Append-only store for feedback records.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record(&self, feedback: &FeedbackRecord) -> Result<()>;
}

/// Appends one JSON object per line to a file.
pub struct JsonlFeedbackSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFeedbackSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FeedbackSink for JsonlFeedbackSink {
    async fn record(&self, feedback: &FeedbackRecord) -> Result<()> {
        let mut line = serde_json::to_string(feedback)
            .map_err(|e| AppError::Internal(format!("Failed to serialize feedback: {}", e)))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create feedback directory: {}", e)))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open feedback file: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write feedback: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write feedback: {}", e)))?;

        info!(rating = feedback.rating, helpful = feedback.helpful, "Feedback received");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedbackInput;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlFeedbackSink::new(dir.path().join("nested").join("feedback.jsonl"));

        for rating in [5, 2] {
            let record: FeedbackRecord = FeedbackInput {
                user_message: "q".into(),
                assistant_response: "a".into(),
                rating,
                comments: String::new(),
                helpful: rating > 3,
            }
            .into();
            sink.record(&record).await.unwrap();
        }

        let content = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let lines: Vec<FeedbackRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].rating, 5);
        assert!(lines[0].helpful);
        assert!(!lines[1].helpful);
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be.
        let sink = JsonlFeedbackSink::new(dir.path());
        let record: FeedbackRecord = FeedbackInput::default().into();
        assert!(sink.record(&record).await.is_err());
    }
}
