use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One evaluated question, persisted as a JSONL row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub model_id: String,
    pub agent_action_type: String,
    pub original_question: String,
    pub answer: String,
    #[serde(default)]
    pub answers: Vec<String>,
    pub true_answer: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub token_counts: u64,
}

/// Append-only answer log shared by concurrent eval workers. The mutex
/// serializes each write-then-flush so rows never interleave.
pub struct AnswerLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AnswerLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AnswerLog {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &AnswerRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    /// Questions already answered in this log, for resuming a partial run.
    pub async fn answered_questions(&self) -> anyhow::Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut questions = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            let record: AnswerRecord = serde_json::from_str(line)?;
            questions.push(record.original_question);
        }
        Ok(questions)
    }
}
