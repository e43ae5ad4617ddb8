use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const HISTORY_HEADER: &str = "transcript_length,sentiment_polarity";

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("history io: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only performance log: one `{transcript_length, sentiment_polarity}`
/// row per successfully transcribed request. Rows are never updated or
/// deleted; the header is written once when the file is created.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(
        &self,
        transcript_length: usize,
        sentiment_polarity: f64,
    ) -> Result<(), HistoryError> {
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        if !exists {
            file.write_all(format!("{HISTORY_HEADER}\n").as_bytes())
                .await?;
        }
        file.write_all(format!("{transcript_length},{sentiment_polarity}\n").as_bytes())
            .await?;
        file.flush().await?;
        Ok(())
    }
}
