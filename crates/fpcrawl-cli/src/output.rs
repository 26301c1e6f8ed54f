//! JSON Lines record output.

use std::path::Path;

use fpcrawl_core::ProductRecord;
use fpcrawl_scraper::{RecordSink, ScraperError};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

type Writer = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Writes one serialized [`ProductRecord`] per line.
pub(crate) struct JsonLinesSink {
    writer: Mutex<Writer>,
}

impl JsonLinesSink {
    pub(crate) fn stdout() -> Self {
        Self::from_writer(tokio::io::stdout())
    }

    /// Create (or truncate) `path` and write records to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub(crate) async fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::from_writer(file))
    }

    fn from_writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        let writer: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    pub(crate) async fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().await.flush().await
    }
}

impl RecordSink for JsonLinesSink {
    async fn accept(&self, record: ProductRecord) -> Result<(), ScraperError> {
        let mut line = serde_json::to_vec(&record).map_err(|e| ScraperError::Sink {
            reason: format!("failed to serialize record: {e}"),
        })?;
        line.push(b'\n');
        self.writer
            .lock()
            .await
            .write_all(&line)
            .await
            .map_err(|e| ScraperError::Sink {
                reason: format!("failed to write record: {e}"),
            })
    }
}
