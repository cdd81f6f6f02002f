//! JSON-lines file store.
//!
//! One serde_json document per line, append-only. A batch is serialized in
//! full before anything touches the file, so an encoding failure commits
//! nothing; the buffered lines then go out in a single write+flush.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;

use super::{RecordStore, StoreError};
use crate::parser::model::LogRecord;

pub struct JsonlStore {
    path: PathBuf,
    // Serializes writers; readers only need the filesystem.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError> {
        let count = records.len();
        if count == 0 {
            return Ok(0);
        }

        let mut buffer = Vec::new();
        for record in &records {
            serde_json::to_writer(&mut buffer, record).map_err(StoreError::Encode)?;
            buffer.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            file.write_all(&buffer)?;
            file.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        Ok(count)
    }

    async fn read_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            // A store that was never written to is empty, not broken.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let record: LogRecord = serde_json::from_str(line)
                .map_err(|source| StoreError::Corrupt { line: i + 1, source })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl RecordStore for JsonlStore {
    fn insert(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.append_batch(vec![record]).await?;
            Ok(())
        })
    }

    fn insert_many(
        &self,
        records: Vec<LogRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
        Box::pin(self.append_batch(records))
    }

    fn scan(&self) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>> {
        Box::pin(self.read_all())
    }
}
