//! Batch import and round-trip export.
//!
//! Import parses every line before anything is inserted, then commits the
//! whole batch through one `insert_many` call — a failed batch leaves the
//! store untouched. What happens to unparsable lines is the caller's
//! policy, not the parser's: skip (and tally) or abort the batch.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::parser::model::{LogRecord, ParseError};
use crate::parser::parse_line;
use crate::store::{RecordStore, StoreError};

/// What to do with a line the parser rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop the line, log it at warn, keep importing.
    #[default]
    Skip,
    /// Reject the whole batch on the first bad line; nothing is committed.
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(FailurePolicy::Skip),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!("on_failure must be 'skip' or 'abort', got {:?}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Line {line}: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line the parser rejected, kept verbatim for the caller.
#[derive(Debug)]
pub struct ParseFailure {
    /// 1-based line number within the batch.
    pub line: usize,
    pub raw: String,
    pub error: ParseError,
}

#[derive(Debug)]
pub struct ImportReport {
    pub inserted: usize,
    pub failures: Vec<ParseFailure>,
    pub elapsed: Duration,
}

/// Parse a batch of raw lines and append the records in one atomic batch.
pub async fn import_lines<I, S>(
    store: &dyn RecordStore,
    lines: I,
    policy: FailurePolicy,
) -> Result<ImportReport, ImportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let started = Instant::now();

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (i, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        let line = i + 1;
        match parse_line(raw) {
            Ok(record) => records.push(record),
            Err(error) => match policy {
                FailurePolicy::Abort => {
                    return Err(ImportError::Rejected { line, source: error });
                }
                FailurePolicy::Skip => {
                    warn!(line, %error, "skipping unparsable log line");
                    failures.push(ParseFailure {
                        line,
                        raw: raw.to_string(),
                        error,
                    });
                }
            },
        }
    }

    let inserted = store.insert_many(records).await?;
    let elapsed = started.elapsed();
    info!(
        inserted,
        skipped = failures.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "import complete"
    );

    Ok(ImportReport {
        inserted,
        failures,
        elapsed,
    })
}

/// Import an access-log file line by line.
pub async fn import_file(
    store: &dyn RecordStore,
    path: &Path,
    policy: FailurePolicy,
) -> Result<ImportReport, ImportError> {
    let contents = tokio::fs::read_to_string(path).await?;
    import_lines(store, contents.lines(), policy).await
}

/// Render every stored record back into access-log lines and write them to
/// `path`. Re-importing the written file reproduces the records exactly.
pub async fn export_file(store: &dyn RecordStore, path: &Path) -> Result<usize, ImportError> {
    let started = Instant::now();
    let records = store.scan().await?;

    let mut out = String::new();
    for record in &records {
        out.push_str(&record.to_access_log_line());
        out.push('\n');
    }
    tokio::fs::write(path, out).await?;

    info!(
        exported = records.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "export complete"
    );
    Ok(records.len())
}
