//! Journal sinks.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{JournalError, JournalResult};
use crate::record::{OperationKind, OperationRecord};

/// Append-only outcome sink.
pub trait Journal: Send + Sync {
    fn append(&self, record: &OperationRecord) -> JournalResult<()>;

    /// Record an outcome now. A write failure is logged and swallowed so
    /// journaling never changes the result of the operation it describes.
    fn record(
        &self,
        kind: OperationKind,
        subject: Option<&str>,
        success: bool,
        detail: Option<&str>,
    ) {
        let record = OperationRecord::now(kind, subject, success, detail);
        if let Err(e) = self.append(&record) {
            warn!(kind = %kind, error = %e, "failed to write journal entry");
        }
    }
}

/// Writes `ea_manager_{YYYY-MM-DD}.log` files under a directory, one file
/// per calendar day of the record's timestamp.
#[derive(Debug)]
pub struct FileJournal {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("ea_manager_{}.log", date.format("%Y-%m-%d")))
    }
}

impl Journal for FileJournal {
    fn append(&self, record: &OperationRecord) -> JournalResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        fs::create_dir_all(&self.dir).map_err(|source| JournalError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(record.timestamp.date());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| JournalError::Io {
                path: path.clone(),
                source,
            })?;

        let mut line = record.render();
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|source| JournalError::Io { path, source })
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Mutex<Vec<OperationRecord>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<OperationRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(OperationRecord::render).collect()
    }
}

impl Journal for MemoryJournal {
    fn append(&self, record: &OperationRecord) -> JournalResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
