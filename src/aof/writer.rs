//! AOF Writer
//!
//! Handles appending records to the log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::AofSyncStrategy;
use crate::error::Result;
use super::Record;

/// Appends records to the AOF
pub struct AofWriter {
    /// Log file opened in append mode
    file: File,

    /// Path of the log file
    path: PathBuf,

    /// When to fsync
    sync_strategy: AofSyncStrategy,

    /// Records written since the last fsync
    uncommitted: usize,

    /// Records written by this writer
    records_written: u64,
}

impl AofWriter {
    /// Open or create the log for appending
    pub fn open(path: &Path, sync_strategy: AofSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            uncommitted: 0,
            records_written: 0,
        })
    }

    /// Append one record as a single line
    ///
    /// The whole line goes out in one `write_all` so a crash can tear at
    /// most the last record.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let mut line = record.to_string();
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;

        self.records_written += 1;
        self.uncommitted += 1;

        let should_sync = match self.sync_strategy {
            AofSyncStrategy::EveryWrite => true,
            AofSyncStrategy::EveryNRecords { count } => self.uncommitted >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Records appended since the last fsync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Records appended by this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
