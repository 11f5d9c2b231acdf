//! Step logger.
//!
//! Buffered, line-oriented writer for step records. Opens in append or
//! truncate mode as configured by the caller and flushes on drop.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::record::StepRecord;

/// Writes step records to a text log, one line per record.
pub struct StepLogger {
    writer: Option<BufWriter<File>>,
    record_count: u64,
}

impl StepLogger {
    /// Create a logger writing to the given path.
    ///
    /// With `append` set, records accumulate across runs; otherwise any
    /// existing log is truncated.
    pub fn new(path: impl AsRef<Path>, append: bool) -> std::io::Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            record_count: 0,
        })
    }

    /// Create a logger that discards records (for testing).
    pub fn null() -> Self {
        Self {
            writer: None,
            record_count: 0,
        }
    }

    /// Number of records logged so far.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Log a single record.
    pub fn log(&mut self, record: &StepRecord) -> std::io::Result<()> {
        self.record_count += 1;
        if let Some(ref mut writer) = self.writer {
            writeln!(writer, "{}", record.to_line())?;
        }
        Ok(())
    }

    /// Log multiple records.
    pub fn log_batch(&mut self, records: &[StepRecord]) -> std::io::Result<()> {
        for record in records {
            self.log(record)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for StepLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush step logger: {}", e);
        }
    }
}
