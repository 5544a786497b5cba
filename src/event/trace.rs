//! NDJSON Trace Writer
//!
//! Writes events to newline-delimited JSON files for debugging and replay.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, SasslineError};
use crate::event::{Event, EventLog};

/// NDJSON trace writer
pub struct TraceWriter {
    writer: Arc<Mutex<BufWriter<File>>>,
    path: PathBuf,
}

impl TraceWriter {
    /// Create (or truncate) a trace file, creating parent directories as needed
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let display = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SasslineError::io(&display, e))?;
        }

        let file = File::create(&path).map_err(|e| SasslineError::io(&display, e))?;
        tracing::info!(path = %path.display(), "Created trace file");

        Ok(Self {
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
            path,
        })
    }

    /// Write a single event to the trace file
    pub fn write_event(&self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event).map_err(|e| SasslineError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Write all events from an EventLog
    pub fn write_all(&self, event_log: &EventLog) -> Result<()> {
        for event in event_log.events() {
            self.write_event(&event)?;
        }
        self.close()
    }

    /// Get the trace file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered events
    pub fn close(&self) -> Result<()> {
        self.writer.lock().flush().map_err(|e| self.io_error(e))
    }

    fn io_error(&self, err: std::io::Error) -> SasslineError {
        SasslineError::io(self.path.display().to_string(), err)
    }
}

/// Hash of an accumulated batch source
///
/// Uses xxh3 (fast, non-cryptographic) hash.
/// Format: `xxh3:XXXXXXXXXXXXXXXX` (16 hex chars)
pub fn calculate_source_hash(source: &str) -> String {
    use xxhash_rust::xxh3::xxh3_64;

    let hash = xxh3_64(source.as_bytes());
    format!("xxh3:{:016x}", hash)
}
