//! Plain-text file sink.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::logger::{LogData, LogOutput, RecordKind};
use crate::{LogError, Result};

/// Text-file sink accepting text and tabular records.
///
/// Lines are appended, so successive runs against the same path extend
/// the log rather than truncate it.
pub struct TextOutput {
    file: Option<BufWriter<File>>,
    with_timestamp: bool,
}

impl TextOutput {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(BufWriter::new(file)),
            with_timestamp: true,
        })
    }

    /// Toggle the timestamp on text records.
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }
}

impl LogOutput for TextOutput {
    fn types_accepted(&self) -> &'static [RecordKind] {
        &[RecordKind::Text, RecordKind::Tabular]
    }

    fn record(&mut self, data: &LogData<'_>, prefix: &str) -> Result<()> {
        let line = match data {
            LogData::Text(text) => super::text_line(self.with_timestamp, prefix, text),
            LogData::Tabular(tabular) => tabular.to_string(),
        };
        let file = self.file.as_mut().ok_or(LogError::Closed)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn dump(&mut self, _step: Option<u64>) -> Result<()> {
        self.file.as_mut().ok_or(LogError::Closed)?.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }
}
