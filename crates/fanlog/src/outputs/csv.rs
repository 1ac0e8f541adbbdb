//! CSV file sink.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use crate::logger::{LogData, LogOutput, RecordKind};
use crate::{LogError, Result};

/// Structured-data file sink accepting tabular records only.
///
/// The first non-empty record fixes the header (keys sorted). Later
/// records with a different key set still write a row — missing columns
/// are left blank, extra keys are dropped — but trigger a non-fatal
/// warning, since a shifting key set usually means the key schema changed
/// after logging started.
pub struct CsvOutput {
    writer: Option<csv::Writer<File>>,
    fieldnames: Vec<String>,
    header_written: bool,
    warned_once: HashSet<String>,
}

impl CsvOutput {
    /// Create `path`, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            writer: Some(csv::WriterBuilder::new().from_path(path)?),
            fieldnames: Vec::new(),
            header_written: false,
            warned_once: HashSet::new(),
        })
    }

    fn warn(&mut self, msg: &str) {
        if self.warned_once.insert(msg.to_string()) {
            tracing::warn!("{msg}");
        }
    }
}

impl LogOutput for CsvOutput {
    fn types_accepted(&self) -> &'static [RecordKind] {
        &[RecordKind::Tabular]
    }

    fn record(&mut self, data: &LogData<'_>, _prefix: &str) -> Result<()> {
        let LogData::Tabular(tabular) = data else {
            return Err(LogError::UnacceptableType(data.kind()));
        };
        let row = tabular.as_map();
        if row.is_empty() && !self.header_written {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or(LogError::Closed)?;
        if !self.header_written {
            self.fieldnames = row.keys().cloned().collect();
            self.fieldnames.sort();
            writer.write_record(&self.fieldnames)?;
            self.header_written = true;
        }
        let consistent = self.fieldnames.len() == row.len()
            && self.fieldnames.iter().all(|name| row.contains_key(name));
        let record: Vec<String> = self
            .fieldnames
            .iter()
            .map(|name| row.get(name).map(|value| value.to_string()).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
        for key in row.keys() {
            tabular.mark(key);
        }
        if !consistent {
            self.warn(
                "tabular keys do not match the CSV header; did the key set change after \
                 the first record?",
            );
        }
        Ok(())
    }

    fn dump(&mut self, _step: Option<u64>) -> Result<()> {
        self.writer.as_mut().ok_or(LogError::Closed)?.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
