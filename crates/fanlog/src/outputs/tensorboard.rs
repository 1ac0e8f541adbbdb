//! TensorBoard dashboard sink.

use std::collections::HashSet;
use std::path::Path;

use tensorboard_rs::summary_writer::SummaryWriter;

use crate::logger::{LogData, LogOutput, RecordKind};
use crate::{LogError, Result};

/// Dashboard sink writing scalar entries to TensorBoard event files.
///
/// Entries are buffered at `record` time and written at `dump`, once the
/// step they belong to is known. When no step is supplied the sink
/// advances an internal counter, so callers that never pass one still get
/// a monotonic timeline.
pub struct TensorBoardOutput {
    writer: SummaryWriter,
    waiting: Vec<(String, f64)>,
    next_step: u64,
    warned_once: HashSet<String>,
}

impl TensorBoardOutput {
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        Self {
            writer: SummaryWriter::new(log_dir.as_ref()),
            waiting: Vec::new(),
            next_step: 0,
            warned_once: HashSet::new(),
        }
    }
}

impl LogOutput for TensorBoardOutput {
    fn types_accepted(&self) -> &'static [RecordKind] {
        &[RecordKind::Tabular]
    }

    fn record(&mut self, data: &LogData<'_>, _prefix: &str) -> Result<()> {
        let LogData::Tabular(tabular) = data else {
            return Err(LogError::UnacceptableType(data.kind()));
        };
        for (key, value) in tabular.as_map() {
            match value.as_f64() {
                Some(value) => {
                    self.waiting.push((key.clone(), value));
                    tabular.mark(key);
                }
                None => {
                    if self.warned_once.insert(key.clone()) {
                        tracing::warn!(
                            "tabular key {key} is not numeric and was not sent to TensorBoard"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn dump(&mut self, step: Option<u64>) -> Result<()> {
        let step = step.unwrap_or(self.next_step);
        for (key, value) in self.waiting.drain(..) {
            self.writer.add_scalar(&key, value as f32, step as usize);
        }
        let _ = self.writer.flush();
        self.next_step = step + 1;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.writer.flush();
    }
}
