//! Console sink.

use std::io::{self, Write};

use crate::logger::{LogData, LogOutput, RecordKind};
use crate::Result;

/// Standard console sink.
///
/// Text records get an optional local-time timestamp; tabular records are
/// printed as the full two-column rendering, which marks every key.
pub struct StdOutput {
    with_timestamp: bool,
}

impl Default for StdOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl StdOutput {
    pub fn new() -> Self {
        Self {
            with_timestamp: true,
        }
    }

    /// Toggle the timestamp on text records.
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }
}

impl LogOutput for StdOutput {
    fn types_accepted(&self) -> &'static [RecordKind] {
        &[RecordKind::Text, RecordKind::Tabular]
    }

    fn record(&mut self, data: &LogData<'_>, prefix: &str) -> Result<()> {
        match data {
            LogData::Text(text) => {
                println!("{}", super::text_line(self.with_timestamp, prefix, text));
            }
            LogData::Tabular(tabular) => println!("{tabular}"),
        }
        Ok(())
    }

    fn dump(&mut self, _step: Option<u64>) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_kinds() {
        let output = StdOutput::new();
        assert!(output.types_accepted().contains(&RecordKind::Text));
        assert!(output.types_accepted().contains(&RecordKind::Tabular));
    }

    #[test]
    fn test_text_line_format() {
        assert_eq!(super::super::text_line(false, "itr 1 | ", "hello"), "itr 1 | hello");
        let stamped = super::super::text_line(true, "", "hello");
        // "YYYY-MM-DD HH:MM:SS | hello"
        assert_eq!(&stamped[19..], " | hello");
    }
}
