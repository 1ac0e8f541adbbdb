//! # fanlog
//!
//! A fan-out logger for text and tabular records.
//!
//! ## Overview
//!
//! fanlog provides:
//! - A caller-owned [`Logger`] that routes records to registered sinks
//! - The [`LogOutput`] trait implemented by every sink
//! - [`TabularInput`], an accumulating key/value snapshot with per-key
//!   consumption tracking
//! - Ready-made sinks for console, text file, CSV file, and TensorBoard
//!   (the latter requires the `tensorboard` feature)
//!
//! ## Features
//!
//! - `default` - Console, file, and CSV sinks
//! - `tensorboard` - Enable the TensorBoard dashboard sink
//!
//! ## Quick Start
//!
//! ```no_run
//! use fanlog::{Logger, StdOutput, TabularInput};
//!
//! let mut logger = Logger::new();
//! logger.add(StdOutput::new());
//!
//! let mut tabular = TabularInput::new();
//! tabular.record("loss", 0.5);
//! tabular.record("epoch", 3);
//!
//! logger.log("starting epoch 3").unwrap();
//! logger.log(&tabular).unwrap();
//! logger.dump(None).unwrap();
//! tabular.clear();
//! ```

pub mod logger;
pub mod outputs;
pub mod tabular;

/// Commonly used types.
pub mod prelude {
    pub use crate::logger::{LogData, LogOutput, Logger, OutputRef, RecordKind};
    pub use crate::outputs::{CsvOutput, StdOutput, TextOutput};
    #[cfg(feature = "tensorboard")]
    pub use crate::outputs::TensorBoardOutput;
    pub use crate::tabular::{TabularInput, TabularValue};
    pub use crate::{LogError, Result};
}

pub use logger::{LogData, LogOutput, Logger, OutputRef, RecordKind};
pub use outputs::{CsvOutput, StdOutput, TextOutput};
#[cfg(feature = "tensorboard")]
pub use outputs::TensorBoardOutput;
pub use tabular::{TabularInput, TabularValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("record kind {0:?} is not accepted by this output")]
    UnacceptableType(RecordKind),

    #[error("output has been closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LogError>;
