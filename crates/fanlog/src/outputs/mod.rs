//! Ready-made sinks.
//!
//! | Sink | Accepts | Destination |
//! |------|---------|-------------|
//! | [`StdOutput`] | text, tabular | stdout |
//! | [`TextOutput`] | text, tabular | plain-text file |
//! | [`CsvOutput`] | tabular | CSV file |
//! | `TensorBoardOutput` | tabular | TensorBoard event files (`tensorboard` feature) |

mod console;
mod csv;
mod file;
#[cfg(feature = "tensorboard")]
mod tensorboard;

pub use console::StdOutput;
pub use self::csv::CsvOutput;
pub use file::TextOutput;
#[cfg(feature = "tensorboard")]
pub use tensorboard::TensorBoardOutput;

/// Shared line format of the console and text-file sinks.
pub(crate) fn text_line(with_timestamp: bool, prefix: &str, text: &str) -> String {
    if with_timestamp {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        format!("{timestamp} | {prefix}{text}")
    } else {
        format!("{prefix}{text}")
    }
}
