//! The dispatching logger and the sink contract.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::Result;
use crate::tabular::TabularInput;

/// Discriminant for the kinds of record a sink can consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A free-text message
    Text,
    /// A tabular key/value snapshot
    Tabular,
}

/// One record on its way to the sinks.
#[derive(Clone, Copy)]
pub enum LogData<'a> {
    /// A free-text message
    Text(&'a str),
    /// A shared view of the producer's accumulator
    Tabular(&'a TabularInput),
}

impl LogData<'_> {
    /// The kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            LogData::Text(_) => RecordKind::Text,
            LogData::Tabular(_) => RecordKind::Tabular,
        }
    }
}

impl<'a> From<&'a str> for LogData<'a> {
    fn from(text: &'a str) -> Self {
        LogData::Text(text)
    }
}

impl<'a> From<&'a String> for LogData<'a> {
    fn from(text: &'a String) -> Self {
        LogData::Text(text)
    }
}

impl<'a> From<&'a TabularInput> for LogData<'a> {
    fn from(tabular: &'a TabularInput) -> Self {
        LogData::Tabular(tabular)
    }
}

/// Capability contract every sink implements.
///
/// A sink moves through three states: constructed, active (any number of
/// `record`/`dump` calls), closed. There is no way back from closed;
/// `record` or `dump` on a closed sink is a caller error and surfaces as
/// [`LogError::Closed`](crate::LogError::Closed) at best.
pub trait LogOutput: Any {
    /// The record kinds this sink consumes. Fixed after construction.
    fn types_accepted(&self) -> &'static [RecordKind];

    /// Consume one record of an accepted kind.
    ///
    /// `prefix` is prepended to text records; sinks that do not handle
    /// text ignore it.
    fn record(&mut self, data: &LogData<'_>, prefix: &str) -> Result<()>;

    /// Flush buffered records.
    ///
    /// `step` ties the flush to a point on an external timeline. Sinks
    /// that batch define their own fallback when it is `None`; sinks that
    /// do not batch ignore it.
    fn dump(&mut self, _step: Option<u64>) -> Result<()> {
        Ok(())
    }

    /// Release held resources. Must be idempotent.
    fn close(&mut self) {}
}

/// Shared handle to a registered sink.
///
/// Registration identity is handle identity: the registry compares
/// allocations, never contents.
pub type OutputRef = Rc<RefCell<dyn LogOutput>>;

fn is_output_type<T: LogOutput>(output: &OutputRef) -> bool {
    let output = output.borrow();
    let any: &dyn Any = &*output;
    any.type_id() == TypeId::of::<T>()
}

/// Routes records to a registered set of sinks.
///
/// The logger owns no resources of its own; it is coordination state over
/// the sinks it holds. Construct one per pipeline and pass it around —
/// there is no global instance.
pub struct Logger {
    outputs: Vec<OutputRef>,
    prefixes: Vec<String>,
    prefix: String,
    enabled: bool,
    warned_once: HashSet<String>,
    warnings_disabled: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            prefixes: Vec::new(),
            prefix: String::new(),
            enabled: true,
            warned_once: HashSet::new(),
            warnings_disabled: false,
        }
    }

    /// Wrap a sink in a shared handle and register it.
    ///
    /// Returns the handle so the caller can later remove the sink by
    /// identity or inspect it in tests.
    pub fn add<T: LogOutput>(&mut self, output: T) -> OutputRef {
        let output: OutputRef = Rc::new(RefCell::new(output));
        self.add_output(output.clone());
        output
    }

    /// Register a sink handle.
    ///
    /// Registration order is dispatch order. Re-registering a handle that
    /// is already present is a no-op.
    pub fn add_output(&mut self, output: OutputRef) {
        if !self.outputs.iter().any(|o| Rc::ptr_eq(o, &output)) {
            self.outputs.push(output);
        }
    }

    /// Unregister a sink by handle identity. No-op when absent.
    pub fn remove_output(&mut self, output: &OutputRef) {
        self.outputs.retain(|o| !Rc::ptr_eq(o, output));
    }

    /// Unregister every sink of the concrete type `T`. No-op when absent.
    pub fn remove_output_type<T: LogOutput>(&mut self) {
        self.outputs.retain(|o| !is_output_type::<T>(o));
    }

    /// Clear the registry without closing the sinks.
    pub fn remove_all(&mut self) {
        self.outputs.clear();
    }

    /// Whether a sink of the concrete type `T` is registered.
    pub fn has_output_type<T: LogOutput>(&self) -> bool {
        self.outputs.iter().any(is_output_type::<T>)
    }

    /// Replace any sinks of `output`'s type with `output`.
    pub fn reset_output<T: LogOutput>(&mut self, output: T) -> OutputRef {
        self.remove_output_type::<T>();
        self.add(output)
    }

    /// Number of registered sinks.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Whether `log` currently dispatches anything.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Globally suspend or resume dispatch without touching registration.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Route one record to every sink that accepts its kind.
    ///
    /// Sinks are visited in registration order. A record nobody accepts
    /// produces a non-fatal warning; an error inside a sink's `record`
    /// aborts the dispatch and propagates to the caller.
    pub fn log<'a>(&mut self, data: impl Into<LogData<'a>>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let data = data.into();
        if self.outputs.is_empty() {
            self.warn("no outputs have been added to the logger");
        }
        let kind = data.kind();
        let mut accepted = false;
        for output in &self.outputs {
            let eligible = output.borrow().types_accepted().contains(&kind);
            if eligible {
                output.borrow_mut().record(&data, &self.prefix)?;
                accepted = true;
            }
        }
        if !accepted {
            self.warn(&format!("log data of kind {kind:?} was not accepted by any output"));
        }
        Ok(())
    }

    /// Flush every registered sink, in registration order.
    ///
    /// Clearing the tabular accumulator afterwards is the producer's job.
    pub fn dump(&mut self, step: Option<u64>) -> Result<()> {
        for output in &self.outputs {
            output.borrow_mut().dump(step)?;
        }
        Ok(())
    }

    /// Flush only the sinks of the concrete type `T`.
    pub fn dump_output_type<T: LogOutput>(&mut self, step: Option<u64>) -> Result<()> {
        for output in &self.outputs {
            if is_output_type::<T>(output) {
                output.borrow_mut().dump(step)?;
            }
        }
        Ok(())
    }

    /// Close every sink and clear the registry.
    ///
    /// Idempotent: closing an already-closed logger leaves it empty.
    /// Records logged afterwards land on the empty registry and are
    /// discarded with a warning until new sinks are added.
    pub fn close(&mut self) {
        for output in &self.outputs {
            output.borrow_mut().close();
        }
        self.outputs.clear();
    }

    /// Prepend `prefix` to all subsequent text records.
    pub fn push_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
        self.prefix = self.prefixes.concat();
    }

    /// Remove the most recently pushed prefix.
    pub fn pop_prefix(&mut self) {
        self.prefixes.pop();
        self.prefix = self.prefixes.concat();
    }

    /// Run `f` with `prefix` applied, popping it afterwards.
    pub fn with_prefix<R>(&mut self, prefix: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_prefix(prefix);
        let result = f(self);
        self.pop_prefix();
        result
    }

    /// Suppress advisory warnings. Registration and dispatch are
    /// unaffected.
    pub fn disable_warnings(&mut self) {
        self.warnings_disabled = true;
    }

    fn warn(&mut self, msg: &str) {
        let first = self.warned_once.insert(msg.to_string());
        if first && !self.warnings_disabled {
            tracing::warn!("{msg}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextOnly;

    impl LogOutput for TextOnly {
        fn types_accepted(&self) -> &'static [RecordKind] {
            &[RecordKind::Text]
        }

        fn record(&mut self, _data: &LogData<'_>, _prefix: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prefix_stack() {
        let mut logger = Logger::new();
        logger.push_prefix("a | ");
        logger.push_prefix("b | ");
        assert_eq!(logger.prefix, "a | b | ");
        logger.pop_prefix();
        assert_eq!(logger.prefix, "a | ");
        logger.pop_prefix();
        assert_eq!(logger.prefix, "");
        // Popping an empty stack is harmless
        logger.pop_prefix();
        assert_eq!(logger.prefix, "");
    }

    #[test]
    fn test_with_prefix_restores() {
        let mut logger = Logger::new();
        logger.with_prefix("itr 1 | ", |logger| {
            assert_eq!(logger.prefix, "itr 1 | ");
        });
        assert_eq!(logger.prefix, "");
    }

    #[test]
    fn test_type_queries() {
        let mut logger = Logger::new();
        assert!(!logger.has_output_type::<TextOnly>());
        logger.add(TextOnly);
        assert!(logger.has_output_type::<TextOnly>());
        logger.remove_output_type::<TextOnly>();
        assert!(!logger.has_output_type::<TextOnly>());
    }

    #[test]
    fn test_reset_output_replaces() {
        let mut logger = Logger::new();
        logger.add(TextOnly);
        logger.add(TextOnly);
        assert_eq!(logger.output_count(), 2);
        logger.reset_output(TextOnly);
        assert_eq!(logger.output_count(), 1);
    }
}
