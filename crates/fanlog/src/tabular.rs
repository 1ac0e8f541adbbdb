//! Accumulating tabular snapshot with per-key consumption tracking.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

/// A scalar value carried by one tabular key.
#[derive(Clone, Debug, PartialEq)]
pub enum TabularValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl TabularValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TabularValue::Int(v) => Some(*v as f64),
            TabularValue::Float(v) => Some(*v),
            TabularValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            TabularValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TabularValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabularValue::Int(v) => write!(f, "{v}"),
            TabularValue::Float(v) => write!(f, "{v}"),
            TabularValue::Bool(v) => write!(f, "{v}"),
            TabularValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for TabularValue {
    fn from(value: i64) -> Self {
        TabularValue::Int(value)
    }
}

impl From<i32> for TabularValue {
    fn from(value: i32) -> Self {
        TabularValue::Int(value.into())
    }
}

impl From<u32> for TabularValue {
    fn from(value: u32) -> Self {
        TabularValue::Int(value.into())
    }
}

impl From<usize> for TabularValue {
    fn from(value: usize) -> Self {
        TabularValue::Int(value as i64)
    }
}

impl From<f64> for TabularValue {
    fn from(value: f64) -> Self {
        TabularValue::Float(value)
    }
}

impl From<f32> for TabularValue {
    fn from(value: f32) -> Self {
        TabularValue::Float(value.into())
    }
}

impl From<bool> for TabularValue {
    fn from(value: bool) -> Self {
        TabularValue::Bool(value)
    }
}

impl From<String> for TabularValue {
    fn from(value: String) -> Self {
        TabularValue::Text(value)
    }
}

impl From<&str> for TabularValue {
    fn from(value: &str) -> Self {
        TabularValue::Text(value.to_string())
    }
}

/// One logical row of named measurements, accumulated between clears.
///
/// Keys keep insertion order, and each key carries a consumed flag so
/// that measurements nobody logs are caught at the end of the cycle. The
/// consumed set is interior-mutable: sinks mark keys through the shared
/// reference they receive during dispatch, while the producer alone calls
/// [`clear`](TabularInput::clear) between cycles.
pub struct TabularInput {
    entries: IndexMap<String, TabularValue>,
    marked: RefCell<HashSet<String>>,
    prefixes: Vec<String>,
    prefix: String,
    warned_once: HashSet<String>,
    warnings_disabled: bool,
}

impl Default for TabularInput {
    fn default() -> Self {
        Self::new()
    }
}

impl TabularInput {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            marked: RefCell::new(HashSet::new()),
            prefixes: Vec::new(),
            prefix: String::new(),
            warned_once: HashSet::new(),
            warnings_disabled: false,
        }
    }

    /// Insert or overwrite `key` for the current cycle.
    ///
    /// The key is stored with the current prefix applied and is unmarked
    /// afterwards, even when it overwrites an already-consumed entry.
    pub fn record(&mut self, key: impl Into<String>, value: impl Into<TabularValue>) {
        let key = format!("{}{}", self.prefix, key.into());
        self.marked.borrow_mut().remove(&key);
        self.entries.insert(key, value.into());
    }

    /// Record summary statistics of `values` under a shared key stem.
    ///
    /// Writes `{key}Average`, `{key}Std` (population), `{key}Median`,
    /// `{key}Min` and `{key}Max`. An empty slice records NaN for each.
    pub fn record_misc_stat(&mut self, key: &str, values: &[f64]) {
        if values.is_empty() {
            for stat in ["Average", "Std", "Median", "Min", "Max"] {
                self.record(format!("{key}{stat}"), f64::NAN);
            }
            return;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        self.record(format!("{key}Average"), mean);
        self.record(format!("{key}Std"), std);
        self.record(format!("{key}Median"), median);
        self.record(format!("{key}Min"), min);
        self.record(format!("{key}Max"), max);
    }

    /// The current cycle's entries, insertion order preserved.
    pub fn as_map(&self) -> &IndexMap<String, TabularValue> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declare `key`'s value consumed for this cycle.
    pub fn mark(&self, key: &str) {
        self.marked.borrow_mut().insert(key.to_string());
    }

    /// Declare every key consumed.
    ///
    /// Called by sinks whose rendering serializes the full row, since
    /// printing the whole row uses every value in it.
    pub fn mark_str(&self) {
        let mut marked = self.marked.borrow_mut();
        for key in self.entries.keys() {
            marked.insert(key.clone());
        }
    }

    /// Keys recorded this cycle that no sink has consumed yet, in
    /// insertion order.
    pub fn unmarked_keys(&self) -> Vec<String> {
        let marked = self.marked.borrow();
        self.entries
            .keys()
            .filter(|key| !marked.contains(*key))
            .cloned()
            .collect()
    }

    /// End the cycle: warn for every unconsumed key, then reset.
    ///
    /// An unconsumed key usually means a misconfigured sink set or dead
    /// code computing a statistic nobody logs. Each key is warned about
    /// at most once over the accumulator's lifetime.
    pub fn clear(&mut self) {
        for key in self.unmarked_keys() {
            let first = self.warned_once.insert(key.clone());
            if first && !self.warnings_disabled {
                tracing::warn!("tabular key {key} was recorded but never consumed by any output");
            }
        }
        self.entries.clear();
        self.marked.borrow_mut().clear();
    }

    /// Prepend `prefix` to the keys of subsequent `record` calls.
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

    /// Suppress the unconsumed-key warnings.
    pub fn disable_warnings(&mut self) {
        self.warnings_disabled = true;
    }
}

impl fmt::Display for TabularInput {
    /// Renders a deterministic two-column layout and marks every key:
    /// serializing the whole row counts as consuming each value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.mark_str();
        if self.entries.is_empty() {
            return Ok(());
        }
        let rows: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect();
        let key_width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);
        let rule = format!("{}  {}", "-".repeat(key_width), "-".repeat(value_width));
        writeln!(f, "{rule}")?;
        for (key, value) in &rows {
            writeln!(f, "{key:<key_width$}  {value}")?;
        }
        write!(f, "{rule}")
    }
}
