use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use fanlog::{LogData, LogOutput, Logger, OutputRef, RecordKind, Result, TabularInput};

/// Test sink that journals every call it receives.
struct MockOutput {
    name: &'static str,
    accepts: &'static [RecordKind],
    journal: Rc<RefCell<Vec<String>>>,
    closed: usize,
}

impl MockOutput {
    fn new(
        name: &'static str,
        accepts: &'static [RecordKind],
        journal: &Rc<RefCell<Vec<String>>>,
    ) -> Self {
        Self {
            name,
            accepts,
            journal: journal.clone(),
            closed: 0,
        }
    }
}

impl LogOutput for MockOutput {
    fn types_accepted(&self) -> &'static [RecordKind] {
        self.accepts
    }

    fn record(&mut self, data: &LogData<'_>, prefix: &str) -> Result<()> {
        let entry = match data {
            LogData::Text(text) => format!("{}: {}{}", self.name, prefix, text),
            LogData::Tabular(_) => format!("{}: <tabular>", self.name),
        };
        self.journal.borrow_mut().push(entry);
        Ok(())
    }

    fn dump(&mut self, step: Option<u64>) -> Result<()> {
        self.journal
            .borrow_mut()
            .push(format!("{}: dump {:?}", self.name, step));
        Ok(())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}

fn with_mock<R>(handle: &OutputRef, f: impl FnOnce(&MockOutput) -> R) -> R {
    let guard = handle.borrow();
    let any: &dyn Any = &*guard;
    f(any.downcast_ref::<MockOutput>().unwrap())
}

const BOTH: &[RecordKind] = &[RecordKind::Text, RecordKind::Tabular];
const TABULAR_ONLY: &[RecordKind] = &[RecordKind::Tabular];

#[test]
fn test_dispatch_follows_registration_order() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", BOTH, &journal));

    logger.log("hello").unwrap();
    assert_eq!(*journal.borrow(), ["s1: hello", "s2: hello"]);
}

#[test]
fn test_re_adding_a_handle_does_not_duplicate() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    let handle = logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add_output(handle.clone());
    assert_eq!(logger.output_count(), 1);

    logger.log("once").unwrap();
    assert_eq!(journal.borrow().len(), 1);
}

#[test]
fn test_text_reaches_only_text_sinks() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", TABULAR_ONLY, &journal));

    logger.log("hello").unwrap();
    assert_eq!(*journal.borrow(), ["s1: hello"]);
}

#[test]
fn test_tabular_reaches_all_accepting_sinks() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", TABULAR_ONLY, &journal));

    let mut tabular = TabularInput::new();
    tabular.record("loss", 0.5);
    logger.log(&tabular).unwrap();
    assert_eq!(*journal.borrow(), ["s1: <tabular>", "s2: <tabular>"]);
}

#[test]
fn test_unaccepted_record_is_not_an_error() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", TABULAR_ONLY, &journal));

    logger.log("nobody wants this").unwrap();
    assert!(journal.borrow().is_empty());
}

#[test]
fn test_disabled_logger_is_a_silent_noop() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));

    logger.set_enabled(false);
    logger.log("dropped").unwrap();
    assert!(journal.borrow().is_empty());

    logger.set_enabled(true);
    logger.log("kept").unwrap();
    assert_eq!(*journal.borrow(), ["s1: kept"]);
}

#[test]
fn test_remove_output_by_identity() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    let s1 = logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", BOTH, &journal));

    logger.remove_output(&s1);
    assert_eq!(logger.output_count(), 1);
    // Removing again is a no-op
    logger.remove_output(&s1);
    assert_eq!(logger.output_count(), 1);

    logger.log("hello").unwrap();
    assert_eq!(*journal.borrow(), ["s2: hello"]);
}

#[test]
fn test_remove_all_does_not_close() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    let s1 = logger.add(MockOutput::new("s1", BOTH, &journal));

    logger.remove_all();
    assert_eq!(logger.output_count(), 0);
    with_mock(&s1, |mock| assert_eq!(mock.closed, 0));
}

#[test]
fn test_close_closes_each_sink_once_and_is_idempotent() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    let s1 = logger.add(MockOutput::new("s1", BOTH, &journal));
    let s2 = logger.add(MockOutput::new("s2", TABULAR_ONLY, &journal));

    logger.close();
    logger.close();
    assert_eq!(logger.output_count(), 0);
    with_mock(&s1, |mock| assert_eq!(mock.closed, 1));
    with_mock(&s2, |mock| assert_eq!(mock.closed, 1));

    // Logging after close lands on the empty registry and is discarded
    logger.log("into the void").unwrap();
    assert!(journal.borrow().is_empty());
}

#[test]
fn test_dump_visits_every_sink_in_order_with_step() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", TABULAR_ONLY, &journal));

    logger.dump(Some(7)).unwrap();
    logger.dump(None).unwrap();
    assert_eq!(
        *journal.borrow(),
        [
            "s1: dump Some(7)",
            "s2: dump Some(7)",
            "s1: dump None",
            "s2: dump None",
        ]
    );
}

#[test]
fn test_prefix_applies_to_text_records() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));

    logger.with_prefix("itr 1 | ", |logger| logger.log("hello")).unwrap();
    logger.log("after").unwrap();
    assert_eq!(*journal.borrow(), ["s1: itr 1 | hello", "s1: after"]);
}

#[test]
fn test_mixed_sinks_cycle() {
    let journal = Rc::new(RefCell::new(Vec::new()));
    let mut logger = Logger::new();
    logger.add(MockOutput::new("s1", BOTH, &journal));
    logger.add(MockOutput::new("s2", TABULAR_ONLY, &journal));

    logger.log("hello").unwrap();

    let mut tabular = TabularInput::new();
    tabular.record("loss", 0.5);
    logger.log(&tabular).unwrap();
    logger.dump(None).unwrap();

    // Neither mock marks keys, so the cycle ends with "loss" unconsumed
    assert_eq!(tabular.unmarked_keys(), ["loss"]);
    tabular.clear();
    assert!(tabular.is_empty());

    assert_eq!(
        *journal.borrow(),
        [
            "s1: hello",
            "s1: <tabular>",
            "s2: <tabular>",
            "s1: dump None",
            "s2: dump None",
        ]
    );
}

#[test]
fn test_rendered_tabular_clears_without_unconsumed_keys() {
    let mut tabular = TabularInput::new();
    tabular.record("a", 1);
    let _ = tabular.to_string();
    assert!(tabular.unmarked_keys().is_empty());
    tabular.clear();
}
