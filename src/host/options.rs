//! Update sink: the host's named-option table.

use crate::config::{FORCE_TIMER_OPTION, WIDTH_OPTION};
use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A value written into the host's option table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// Integer option (e.g. `width`).
    Integer(i32),
    /// Boolean option (e.g. `setwidth2.force_timer`).
    Logical(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Logical(true) => f.write_str("TRUE"),
            Self::Logical(false) => f.write_str("FALSE"),
        }
    }
}

/// The host's generic "set named option" mechanism.
///
/// Implementations evaluate the write against the host's global scope. A
/// host that raises while doing so reports it as an
/// [`Error::HostEvaluation`](crate::Error::HostEvaluation).
pub trait OptionSink {
    /// Set `name` to `value`.
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()>;
}

impl<S: OptionSink + ?Sized> OptionSink for Box<S> {
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        (**self).set_option(name, value)
    }
}

/// Write the new terminal width into the host.
pub fn apply_width(sink: &mut dyn OptionSink, cols: u16) -> Result<()> {
    sink.set_option(WIDTH_OPTION, OptionValue::Integer(i32::from(cols)))
}

/// Ask the host to drive ticks from its own timer.
pub fn request_timer_fallback(sink: &mut dyn OptionSink) -> Result<()> {
    sink.set_option(FORCE_TIMER_OPTION, OptionValue::Logical(true))
}

#[derive(Debug, Default)]
struct OptionTable {
    values: HashMap<String, OptionValue>,
    writes: Vec<(String, OptionValue)>,
}

/// An in-memory option table.
///
/// Clones share the same table, so a host can hand one clone to a
/// [`Watcher`](crate::Watcher) and keep reading through another. Every
/// write is also appended to a history.
#[derive(Debug, Clone, Default)]
pub struct MemoryOptions {
    table: Rc<RefCell<OptionTable>>,
}

impl MemoryOptions {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.table.borrow().values.get(name).copied()
    }

    /// Current `width`, if one was ever written.
    pub fn width(&self) -> Option<i32> {
        match self.get(WIDTH_OPTION) {
            Some(OptionValue::Integer(v)) => Some(v),
            _ => None,
        }
    }

    /// Whether the timer fallback flag is set.
    pub fn force_timer(&self) -> bool {
        self.get(FORCE_TIMER_OPTION) == Some(OptionValue::Logical(true))
    }

    /// Every write, oldest first.
    pub fn writes(&self) -> Vec<(String, OptionValue)> {
        self.table.borrow().writes.clone()
    }

    /// Every value written to `name`, oldest first.
    pub fn history(&self, name: &str) -> Vec<OptionValue> {
        self.table
            .borrow()
            .writes
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| *value)
            .collect()
    }
}

impl OptionSink for MemoryOptions {
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        let mut table = self.table.borrow_mut();
        table.values.insert(name.to_string(), value);
        table.writes.push((name.to_string(), value));
        Ok(())
    }
}
