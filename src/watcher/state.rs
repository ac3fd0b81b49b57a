//! Per-watcher mutable state.

use crate::config::Verbosity;

/// State owned by one watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherState {
    /// Set by Start, cleared by Stop.
    pub initialized: bool,
    /// Diagnostic level for the watcher's own messages.
    pub verbosity: Verbosity,
    /// Width last written to the host. `None` until the first successful probe.
    pub last_width: Option<u16>,
}

impl WatcherState {
    /// Back to the pre-Start state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
