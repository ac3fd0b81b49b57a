//! The host's optional polled-event subsystem.

use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

/// Callback handed to the host event loop.
///
/// Returning `false` asks the loop to drop the handler. The watcher's
/// callback always returns `true`.
pub type PollCallback = Box<dyn FnMut() -> bool>;

/// Opaque registration token returned by [`PollingApi::add_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Wrap a host-side handle value.
    #[inline]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The host-side handle value.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

bitflags! {
    /// Which parts of the polling API the host exposes.
    ///
    /// Native polling is only used when all of them are present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Register a polled handler.
        const ADD_HANDLER = 0b001;
        /// Deregister a polled handler.
        const REMOVE_HANDLER = 0b010;
        /// Settable poll interval.
        const POLL_INTERVAL = 0b100;
    }
}

impl Capabilities {
    /// Whether native polling can be used.
    #[inline]
    pub const fn is_complete(self) -> bool {
        self.contains(Self::all())
    }

    /// Bindings still missing.
    #[inline]
    pub const fn missing(self) -> Self {
        self.complement()
    }
}

/// A host event loop that runs polled handlers while it is otherwise idle.
pub trait PollingApi {
    /// Set how often the loop wakes to run handlers.
    fn set_poll_interval(&mut self, interval: Duration);

    /// Register `callback`. `None` means the host refused.
    fn add_handler(&mut self, callback: PollCallback) -> Option<HandlerId>;

    /// Deregister a handler returned by [`add_handler`](Self::add_handler).
    fn remove_handler(&mut self, handle: HandlerId);
}

#[derive(Default)]
struct LoopState {
    interval: Option<Duration>,
    handlers: Vec<(HandlerId, PollCallback)>,
    removed: HashSet<HandlerId>,
    next_id: usize,
    refuse: bool,
}

/// An in-process polled-event loop for hosts written in Rust.
///
/// Clones share the same loop: hand one to a [`Watcher`](crate::Watcher)
/// and drive the other from the host's idle path with
/// [`run_pending`](Self::run_pending).
#[derive(Clone, Default)]
pub struct LocalEventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl LocalEventLoop {
    /// Create an empty loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loop whose `add_handler` always returns `None`.
    pub fn refusing() -> Self {
        let event_loop = Self::new();
        event_loop.state.borrow_mut().refuse = true;
        event_loop
    }

    /// The interval last written by a client.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.state.borrow().interval
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Run every registered handler once.
    ///
    /// Handlers may register or deregister other handlers while running.
    pub fn run_pending(&self) {
        let mut running = mem::take(&mut self.state.borrow_mut().handlers);
        running.retain_mut(|(_, callback)| callback());

        let mut state = self.state.borrow_mut();
        let removed = mem::take(&mut state.removed);
        running.retain(|(id, _)| !removed.contains(id));
        let added = mem::replace(&mut state.handlers, running);
        state.handlers.extend(added);
    }
}

impl PollingApi for LocalEventLoop {
    fn set_poll_interval(&mut self, interval: Duration) {
        self.state.borrow_mut().interval = Some(interval);
    }

    fn add_handler(&mut self, callback: PollCallback) -> Option<HandlerId> {
        let mut state = self.state.borrow_mut();
        if state.refuse {
            return None;
        }
        state.next_id += 1;
        let id = HandlerId::new(state.next_id);
        state.handlers.push((id, callback));
        Some(id)
    }

    fn remove_handler(&mut self, handle: HandlerId) {
        let mut state = self.state.borrow_mut();
        let before = state.handlers.len();
        state.handlers.retain(|(id, _)| *id != handle);
        if state.handlers.len() == before {
            // Possibly mid-run; filtered when the run finishes.
            state.removed.insert(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_capabilities_complete() {
        assert!(Capabilities::all().is_complete());
        let partial = Capabilities::ADD_HANDLER | Capabilities::REMOVE_HANDLER;
        assert!(!partial.is_complete());
        assert_eq!(partial.missing(), Capabilities::POLL_INTERVAL);
    }

    #[test]
    fn test_run_pending_calls_handlers() {
        let hits = Rc::new(Cell::new(0));
        let mut event_loop = LocalEventLoop::new();
        let counter = hits.clone();
        let id = event_loop
            .add_handler(Box::new(move || {
                counter.set(counter.get() + 1);
                true
            }))
            .unwrap();

        event_loop.run_pending();
        event_loop.run_pending();
        assert_eq!(hits.get(), 2);

        event_loop.remove_handler(id);
        event_loop.run_pending();
        assert_eq!(hits.get(), 2);
        assert_eq!(event_loop.handler_count(), 0);
    }

    #[test]
    fn test_handler_returning_false_is_dropped() {
        let mut event_loop = LocalEventLoop::new();
        event_loop.add_handler(Box::new(|| false)).unwrap();
        event_loop.run_pending();
        assert_eq!(event_loop.handler_count(), 0);
    }

    #[test]
    fn test_handler_can_remove_itself_mid_run() {
        let event_loop = LocalEventLoop::new();
        let slot: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));
        let mut inner = event_loop.clone();
        let own_id = slot.clone();
        let id = event_loop
            .clone()
            .add_handler(Box::new(move || {
                if let Some(id) = own_id.get() {
                    inner.remove_handler(id);
                }
                true
            }))
            .unwrap();
        slot.set(Some(id));

        event_loop.run_pending();
        assert_eq!(event_loop.handler_count(), 0);
    }

    #[test]
    fn test_refusing_loop() {
        let mut event_loop = LocalEventLoop::refusing();
        assert!(event_loop.add_handler(Box::new(|| true)).is_none());
        event_loop.set_poll_interval(Duration::from_micros(150_000));
        assert_eq!(event_loop.poll_interval(), Some(Duration::from_micros(150_000)));
    }
}
