//! Lifecycle controller: start/stop and delivery registration.

use super::boundary::isolate;
use super::detector::{evaluate_and_apply, Evaluation};
use super::state::WatcherState;
use crate::config::{Verbosity, POLL_INTERVAL};
use crate::delivery::{DeliveryMode, DeliveryProvider};
use crate::error::{Error, Result};
use crate::host::{request_timer_fallback, HandlerId, OptionSink, PollCallback};
use crate::terminal::{GeometryProbe, SystemProbe};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Everything a cycle touches.
struct Core {
    state: WatcherState,
    probe: Box<dyn GeometryProbe>,
    sink: Box<dyn OptionSink>,
}

/// The core plus what must stay reachable while a cycle holds it.
struct Shared {
    core: RefCell<Core>,
    /// Stop arrived mid-cycle; reset once the cycle releases the core.
    reset_pending: Cell<bool>,
}

impl Shared {
    fn reset(core: &mut Core) {
        if core.state.verbosity.allows(Verbosity::Lifecycle) {
            info!("stopped");
        }
        core.state.reset();
    }

    fn apply_pending_reset(&self) {
        if !self.reset_pending.get() {
            return;
        }
        if let Ok(mut core) = self.core.try_borrow_mut() {
            self.reset_pending.set(false);
            Self::reset(&mut core);
        }
    }
}

/// Run one isolated cycle against `shared`.
///
/// With `require_started`, a core that has not been started (or has been
/// stopped) is left alone.
fn run_cycle(shared: &Shared, context: &'static str, require_started: bool) -> Option<Evaluation> {
    let outcome = isolate(context, || {
        let mut guard = shared.core.try_borrow_mut().map_err(|_| Error::Busy)?;
        let core = &mut *guard;
        if require_started && (!core.state.initialized || shared.reset_pending.get()) {
            return Ok(None);
        }
        evaluate_and_apply(&mut core.state, core.probe.as_ref(), core.sink.as_mut()).map(Some)
    })
    .flatten();
    shared.apply_pending_reset();
    outcome
}

/// The callback registered with the host event loop.
fn poll_callback(shared: Weak<Shared>) -> PollCallback {
    Box::new(move || {
        if let Some(shared) = shared.upgrade() {
            run_cycle(&shared, "poll", true);
        }
        true
    })
}

/// Keeps a host's `width` option in sync with the terminal.
///
/// The watcher is single-threaded: it is neither `Send` nor `Sync`, and
/// every cycle runs on the thread that drives the host's event loop or
/// timer. All methods take `&self`, so a host may call [`stop`](Self::stop)
/// or [`start`](Self::start) from inside its own option callback while a
/// cycle is running.
///
/// # Example
///
/// ```rust,no_run
/// use widthsync::{DeliveryProvider, MemoryOptions, Verbosity, Watcher};
///
/// let options = MemoryOptions::new();
/// let watcher = Watcher::system(options.clone(), DeliveryProvider::detect(None));
/// watcher.start(Verbosity::Lifecycle);
///
/// // Called from the host's timer.
/// watcher.tick();
/// println!("width = {:?}", options.width());
/// ```
pub struct Watcher {
    shared: Rc<Shared>,
    provider: RefCell<DeliveryProvider>,
    handle: Cell<Option<HandlerId>>,
    mode: Cell<DeliveryMode>,
}

impl Watcher {
    /// Create a stopped watcher.
    pub fn new(
        probe: impl GeometryProbe + 'static,
        sink: impl OptionSink + 'static,
        provider: DeliveryProvider,
    ) -> Self {
        let core = Core {
            state: WatcherState::default(),
            probe: Box::new(probe),
            sink: Box::new(sink),
        };
        Self {
            shared: Rc::new(Shared {
                core: RefCell::new(core),
                reset_pending: Cell::new(false),
            }),
            provider: RefCell::new(provider),
            handle: Cell::new(None),
            mode: Cell::new(DeliveryMode::Uninitialized),
        }
    }

    /// Create a stopped watcher probing the real terminal.
    pub fn system(sink: impl OptionSink + 'static, provider: DeliveryProvider) -> Self {
        Self::new(SystemProbe, sink, provider)
    }

    /// Start watching.
    ///
    /// Applies the current width once, then registers with the host event
    /// loop or falls back to host-scheduled ticks. Calling this on a
    /// started watcher only updates the verbosity. While a cycle is running
    /// the call is refused and the current mode returned.
    pub fn start(&self, verbosity: Verbosity) -> DeliveryMode {
        let Ok(mut core) = self.shared.core.try_borrow_mut() else {
            warn!(error = %Error::Busy, "start ignored during an update cycle");
            return self.mode.get();
        };
        core.state.verbosity = verbosity;
        drop(core);
        if self.mode.get().is_active() {
            return self.mode.get();
        }

        run_cycle(&self.shared, "start", false);
        let mode = self.activate(verbosity);
        self.mode.set(mode);
        if let Ok(mut core) = self.shared.core.try_borrow_mut() {
            core.state.initialized = true;
        }
        mode
    }

    fn activate(&self, verbosity: Verbosity) -> DeliveryMode {
        let Ok(mut provider) = self.provider.try_borrow_mut() else {
            warn!(error = %Error::Busy, "delivery provider in use; falling back to host timer");
            self.request_fallback();
            return DeliveryMode::ActiveFallback;
        };
        let api = match &mut *provider {
            DeliveryProvider::NativePolling(api) => api,
            DeliveryProvider::HostTimerFallback => {
                if verbosity.allows(Verbosity::Lifecycle) {
                    info!("event loop unavailable; enabling host timer fallback");
                }
                self.request_fallback();
                return DeliveryMode::ActiveFallback;
            }
            DeliveryProvider::HostScheduled => {
                if verbosity.allows(Verbosity::Lifecycle) {
                    info!("loaded (host timer/task mode)");
                }
                return DeliveryMode::ActiveFallback;
            }
        };

        api.set_poll_interval(POLL_INTERVAL);
        let callback = poll_callback(Rc::downgrade(&self.shared));
        let handle = isolate("register", || Ok(api.add_handler(callback))).flatten();

        if let Some(handle) = handle {
            self.handle.set(Some(handle));
            if verbosity.allows(Verbosity::Lifecycle) {
                info!(
                    usec = POLL_INTERVAL.as_micros(),
                    "loaded (polling {} µs via event loop)",
                    POLL_INTERVAL.as_micros()
                );
            }
            DeliveryMode::ActivePolling
        } else {
            warn!(error = %Error::RegistrationFailed, "falling back to host timer");
            self.request_fallback();
            DeliveryMode::ActiveFallback
        }
    }

    fn request_fallback(&self) {
        isolate("fallback", || -> Result<()> {
            let mut core = self.shared.core.try_borrow_mut().map_err(|_| Error::Busy)?;
            request_timer_fallback(core.sink.as_mut())
        });
    }

    /// Stop watching and deregister from the host event loop.
    ///
    /// The cached width is forgotten, so a later [`start`](Self::start)
    /// writes the width again. Stopping a stopped watcher does nothing.
    /// Called during a cycle, the reset happens when that cycle ends.
    pub fn stop(&self) {
        if !self.mode.get().is_active() {
            return;
        }
        self.mode.set(DeliveryMode::Uninitialized);

        if let Some(handle) = self.handle.take() {
            match self.provider.try_borrow_mut() {
                Ok(mut provider) => {
                    if let DeliveryProvider::NativePolling(api) = &mut *provider {
                        isolate("deregister", || {
                            api.remove_handler(handle);
                            Ok(())
                        });
                    }
                }
                Err(_) => warn!(error = %Error::Busy, "could not deregister polled handler"),
            }
        }

        match self.shared.core.try_borrow_mut() {
            Ok(mut core) => Shared::reset(&mut core),
            Err(_) => {
                debug!("stop during an update cycle; reset deferred");
                self.shared.reset_pending.set(true);
            }
        }
    }

    /// Host timer entry point: run one cycle.
    ///
    /// Safe to call at any time. Before [`start`](Self::start) and after
    /// [`stop`](Self::stop) it does nothing. Returns `None` when the cycle
    /// was skipped or failed.
    pub fn tick(&self) -> Option<Evaluation> {
        let outcome = run_cycle(&self.shared, "tick", true);
        if outcome.is_none() {
            debug!(mode = ?self.mode.get(), "tick produced no evaluation");
        }
        outcome
    }

    /// Current delivery mode.
    #[inline]
    pub fn mode(&self) -> DeliveryMode {
        self.mode.get()
    }

    /// Active event-loop registration, if any.
    #[inline]
    pub fn handler(&self) -> Option<HandlerId> {
        self.handle.get()
    }

    /// Whether a cycle is running right now.
    pub fn is_busy(&self) -> bool {
        self.shared.core.try_borrow_mut().is_err()
    }

    /// Width last written to the host.
    pub fn last_width(&self) -> Option<u16> {
        self.shared
            .core
            .try_borrow()
            .ok()
            .and_then(|core| core.state.last_width)
    }

    /// Current verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.shared
            .core
            .try_borrow()
            .map(|core| core.state.verbosity)
            .unwrap_or_default()
    }

    /// Whether [`start`](Self::start) has run since the last stop.
    pub fn is_initialized(&self) -> bool {
        self.shared
            .core
            .try_borrow()
            .is_ok_and(|core| core.state.initialized)
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop();
    }
}
