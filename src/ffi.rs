//! C Foreign Function Interface (FFI) for widthsync.
//!
//! This is the surface an interpreter or other native host loads the
//! watcher through. The host supplies its option table as callbacks and,
//! if it has one, its polled-event API as a set of nullable pointers.
//!
//! # Safety
//!
//! All functions that accept pointers check them for NULL. Non-NULL
//! pointers must be valid. A watcher must only be used from the thread that
//! created it. Host callbacks may call `widthsync_stop` or
//! `widthsync_start` on the watcher that invoked them.
//!
//! # Example (C)
//!
//! ```c
//! #include "widthsync.h"
//!
//! static int set_int(void *ud, const char *name, int value) { ... }
//! static int set_lgl(void *ud, const char *name, int flag) { ... }
//!
//! WidthsyncOptionTable table = { set_int, set_lgl, NULL };
//! WidthsyncPollingBindings polling = { addPolledEventHandler,
//!                                      removePolledEventHandler,
//!                                      &R_wait_usec };
//!
//! WidthsyncWatcher *w = widthsync_watcher_new(&table, &polling);
//! widthsync_start(w, 1);
//! // ... host timer, if widthsync_mode(w) is FALLBACK:
//! widthsync_tick(w);
//! widthsync_watcher_destroy(w);
//! ```

// FFI modules intentionally use unsafe and no_mangle
#![allow(unsafe_code)]
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use crate::config::Verbosity;
use crate::delivery::{DeliveryMode, DeliveryProvider};
use crate::error::{Error, Result};
use crate::host::{Capabilities, HandlerId, OptionSink, OptionValue, PollCallback, PollingApi};
use crate::logging;
use crate::terminal;
use crate::watcher::Watcher;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Host Callback Types
// =============================================================================

/// Host callback setting an integer option. Returns 0 on success.
pub type WidthsyncSetIntegerFn =
    unsafe extern "C" fn(user_data: *mut c_void, name: *const c_char, value: c_int) -> c_int;

/// Host callback setting a logical option (0/1). Returns 0 on success.
pub type WidthsyncSetLogicalFn =
    unsafe extern "C" fn(user_data: *mut c_void, name: *const c_char, value: c_int) -> c_int;

/// Polled handler signature, as the host's event loop calls it.
pub type WidthsyncPollFn = unsafe extern "C" fn(data: *mut c_void) -> c_int;

/// Host call registering a polled handler. Returns NULL on failure.
pub type WidthsyncAddHandlerFn =
    unsafe extern "C" fn(callback: WidthsyncPollFn, data: *mut c_void) -> *mut c_void;

/// Host call deregistering a polled handler.
pub type WidthsyncRemoveHandlerFn = unsafe extern "C" fn(handle: *mut c_void);

/// The host's option table.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WidthsyncOptionTable {
    /// Sets an integer option (`width`).
    pub set_integer: Option<WidthsyncSetIntegerFn>,
    /// Sets a logical option (`setwidth2.force_timer`).
    pub set_logical: Option<WidthsyncSetLogicalFn>,
    /// Passed back to both callbacks.
    pub user_data: *mut c_void,
}

/// The host's polled-event API. Any member may be NULL.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WidthsyncPollingBindings {
    /// Registers a polled handler.
    pub add_handler: Option<WidthsyncAddHandlerFn>,
    /// Deregisters a polled handler.
    pub remove_handler: Option<WidthsyncRemoveHandlerFn>,
    /// The event loop's poll interval, in microseconds.
    pub poll_interval_usec: *mut c_int,
}

impl WidthsyncPollingBindings {
    /// Which members are present.
    pub fn resolved(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::ADD_HANDLER, self.add_handler.is_some());
        caps.set(Capabilities::REMOVE_HANDLER, self.remove_handler.is_some());
        caps.set(Capabilities::POLL_INTERVAL, !self.poll_interval_usec.is_null());
        caps
    }
}

// =============================================================================
// Result Codes
// =============================================================================

/// Result codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthsyncResult {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer passed.
    NullPointer = 1,
    /// Watcher not started.
    NotRunning = 2,
    /// Called from inside an update cycle; nothing was done.
    Busy = 3,
}

// =============================================================================
// Host Adapters
// =============================================================================

/// [`OptionSink`] over the host's option callbacks.
struct HostOptions {
    set_integer: WidthsyncSetIntegerFn,
    set_logical: WidthsyncSetLogicalFn,
    user_data: *mut c_void,
}

impl HostOptions {
    fn new(table: &WidthsyncOptionTable) -> Option<Self> {
        Some(Self {
            set_integer: table.set_integer?,
            set_logical: table.set_logical?,
            user_data: table.user_data,
        })
    }
}

impl OptionSink for HostOptions {
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        let c_name = CString::new(name).map_err(|_| Error::host(name, "option name contains NUL"))?;
        let rc = unsafe {
            match value {
                OptionValue::Integer(v) => (self.set_integer)(self.user_data, c_name.as_ptr(), v),
                OptionValue::Logical(flag) => {
                    (self.set_logical)(self.user_data, c_name.as_ptr(), c_int::from(flag))
                }
            }
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(Error::host(name, format!("host returned {rc}")))
        }
    }
}

/// [`PollingApi`] over the host's polled-event bindings.
struct HostPolling {
    add_handler: WidthsyncAddHandlerFn,
    remove_handler: WidthsyncRemoveHandlerFn,
    poll_interval_usec: NonNull<c_int>,
    /// Callbacks the host holds a data pointer to, by handle. The
    /// trampoline takes its own reference while one runs.
    registered: HashMap<HandlerId, *const RefCell<PollCallback>>,
}

impl HostPolling {
    fn resolve(bindings: &WidthsyncPollingBindings) -> Result<Self> {
        match (
            bindings.add_handler,
            bindings.remove_handler,
            NonNull::new(bindings.poll_interval_usec),
        ) {
            (Some(add_handler), Some(remove_handler), Some(poll_interval_usec)) => Ok(Self {
                add_handler,
                remove_handler,
                poll_interval_usec,
                registered: HashMap::new(),
            }),
            _ => Err(Error::CapabilityUnavailable(bindings.resolved().missing())),
        }
    }
}

impl PollingApi for HostPolling {
    fn set_poll_interval(&mut self, interval: Duration) {
        let usec = c_int::try_from(interval.as_micros()).unwrap_or(c_int::MAX);
        unsafe { self.poll_interval_usec.as_ptr().write(usec) };
    }

    fn add_handler(&mut self, callback: PollCallback) -> Option<HandlerId> {
        let data = Rc::into_raw(Rc::new(RefCell::new(callback)));
        let handle = unsafe { (self.add_handler)(poll_trampoline, data.cast_mut().cast()) };
        if handle.is_null() {
            drop(unsafe { Rc::from_raw(data) });
            return None;
        }
        let id = HandlerId::new(handle as usize);
        self.registered.insert(id, data);
        Some(id)
    }

    fn remove_handler(&mut self, handle: HandlerId) {
        unsafe { (self.remove_handler)(handle.raw() as *mut c_void) };
        if let Some(data) = self.registered.remove(&handle) {
            drop(unsafe { Rc::from_raw(data) });
        }
    }
}

/// Entry point the host's event loop calls.
unsafe extern "C" fn poll_trampoline(data: *mut c_void) -> c_int {
    if data.is_null() {
        return 1;
    }
    let data = data.cast_const().cast::<RefCell<PollCallback>>();
    // The callback may deregister itself; keep it alive until it returns.
    Rc::increment_strong_count(data);
    let callback = Rc::from_raw(data);
    let keep = callback.try_borrow_mut().map_or(true, |mut run| run());
    c_int::from(keep)
}

/// Choose the delivery provider from the host's bindings, once.
fn provider_for(bindings: Option<&WidthsyncPollingBindings>) -> DeliveryProvider {
    let polling = bindings.map_or(
        Err(Error::CapabilityUnavailable(Capabilities::all())),
        HostPolling::resolve,
    );
    match polling {
        Ok(polling) => DeliveryProvider::detect(Some(Box::new(polling))),
        Err(err) => {
            debug!(error = %err, "polling bindings not usable");
            DeliveryProvider::detect(None)
        }
    }
}

// =============================================================================
// Watcher Functions
// =============================================================================

/// Opaque handle to a watcher.
pub struct WidthsyncWatcher(Watcher);

/// Create a stopped watcher.
///
/// `bindings` may be NULL, in which case the watcher uses host timer
/// delivery. Returns NULL if `options` is NULL or incomplete.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_watcher_new(
    options: *const WidthsyncOptionTable,
    bindings: *const WidthsyncPollingBindings,
) -> *mut WidthsyncWatcher {
    let Some(sink) = options.as_ref().and_then(HostOptions::new) else {
        return ptr::null_mut();
    };
    let provider = provider_for(bindings.as_ref());
    Box::into_raw(Box::new(WidthsyncWatcher(Watcher::system(sink, provider))))
}

/// Stop and destroy a watcher.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_watcher_destroy(watcher: *mut WidthsyncWatcher) {
    if !watcher.is_null() {
        drop(Box::from_raw(watcher));
    }
}

/// Start the watcher. `verbose` is 0 (silent) to 3 (every change).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_start(
    watcher: *mut WidthsyncWatcher,
    verbose: c_int,
) -> WidthsyncResult {
    if watcher.is_null() {
        return WidthsyncResult::NullPointer;
    }
    let watcher = &(*watcher).0;
    if watcher.is_busy() {
        return WidthsyncResult::Busy;
    }
    logging::init();
    watcher.start(Verbosity::from_level(verbose));
    WidthsyncResult::Ok
}

/// Stop the watcher. Safe to call repeatedly, and from inside a host
/// option callback, in which case the reset completes when the running
/// cycle returns.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_stop(watcher: *mut WidthsyncWatcher) -> WidthsyncResult {
    if watcher.is_null() {
        return WidthsyncResult::NullPointer;
    }
    (*watcher).0.stop();
    WidthsyncResult::Ok
}

/// Run one cycle, for host timers and task callbacks.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_tick(watcher: *const WidthsyncWatcher) -> WidthsyncResult {
    if watcher.is_null() {
        return WidthsyncResult::NullPointer;
    }
    let watcher = &(*watcher).0;
    if !watcher.mode().is_active() {
        return WidthsyncResult::NotRunning;
    }
    if watcher.is_busy() {
        return WidthsyncResult::Busy;
    }
    watcher.tick();
    WidthsyncResult::Ok
}

/// Current delivery mode.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_mode(watcher: *const WidthsyncWatcher) -> DeliveryMode {
    if watcher.is_null() {
        return DeliveryMode::Uninitialized;
    }
    (*watcher).0.mode()
}

/// Width last written to the host, or 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn widthsync_last_width(watcher: *const WidthsyncWatcher) -> c_int {
    if watcher.is_null() {
        return 0;
    }
    (*watcher).0.last_width().map_or(0, c_int::from)
}

/// Probe the terminal directly. 0 when stdout is not a terminal.
#[unsafe(no_mangle)]
pub extern "C" fn widthsync_probe_columns() -> c_int {
    c_int::from(terminal::probe().cols)
}

/// Get the widthsync version string.
#[unsafe(no_mangle)]
pub extern "C" fn widthsync_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast::<c_char>()
}
