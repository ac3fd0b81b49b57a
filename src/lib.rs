//! # widthsync
//!
//! Keeps a host's `width` option in sync with the controlling terminal.
//!
//! An interpreter or REPL embedding this crate gets its display width
//! updated whenever the user resizes the terminal, and only then.
//!
//! ## Core Concepts
//!
//! - **Probe**: ask the OS for the terminal size (zero when there is none)
//! - **Detect**: compare against the last width written; skip if equal
//! - **Apply**: write `width` into the host's option table
//! - **Delivery**: the host's polled-event loop runs the cycle, or the host
//!   schedules ticks from its own timer when it has no such loop
//!
//! ## Example
//!
//! ```rust
//! use widthsync::{DeliveryMode, DeliveryProvider, LocalEventLoop, MemoryOptions};
//! use widthsync::{TerminalSize, Verbosity, Watcher};
//!
//! let options = MemoryOptions::new();
//! let event_loop = LocalEventLoop::new();
//! let watcher = Watcher::new(
//!     || TerminalSize::new(24, 80),
//!     options.clone(),
//!     DeliveryProvider::polling(event_loop.clone()),
//! );
//!
//! assert_eq!(watcher.start(Verbosity::Silent), DeliveryMode::ActivePolling);
//! event_loop.run_pending();
//! assert_eq!(options.width(), Some(80));
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod ffi;
pub mod host;
pub mod logging;
pub mod terminal;
pub mod watcher;

// Re-exports for convenience
pub use config::{Verbosity, FORCE_TIMER_OPTION, POLL_INTERVAL, WIDTH_OPTION};
pub use delivery::{DeliveryMode, DeliveryProvider};
pub use error::{Error, Result};
pub use host::{Capabilities, HandlerId, LocalEventLoop, MemoryOptions, OptionSink, OptionValue, PollingApi};
pub use terminal::{GeometryProbe, SystemProbe, TerminalSize};
pub use watcher::{Evaluation, Watcher};
