//! Host module: the two seams between the watcher and its embedding host.
//!
//! - [`OptionSink`]: where width updates go (the host's option table)
//! - [`PollingApi`]: the host's optional polled-event loop
//!
//! Both are traits so that the C API and Rust hosts can plug in their own
//! implementations. [`MemoryOptions`] and [`LocalEventLoop`] are ready-made
//! in-process versions.

mod options;
mod polling;

pub use options::{apply_width, request_timer_fallback, MemoryOptions, OptionSink, OptionValue};
pub use polling::{Capabilities, HandlerId, LocalEventLoop, PollCallback, PollingApi};
