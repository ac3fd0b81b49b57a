//! Watcher: change detection and the start/stop lifecycle.
//!
//! - [`evaluate_and_apply`]: one probe → detect → apply cycle
//! - [`isolate`]: the boundary every host-driven cycle runs behind
//! - [`Watcher`]: owns the state and the delivery registration

mod boundary;
mod detector;
mod lifecycle;
mod state;

pub use boundary::isolate;
pub use detector::{evaluate_and_apply, Evaluation};
pub use lifecycle::Watcher;
pub use state::WatcherState;
