//! Delivery: the ways a tick reaches the watcher.
//!
//! ```text
//!  host event loop ──poll callback──┐
//!                                   ├──▶ isolate(evaluate_and_apply)
//!  host timer/task ──Watcher::tick──┘
//! ```
//!
//! [`DeliveryProvider`] is chosen once by the platform/host layer and
//! handed to the [`Watcher`](crate::Watcher). In fallback mode the host's
//! own timer calls [`Watcher::tick`](crate::Watcher::tick).

mod provider;

pub use provider::{DeliveryMode, DeliveryProvider};
