//! Error type shared by the watcher, its host adapters and the C API.

use crate::host::Capabilities;
use thiserror::Error;

/// Errors raised inside the watcher.
///
/// None of these are fatal to the host. They are either turned into a
/// delivery-mode decision by the lifecycle controller or swallowed by the
/// isolation boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The host rejected an option write.
    #[error("host rejected option `{option}`: {reason}")]
    HostEvaluation {
        /// Name of the option being written.
        option: String,
        /// Host-supplied reason.
        reason: String,
    },

    /// The polling subsystem is missing some of its bindings.
    #[error("event loop polling unavailable (missing {0:?})")]
    CapabilityUnavailable(Capabilities),

    /// The host accepted the registration call but returned no handle.
    #[error("failed to install polled handler")]
    RegistrationFailed,

    /// The watcher core is already running a cycle on this thread.
    #[error("watcher is busy")]
    Busy,

    /// A panic was caught at the isolation boundary.
    #[error("panic in update cycle: {0}")]
    Panicked(String),
}

impl Error {
    /// Shorthand for a host rejection of `option`.
    pub fn host(option: &str, reason: impl Into<String>) -> Self {
        Self::HostEvaluation {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
