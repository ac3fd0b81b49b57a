//! Delivery provider: how ticks will reach the watcher.

use crate::host::PollingApi;
use std::fmt;

/// Delivery mechanism chosen by the platform/host layer.
pub enum DeliveryProvider {
    /// The host's event loop runs our poll callback.
    NativePolling(Box<dyn PollingApi>),
    /// No polling API on this host; ask it to schedule ticks through
    /// the `setwidth2.force_timer` option.
    HostTimerFallback,
    /// Platforms where the host always drives ticks from its own timer.
    HostScheduled,
}

impl DeliveryProvider {
    /// Pick a provider for the current platform.
    ///
    /// On Windows the polling API is never consulted.
    pub fn detect(polling: Option<Box<dyn PollingApi>>) -> Self {
        if cfg!(windows) {
            return Self::HostScheduled;
        }
        polling.map_or(Self::HostTimerFallback, Self::NativePolling)
    }

    /// Native polling over `api`.
    pub fn polling(api: impl PollingApi + 'static) -> Self {
        Self::NativePolling(Box::new(api))
    }
}

impl fmt::Debug for DeliveryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativePolling(_) => f.write_str("NativePolling"),
            Self::HostTimerFallback => f.write_str("HostTimerFallback"),
            Self::HostScheduled => f.write_str("HostScheduled"),
        }
    }
}

/// Lifecycle state of a watcher.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Not started (or stopped).
    #[default]
    Uninitialized = 0,
    /// Registered with the host event loop.
    ActivePolling = 1,
    /// Waiting for host-scheduled ticks.
    ActiveFallback = 2,
}

impl DeliveryMode {
    /// Whether the watcher is started.
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalEventLoop;

    #[test]
    fn test_detect_without_api() {
        let provider = DeliveryProvider::detect(None);
        if cfg!(windows) {
            assert!(matches!(provider, DeliveryProvider::HostScheduled));
        } else {
            assert!(matches!(provider, DeliveryProvider::HostTimerFallback));
        }
    }

    #[test]
    fn test_detect_with_api() {
        let provider = DeliveryProvider::detect(Some(Box::new(LocalEventLoop::new())));
        if cfg!(windows) {
            assert!(matches!(provider, DeliveryProvider::HostScheduled));
        } else {
            assert!(matches!(provider, DeliveryProvider::NativePolling(_)));
        }
    }

    #[test]
    fn test_mode_is_active() {
        assert!(!DeliveryMode::Uninitialized.is_active());
        assert!(DeliveryMode::ActivePolling.is_active());
        assert!(DeliveryMode::ActiveFallback.is_active());
    }
}
