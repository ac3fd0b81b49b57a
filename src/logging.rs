//! Log subscriber for hosts that do not install their own.
//!
//! Diagnostics go to stderr, the stream hosts reserve for messages. The
//! filter comes from `WIDTHSYNC_LOG` and defaults to `widthsync=info`; the
//! watcher's [`Verbosity`](crate::Verbosity) decides what is emitted at all.

use tracing::dispatcher;
use tracing::subscriber::NoSubscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "WIDTHSYNC_LOG";

const DEFAULT_FILTER: &str = "widthsync=info";

/// Install a stderr subscriber.
///
/// Returns `false` when a subscriber is already in effect for this thread
/// or globally, which is not an error: the host's subscriber wins.
pub fn init() -> bool {
    if dispatcher::get_default(|current| !current.is::<NoSubscriber>()) {
        return false;
    }
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Run `f` with a thread-local subscriber and return what it logged.
#[cfg(test)]
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, String) {
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};

    #[derive(Clone)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer(Arc::new(Mutex::new(Vec::new())));
    let writer = buffer.clone();
    let subscriber = fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_defers_to_active_subscriber() {
        let (installed, _) = capture(init);
        assert!(!installed);
    }

    #[test]
    fn test_capture_collects_events() {
        let ((), logs) = capture(|| tracing::info!("hello from the watcher"));
        assert!(logs.contains("hello from the watcher"));

        let ((), logs) = capture(|| tracing::debug!("below the level"));
        assert!(logs.is_empty());
    }
}
