//! Isolation boundary around every host-driven cycle.
//!
//! Poll callbacks and timer ticks run inside the host's dispatch machinery.
//! Nothing raised below this point may reach it: errors are logged and
//! dropped, panics are caught and dropped.

use crate::error::{Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Run `f`, returning its value or `None` if it failed in any way.
pub fn isolate<T, F>(context: &'static str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T>,
{
    let err = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => err,
        Err(payload) => Error::Panicked(panic_message(payload.as_ref())),
    };
    debug!(context, error = %err, "discarded error at isolation boundary");
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_value_through() {
        assert_eq!(isolate("test", || Ok(7)), Some(7));
    }

    #[test]
    fn test_swallows_error() {
        let out: Option<()> = isolate("test", || Err(Error::host("width", "bad value")));
        assert!(out.is_none());
    }

    #[test]
    fn test_swallows_panic() {
        let out: Option<()> = isolate("test", || panic!("host blew up"));
        assert!(out.is_none());
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "non-string panic payload");
    }
}
