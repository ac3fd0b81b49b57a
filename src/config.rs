//! Compile-time constants and the verbosity level.

use std::env;
use std::time::Duration;

/// How often the host's event loop should run the poll callback.
pub const POLL_INTERVAL: Duration = Duration::from_micros(150_000);

/// Host option receiving the terminal column count.
pub const WIDTH_OPTION: &str = "width";

/// Host option asking the host to schedule ticks itself.
pub const FORCE_TIMER_OPTION: &str = "setwidth2.force_timer";

/// Environment variable read by [`Verbosity::from_env`].
pub const VERBOSE_ENV: &str = "WIDTHSYNC_VERBOSE";

/// Diagnostic verbosity.
///
/// Each level includes the messages of the levels below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Verbosity {
    /// No diagnostics.
    #[default]
    Silent = 0,
    /// Start and delivery-mode messages.
    Lifecycle = 1,
    /// Adds probe-failure warnings.
    ProbeWarnings = 2,
    /// Adds a line for every applied width change.
    WidthChanges = 3,
}

impl Verbosity {
    /// Map a host-supplied integer level, clamping out-of-range values.
    pub const fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=0 => Self::Silent,
            1 => Self::Lifecycle,
            2 => Self::ProbeWarnings,
            _ => Self::WidthChanges,
        }
    }

    /// Read the level from `WIDTHSYNC_VERBOSE`, defaulting to silent.
    pub fn from_env() -> Self {
        env::var(VERBOSE_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .map_or(Self::Silent, Self::from_level)
    }

    /// The integer level.
    pub const fn level(self) -> i32 {
        self as i32
    }

    /// Whether messages of `other` should be emitted at this level.
    #[inline]
    pub fn allows(self, other: Self) -> bool {
        other != Self::Silent && self >= other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_level_clamps() {
        assert_eq!(Verbosity::from_level(-4), Verbosity::Silent);
        assert_eq!(Verbosity::from_level(0), Verbosity::Silent);
        assert_eq!(Verbosity::from_level(2), Verbosity::ProbeWarnings);
        assert_eq!(Verbosity::from_level(99), Verbosity::WidthChanges);
    }

    #[test]
    fn test_allows_is_cumulative() {
        let v = Verbosity::ProbeWarnings;
        assert!(v.allows(Verbosity::Lifecycle));
        assert!(v.allows(Verbosity::ProbeWarnings));
        assert!(!v.allows(Verbosity::WidthChanges));
        assert!(!Verbosity::WidthChanges.allows(Verbosity::Silent));
    }

    #[test]
    fn test_poll_interval_micros() {
        assert_eq!(POLL_INTERVAL.as_micros(), 150_000);
    }
}
