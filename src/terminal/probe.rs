//! Geometry prober: asks the OS how big the controlling terminal is.
//!
//! Failure is never an error here. A redirected stdout, a missing console
//! or a failed query all come back as a zero-sized [`TerminalSize`].

use crossterm::tty::IsTty;
use std::io;

/// Rows and columns of the terminal attached to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TerminalSize {
    /// Visible rows.
    pub rows: u16,
    /// Visible columns.
    pub cols: u16,
}

impl TerminalSize {
    /// Create a size from explicit dimensions.
    #[inline]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// The "no terminal" answer.
    pub const UNKNOWN: Self = Self::new(0, 0);

    /// Whether the probe produced a usable width.
    #[inline]
    pub const fn is_known(&self) -> bool {
        self.cols > 0
    }
}

/// A source of terminal sizes.
///
/// [`SystemProbe`] talks to the OS. Any `Fn() -> TerminalSize` closure is
/// also a probe, which is how hosts with their own notion of geometry (and
/// tests) plug in.
pub trait GeometryProbe {
    /// Sample the current size.
    fn probe(&self) -> TerminalSize;
}

impl<F> GeometryProbe for F
where
    F: Fn() -> TerminalSize,
{
    #[inline]
    fn probe(&self) -> TerminalSize {
        self()
    }
}

/// The platform prober.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl GeometryProbe for SystemProbe {
    #[inline]
    fn probe(&self) -> TerminalSize {
        probe()
    }
}

/// Query the terminal attached to stdout.
///
/// Returns [`TerminalSize::UNKNOWN`] when stdout is not a terminal.
pub fn probe() -> TerminalSize {
    if !io::stdout().is_tty() {
        return TerminalSize::UNKNOWN;
    }
    sys::window_size().unwrap_or(TerminalSize::UNKNOWN)
}

#[cfg(unix)]
#[allow(unsafe_code)]
mod sys {
    use super::TerminalSize;

    /// `TIOCGWINSZ` on stdout.
    pub(super) fn window_size() -> Option<TerminalSize> {
        // SAFETY: `ws` is a plain-old-data out parameter of the exact type
        // the ioctl expects, and STDOUT_FILENO is always a valid descriptor
        // number (the call fails cleanly if it is closed).
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        (rc == 0).then(|| TerminalSize::new(ws.ws_row, ws.ws_col))
    }
}

#[cfg(windows)]
mod sys {
    use super::TerminalSize;

    /// Console screen buffer window rectangle.
    pub(super) fn window_size() -> Option<TerminalSize> {
        // crossterm derives both extents from srWindow (right - left + 1).
        crossterm::terminal::size()
            .ok()
            .map(|(cols, rows)| TerminalSize::new(rows, cols))
    }
}

#[cfg(not(any(unix, windows)))]
mod sys {
    use super::TerminalSize;

    pub(super) const fn window_size() -> Option<TerminalSize> {
        None
    }
}
