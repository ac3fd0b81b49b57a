//! Change detector: probe, compare against the cached width, apply.

use super::state::WatcherState;
use crate::config::Verbosity;
use crate::error::Result;
use crate::host::{apply_width, OptionSink};
use crate::terminal::GeometryProbe;
use tracing::{info, warn};

/// Outcome of one probe → detect → apply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// No usable width; nothing changed.
    ProbeFailed,
    /// Width equals the cached one; the host was not called.
    Unchanged,
    /// The host was sent this width.
    Applied(u16),
}

/// Run one cycle.
///
/// The cache is updated before the host is called, so a host that rejects
/// the write is not asked again for the same width.
pub fn evaluate_and_apply(
    state: &mut WatcherState,
    probe: &dyn GeometryProbe,
    sink: &mut dyn OptionSink,
) -> Result<Evaluation> {
    let size = probe.probe();
    if !size.is_known() {
        if state.verbosity.allows(Verbosity::ProbeWarnings) {
            warn!("unable to detect terminal width");
        }
        return Ok(Evaluation::ProbeFailed);
    }

    if state.last_width == Some(size.cols) {
        return Ok(Evaluation::Unchanged);
    }

    state.last_width = Some(size.cols);
    apply_width(sink, size.cols)?;

    if state.verbosity.allows(Verbosity::WidthChanges) {
        info!(cols = size.cols, "{} columns", size.cols);
    }
    Ok(Evaluation::Applied(size.cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryOptions, OptionValue};
    use crate::terminal::TerminalSize;
    use crate::Error;
    use std::cell::Cell;

    fn run(widths: &[u16]) -> (Vec<Evaluation>, MemoryOptions, WatcherState) {
        let cols = Cell::new(0u16);
        let probe = || TerminalSize::new(24, cols.get());
        let options = MemoryOptions::new();
        let mut sink = options.clone();
        let mut state = WatcherState::default();
        let outcomes = widths
            .iter()
            .map(|w| {
                cols.set(*w);
                evaluate_and_apply(&mut state, &probe, &mut sink).unwrap()
            })
            .collect();
        (outcomes, options, state)
    }

    #[test]
    fn test_80_80_120() {
        let (outcomes, options, state) = run(&[80, 80, 120]);
        assert_eq!(
            outcomes,
            vec![
                Evaluation::Applied(80),
                Evaluation::Unchanged,
                Evaluation::Applied(120)
            ]
        );
        assert_eq!(
            options.history("width"),
            vec![OptionValue::Integer(80), OptionValue::Integer(120)]
        );
        assert_eq!(state.last_width, Some(120));
    }

    #[test]
    fn test_failed_probe_keeps_width_unset() {
        let (outcomes, options, state) = run(&[0]);
        assert_eq!(outcomes, vec![Evaluation::ProbeFailed]);
        assert!(options.writes().is_empty());
        assert_eq!(state.last_width, None);

        let (_, options, state) = run(&[0, 100]);
        assert_eq!(options.history("width"), vec![OptionValue::Integer(100)]);
        assert_eq!(state.last_width, Some(100));
    }

    #[test]
    fn test_failed_probe_does_not_clobber_cache() {
        let (outcomes, options, state) = run(&[90, 0, 90]);
        assert_eq!(
            outcomes,
            vec![
                Evaluation::Applied(90),
                Evaluation::ProbeFailed,
                Evaluation::Unchanged
            ]
        );
        assert_eq!(options.history("width").len(), 1);
        assert_eq!(state.last_width, Some(90));
    }

    #[test]
    fn test_updates_only_on_change() {
        let widths = [0, 80, 80, 0, 80, 100, 100, 80, 0, 0, 132];
        let (_, options, _) = run(&widths);

        let mut expected = Vec::new();
        let mut last = None;
        for w in widths {
            if w > 0 && last != Some(w) {
                expected.push(OptionValue::Integer(i32::from(w)));
                last = Some(w);
            }
        }
        assert_eq!(options.history("width"), expected);
    }

    #[test]
    fn test_failed_probe_is_silent_at_every_level() {
        for level in 0..=3 {
            let mut state = WatcherState {
                verbosity: Verbosity::from_level(level),
                ..WatcherState::default()
            };
            let mut options = MemoryOptions::new();
            let outcome =
                evaluate_and_apply(&mut state, &|| TerminalSize::UNKNOWN, &mut options).unwrap();
            assert_eq!(outcome, Evaluation::ProbeFailed);
            assert!(options.writes().is_empty());
        }
    }

    #[test]
    fn test_host_rejection_still_caches_width() {
        struct Rejecting;
        impl OptionSink for Rejecting {
            fn set_option(&mut self, name: &str, _value: OptionValue) -> Result<()> {
                Err(Error::host(name, "boom"))
            }
        }

        let mut state = WatcherState::default();
        let probe = || TerminalSize::new(24, 80);
        assert!(evaluate_and_apply(&mut state, &probe, &mut Rejecting).is_err());
        assert_eq!(state.last_width, Some(80));
        assert_eq!(
            evaluate_and_apply(&mut state, &probe, &mut Rejecting).unwrap(),
            Evaluation::Unchanged
        );
    }
}
