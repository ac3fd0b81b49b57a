//! Terminal module: geometry probing for the controlling terminal.
//!
//! Only the size query lives here. Input, escapes and raw mode are left
//! entirely to the host.

mod probe;

pub use probe::{probe, GeometryProbe, SystemProbe, TerminalSize};
