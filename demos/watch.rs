//! Watch demo: keep an in-memory option table in sync with this terminal.
//!
//! Runs in host timer mode with a crossbeam ticker standing in for the
//! host's timer. Resize the terminal to see `width` change.
//!
//! ```text
//! WIDTHSYNC_VERBOSE=3 cargo run --example watch
//! ```

use crossbeam_channel::{after, select, tick};
use std::time::Duration;
use widthsync::{DeliveryProvider, Evaluation, MemoryOptions, Verbosity, Watcher};

fn main() {
    widthsync::logging::init();

    println!("widthsync watch demo");
    println!("====================");
    println!();

    let options = MemoryOptions::new();
    let watcher = Watcher::system(options.clone(), DeliveryProvider::HostTimerFallback);
    let mode = watcher.start(Verbosity::from_env());

    println!("Mode:        {mode:?}");
    println!("force_timer: {}", options.force_timer());
    println!("Width:       {:?}", options.width());
    println!();
    println!("Watching for 10 seconds; resize the terminal...");

    let timer = tick(widthsync::POLL_INTERVAL);
    let deadline = after(Duration::from_secs(10));
    loop {
        select! {
            recv(timer) -> _ => {
                if let Some(Evaluation::Applied(cols)) = watcher.tick() {
                    println!("width -> {cols}");
                }
            }
            recv(deadline) -> _ => break,
        }
    }

    watcher.stop();
    println!();
    println!("History: {:?}", options.history(widthsync::WIDTH_OPTION));
}
