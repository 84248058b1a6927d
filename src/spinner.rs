//! A minimal terminal spinner shown while a reply is drafted or published.
//!
//! Network calls have no timeout in the engine, so the spinner also shows
//! elapsed seconds: a stuck call is visible and can be cancelled with Ctrl+C.

use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// Elapsed time is only shown after this long.
const SHOW_ELAPSED_AFTER: Duration = Duration::from_secs(2);

/// A terminal spinner that runs in a background task, writing to stderr.
pub struct Spinner {
    handle: JoinHandle<()>,
    cancel: tokio::sync::watch::Sender<bool>,
}

impl Spinner {
    /// Start a spinner with the given message (e.g. `"drafting reply"`).
    pub fn start(message: &str) -> Self {
        let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
        let message = message.to_string();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut i = 0;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                let line = render_line(frame, &message, started.elapsed());
                // \r moves to start of line, \x1b[2K clears the line
                eprint!("\x1b[2K\r{line}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            cancel: cancel_tx,
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }

    /// Show a spinner for as long as `fut` runs.
    pub async fn while_running<F: Future>(message: &str, fut: F) -> F::Output {
        let spinner = Self::start(message);
        let output = fut.await;
        spinner.stop().await;
        output
    }
}

fn render_line(frame: &str, message: &str, elapsed: Duration) -> String {
    if elapsed >= SHOW_ELAPSED_AFTER {
        format!("{frame} {message} ({}s)", elapsed.as_secs())
    } else {
        format!("{frame} {message}")
    }
}
