//! Unified progress bar helpers
//!
//! Provides consistent progress bar styling for downloads, hashing,
//! extraction and remote operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Standard spinner characters used throughout trond
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

const SPINNER_TEMPLATE: &str = "     {spinner:.cyan} {msg}";
const BYTES_TEMPLATE: &str =
    "     {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {bytes}/{total_bytes} {bytes_per_sec} ({eta})";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS)
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BYTES_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

/// Create a spinner progress bar with standard styling.
///
/// # Example
/// ```ignore
/// let pb = create_spinner("extracting FullNode_output-directory.tgz");
/// // ... do work ...
/// pb.finish_and_clear();
/// ```
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Create a progress bar with byte tracking (for downloads and hashing).
pub fn create_byte_progress(total_bytes: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    pb.set_style(bytes_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// RAII guard that clears a progress bar when dropped.
///
/// Useful for ensuring progress bars are cleaned up even on errors.
pub struct ProgressGuard<'a>(&'a ProgressBar);

impl<'a> ProgressGuard<'a> {
    pub fn new(pb: &'a ProgressBar) -> Self {
        Self(pb)
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Run a closure with a spinner, clearing it when done.
pub fn with_spinner<T, E>(message: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pb = create_spinner(message);
    let _guard = ProgressGuard::new(&pb);
    f()
}
