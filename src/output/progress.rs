//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use indicatif::{ProgressBar, ProgressStyle};

/// Create a byte progress bar for the archive upload.
///
/// # Panics
///
/// Panics if the progress bar template string is invalid (it is a
/// compile-time constant and will not panic).
#[must_use]
pub fn bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {msg}\n    {bar:40.cyan/dim} {percent}%  {bytes}/{total_bytes}")
            .expect("valid template")
            .progress_chars("━━─"),
    );
    pb.set_message(msg.to_string());
    pb
}
