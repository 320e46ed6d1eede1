
//! Utilities for creating and styling progress reporting using the `indicatif` crate.
//!
//! The input stream length is unknown up front, so progress is reported as a
//! running record count with throughput rather than a bounded bar.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner tracking records processed and throughput.
pub fn progress_spinner() -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::default_spinner()
            .template("[{elapsed_precise}] {spinner:.cyan} {human_pos} records [{per_sec}]")
            .expect("Invalid progress style."),
    );

    progress_bar
}
