//! Spinner feedback for long-running steps

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner tick interval
const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Start a spinner with `message`; hidden in quiet mode
pub fn spinner(message: impl Into<String>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["◐", "◓", "◑", "◒"]);
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(TICK_INTERVAL);
    spinner
}
