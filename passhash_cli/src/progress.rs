use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(80);

/// Shows a spinner with `message` until `task` completes.
pub async fn spin<T>(message: &'static str, task: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();

    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(TICK);

    let output = task.await;

    spinner.finish_and_clear();

    output
}
