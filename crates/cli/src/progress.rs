use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run `step` behind a spinner, leaving `done` or the failure on screen.
pub async fn with_spinner<T, E, F>(
    msg: &str,
    done: impl FnOnce(&T) -> String,
    step: F,
) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let spinner = create_spinner(msg);
    let result = step.await;
    match &result {
        Ok(value) => spinner.finish_with_message(done(value)),
        Err(_) => spinner.abandon_with_message(format!("{msg} failed")),
    }
    result
}
