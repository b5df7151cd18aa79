//! Daemon command handler.

use super::CommandResult;
use color_notify::daemon::{self, DaemonOptions};

/// Run the notification daemon until Ctrl-C.
pub async fn run(light: String, cycle_ms: Option<u64>, on_priority: i32) -> CommandResult {
    daemon::run(DaemonOptions {
        light,
        cycle_ms,
        on_priority,
    })
    .await?;
    Ok(())
}
