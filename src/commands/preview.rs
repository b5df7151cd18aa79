//! Local pattern playback — exercise a pattern without daemon or hardware.

use std::time::Duration;

use super::CommandResult;
use color_notify::{ConsoleSink, LightConfig, LightWorker, PatternLibrary};

/// Play a library pattern through a real worker onto a terminal sink.
pub async fn preview(pattern: &str, seconds: u64) -> CommandResult {
    let library = PatternLibrary::load_default()?;
    let config = library
        .get(pattern)
        .ok_or_else(|| format!("unknown pattern: {pattern}"))?;

    println!(
        "Previewing {:?} (priority {}) for {seconds}s",
        pattern, config.priority
    );

    let (handle, join) = LightWorker::spawn(
        LightConfig {
            name: "preview".to_string(),
            cycle_interval: None,
        },
        Box::new(ConsoleSink::new("preview")),
    );
    handle.add(pattern, config.to_sequence(), config.expire_after());

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    handle.shutdown();
    join.await?;
    Ok(())
}

/// Print the pattern library.
pub fn patterns() -> CommandResult {
    let library = PatternLibrary::load_default()?;

    println!("{:<12} {:<8} {:<8} Description", "Name", "Priority", "Expiry");
    println!("{}", "-".repeat(60));
    for (name, config) in &library.patterns {
        let expiry = match config.expire_ms {
            Some(ms) if ms > 0 => format!("{ms}ms"),
            _ => "-".to_string(),
        };
        println!(
            "{:<12} {:<8} {:<8} {}",
            name,
            config.priority,
            expiry,
            config.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
