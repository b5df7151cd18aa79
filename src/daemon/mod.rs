//! Notification daemon — D-Bus server in front of a light worker.
//!
//! Architecture:
//! - one worker task owns the light (active/visible sets, output sink)
//! - the D-Bus interface on `org.colornotify.Light1` translates calls into
//!   worker commands; sources post notifications via D-Bus or the CLI
//! - patterns come from the TOML library in `~/.config/color-notify/`
//!
//! Without a hardware integration configured, color changes render as
//! true-color swatches on stdout.

pub mod dbus;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::PatternLibrary;
use crate::sink::ConsoleSink;
use crate::worker::{LightConfig, LightWorker};
use self::dbus::NotifyInterface;

/// Daemon settings, straight from the CLI.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Light name used in logs and sink output.
    pub light: String,
    /// Rotate tied top-priority notifications every this many ms.
    pub cycle_ms: Option<u64>,
    /// Priority of the light's own on state.
    pub on_priority: i32,
}

/// Run the notification daemon until Ctrl-C.
pub async fn run(opts: DaemonOptions) -> anyhow::Result<()> {
    let library = PatternLibrary::load_default()?;
    println!(
        "Patterns: {} loaded from {}",
        library.patterns.len(),
        crate::config::default_library_path().display()
    );
    for name in library.names() {
        println!("  - {name}");
    }

    let config = LightConfig {
        name: opts.light.clone(),
        cycle_interval: opts.cycle_ms.map(Duration::from_millis),
    };
    let sink = Box::new(ConsoleSink::new(opts.light.clone()));
    let (handle, join) = LightWorker::spawn(config, sink);

    // Ctrl-C cancels; the token doubles as the daemon's shutdown signal.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || {
        ctrlc_token.cancel();
    })
    .ok();

    let interface = NotifyInterface::new(handle.clone(), Arc::new(library), opts.on_priority);
    let conn = zbus::connection::Builder::session()?
        .name(dbus::BUS_NAME)?
        .serve_at(dbus::OBJECT_PATH, interface)?
        .build()
        .await?;

    println!("D-Bus: {} on session bus", dbus::BUS_NAME);
    println!("Light: {}", opts.light);
    println!("Ready. Ctrl+C to stop.");

    shutdown.cancelled().await;

    println!("\nStopping light worker...");
    handle.shutdown();
    let _ = join.await;
    drop(conn);
    println!("Done.");
    Ok(())
}
