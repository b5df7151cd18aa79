//! ColorNotify CLI
//!
//! Run the notification daemon, post and clear notifications, and preview
//! patterns locally.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers (split from main.rs)
mod commands;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "dbus")]
        Commands::Daemon {
            light,
            cycle_ms,
            on_priority,
        } => {
            commands::daemon::run(light, cycle_ms, on_priority).await?;
        }

        #[cfg(feature = "dbus")]
        Commands::Notify {
            id,
            pattern,
            pattern_json,
            priority,
            expire_ms,
        } => {
            commands::notify::notify(
                &id,
                pattern.as_deref(),
                pattern_json.as_deref(),
                priority,
                expire_ms,
            )
            .await?;
        }

        #[cfg(feature = "dbus")]
        Commands::Off { id } => {
            commands::notify::off(&id).await?;
        }

        #[cfg(feature = "dbus")]
        Commands::List => {
            commands::notify::list().await?;
        }

        #[cfg(feature = "dbus")]
        Commands::Clear => {
            commands::notify::clear().await?;
        }

        #[cfg(feature = "dbus")]
        Commands::Cycle => {
            commands::notify::cycle().await?;
        }

        #[cfg(feature = "dbus")]
        Commands::LightOn => {
            commands::notify::light_on().await?;
        }

        #[cfg(feature = "dbus")]
        Commands::LightOff => {
            commands::notify::light_off().await?;
        }

        Commands::Patterns => {
            commands::preview::patterns()?;
        }

        Commands::Preview { pattern, seconds } => {
            commands::preview::preview(&pattern, seconds).await?;
        }
    }

    Ok(())
}
