// CLI definitions using clap

use clap::{Parser, Subcommand};
#[cfg(feature = "dbus")]
use color_notify::DEFAULT_PRIORITY;

#[derive(Parser)]
#[command(name = "color-notify")]
#[command(author, version, about = "Priority notification light controller")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the notification daemon
    #[cfg(feature = "dbus")]
    Daemon {
        /// Light name used in logs and sink output
        #[arg(long, default_value = "light-0")]
        light: String,

        /// Rotate tied top-priority notifications every N ms
        #[arg(long, value_name = "MS")]
        cycle_ms: Option<u64>,

        /// Priority of the light's own on state
        #[arg(long, default_value_t = DEFAULT_PRIORITY)]
        on_priority: i32,
    },

    /// Turn a notification on
    #[cfg(feature = "dbus")]
    #[command(visible_alias = "on")]
    Notify {
        /// Notification id (reuse it to replace, or to turn off later)
        id: String,

        /// Named pattern from the library
        #[arg(long, conflicts_with = "pattern_json")]
        pattern: Option<String>,

        /// Inline JSON pattern array, e.g. '["[", {"rgb": [255,0,0]}, "]"]'
        #[arg(long, value_name = "JSON")]
        pattern_json: Option<String>,

        /// Priority override (higher wins; default comes from the pattern)
        #[arg(short, long)]
        priority: Option<i32>,

        /// Auto-expire after N ms (0 = never; default comes from the pattern)
        #[arg(long, value_name = "MS")]
        expire_ms: Option<i64>,
    },

    /// Turn a notification off
    #[cfg(feature = "dbus")]
    Off {
        /// Notification id used when it was turned on
        id: String,
    },

    /// List active notifications
    #[cfg(feature = "dbus")]
    #[command(visible_alias = "ls")]
    List,

    /// Clear all notifications
    #[cfg(feature = "dbus")]
    Clear,

    /// Rotate which tied notification is emphasized first
    #[cfg(feature = "dbus")]
    Cycle,

    /// Turn the wrapped light itself on
    #[cfg(feature = "dbus")]
    LightOn,

    /// Turn the wrapped light itself off
    #[cfg(feature = "dbus")]
    LightOff,

    /// List the patterns in the library
    #[command(visible_alias = "pat")]
    Patterns,

    /// Play a library pattern on a terminal sink (no daemon needed)
    Preview {
        /// Named pattern from the library
        pattern: String,

        /// How long to run, in seconds
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}
