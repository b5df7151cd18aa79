//! Command handlers for the CLI application.
//!
//! - `daemon`: run the notification daemon
//! - `notify`: D-Bus client commands (notify, off, list, clear, cycle)
//! - `preview`: local pattern playback and library listing

#[cfg(feature = "dbus")]
pub mod daemon;
#[cfg(feature = "dbus")]
pub mod notify;
pub mod preview;

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
