// ColorNotify - priority notification engine for a single RGB light
// Pattern compiler, step VM, sequence scheduling, and the per-light worker

pub mod color;
pub mod config;
pub mod mux;
pub mod pattern;
pub mod sequence;
pub mod sink;
pub mod worker;

#[cfg(feature = "dbus")]
pub mod daemon;

pub use color::ColorInfo;
pub use config::{NotificationConfig, PatternLibrary, DEFAULT_PRIORITY};
pub use pattern::{compile, PatternItem, Program, Step};
pub use sequence::Sequence;
pub use sink::{ConsoleSink, OutputSink};
pub use worker::{Command, LightConfig, LightHandle, LightWorker, BASELINE_ID};
