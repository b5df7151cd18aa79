//! Output sink — the boundary to the actual light.
//!
//! The engine never talks to hardware directly; it pushes mixed colors
//! through this trait from within a single worker task, so implementations
//! are never called concurrently for the same light.

use std::io::{self, Write};

use tracing::debug;

/// A device (or service) that can display one color.
///
/// Implementations convert the RGB + brightness pair to their native
/// format and handle device errors internally — these methods cannot fail.
pub trait OutputSink: Send {
    /// Display a color. `brightness` is a 0-100 percentage.
    fn turn_on(&mut self, rgb: (u8, u8, u8), brightness: f32);

    /// Turn the light off entirely.
    fn turn_off(&mut self);
}

/// Sink that renders color changes as true-color swatches on stdout.
///
/// Stands in for real hardware during previews and daemon runs without a
/// configured device.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    label: String,
}

impl ConsoleSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn print(&self, line: String) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

impl OutputSink for ConsoleSink {
    fn turn_on(&mut self, rgb: (u8, u8, u8), brightness: f32) {
        let (r, g, b) = rgb;
        debug!(light = %self.label, r, g, b, brightness, "turn on");
        self.print(format!(
            "{:>12}  \x1b[48;2;{r};{g};{b}m      \x1b[0m  RGB({r:3},{g:3},{b:3})  #{r:02X}{g:02X}{b:02X}  {brightness:5.1}%",
            self.label
        ));
    }

    fn turn_off(&mut self) {
        debug!(light = %self.label, "turn off");
        self.print(format!("{:>12}  \x1b[48;2;0;0;0m      \x1b[0m  off", self.label));
    }
}
