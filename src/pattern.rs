//! Pattern compiler — declarative color patterns to executable programs.
//!
//! A pattern is an ordered list of items, each either a structured
//! [`ColorInfo`] or a string token:
//!
//! - `"["` opens a loop
//! - `"]"` closes the innermost loop, `"],N"` repeats the body N more times
//! - anything else is a compact JSON color entry, e.g.
//!   `{"rgb_color": [255, 0, 0], "delay": 1.5}` (braces optional)
//!
//! Compilation is pure and deterministic: the same pattern always yields
//! the same [`Program`]. Entries that fail to parse are logged and skipped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::{self, ColorInfo};

/// Index of a loop's frame slot, assigned sequentially at compile time.
pub type LoopId = usize;

/// One atomic instruction of a compiled program.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Update the workspace color.
    SetColor(ColorInfo),
    /// Mark a loop entry point.
    OpenLoop(LoopId),
    /// Jump back to the matching open point until the repeat budget is
    /// spent. `repeats < 0` loops forever.
    CloseLoop { id: LoopId, repeats: i32 },
    /// Suspend the running sequence.
    Delay(Duration),
}

/// A compiled, immutable step program.
///
/// Shared read-only across runs; a fresh workspace replays it identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    steps: Vec<Step>,
    loop_slots: usize,
    initial_color: ColorInfo,
}

impl Program {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, idx: usize) -> Option<&Step> {
        self.steps.get(idx)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of loop frame slots a workspace must allocate.
    pub fn loop_slots(&self) -> usize {
        self.loop_slots
    }

    /// Color displayed before the first step executes: the first color in
    /// the pattern, or off for a colorless pattern.
    pub fn initial_color(&self) -> ColorInfo {
        self.initial_color
    }

    /// Build a program from raw steps, bypassing the compiler's pairing
    /// guarantees. Tests use this to provoke VM faults.
    #[cfg(test)]
    pub(crate) fn from_raw_steps(
        steps: Vec<Step>,
        loop_slots: usize,
        initial_color: ColorInfo,
    ) -> Program {
        Program {
            steps,
            loop_slots,
            initial_color,
        }
    }
}

/// One entry of a declarative pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternItem {
    Color(ColorInfo),
    Token(String),
}

impl From<ColorInfo> for PatternItem {
    fn from(color: ColorInfo) -> Self {
        PatternItem::Color(color)
    }
}

impl From<&str> for PatternItem {
    fn from(token: &str) -> Self {
        PatternItem::Token(token.to_string())
    }
}

/// Free-text color entry, as accepted by the original pattern format.
#[derive(Deserialize)]
struct ColorToken {
    #[serde(alias = "rgb")]
    rgb_color: Option<(u8, u8, u8)>,
    brightness: Option<f32>,
    /// Hold time in seconds after setting the color.
    delay: Option<f64>,
}

/// Compile a pattern into a program.
///
/// Total: malformed entries are logged and skipped, never fatal. Brackets
/// are expected to be balanced by the caller; an unmatched close token is
/// skipped, so every emitted `CloseLoop` pairs with an emitted `OpenLoop`.
pub fn compile(pattern: &[PatternItem]) -> Program {
    let mut steps: Vec<Step> = Vec::with_capacity(pattern.len());
    let mut initial_color: Option<ColorInfo> = None;
    let mut next_loop_id: LoopId = 0;
    let mut loop_stack: Vec<LoopId> = Vec::new();

    for item in pattern {
        match item {
            PatternItem::Color(color) => {
                initial_color.get_or_insert(*color);
                steps.push(Step::SetColor(*color));
            }
            PatternItem::Token(token) => {
                let token = token.trim();
                if token == "[" {
                    steps.push(Step::OpenLoop(next_loop_id));
                    loop_stack.push(next_loop_id);
                    next_loop_id += 1;
                } else if let Some(rest) = token.strip_prefix(']') {
                    let Some(id) = loop_stack.pop() else {
                        warn!("pattern has close bracket with no open loop, skipping");
                        continue;
                    };
                    steps.push(Step::CloseLoop {
                        id,
                        repeats: parse_repeats(rest),
                    });
                } else {
                    match parse_color_token(token) {
                        Some((color, delay)) => {
                            initial_color.get_or_insert(color);
                            steps.push(Step::SetColor(color));
                            if let Some(secs) = delay {
                                steps.push(Step::Delay(Duration::from_secs_f64(secs)));
                            }
                        }
                        None => warn!("failed to parse pattern entry {token:?}, skipping"),
                    }
                }
            }
        }
    }

    if !loop_stack.is_empty() {
        warn!("pattern left {} loop(s) unclosed", loop_stack.len());
    }

    Program {
        steps,
        loop_slots: next_loop_id,
        initial_color: initial_color.unwrap_or(color::OFF),
    }
}

/// Parse the `",N"` suffix of a close bracket. Missing or unparsable
/// counts mean an infinite loop.
fn parse_repeats(rest: &str) -> i32 {
    let Some(count) = rest.strip_prefix(',') else {
        return -1;
    };
    match count.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            warn!("bad loop count {count:?}, looping forever");
            -1
        }
    }
}

/// Parse a free-text color entry. Braces are optional; a missing color
/// falls back to warm white. Delays must be non-negative and finite.
fn parse_color_token(token: &str) -> Option<(ColorInfo, Option<f64>)> {
    let inner = token.trim_matches(|c| c == '{' || c == '}');
    let body: ColorToken = serde_json::from_str(&format!("{{{inner}}}")).ok()?;

    let color = ColorInfo {
        rgb: body.rgb_color.unwrap_or(color::WARM_WHITE.rgb),
        brightness: body.brightness.unwrap_or(100.0),
    };
    let delay = match body.delay {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Some(secs),
        Some(secs) => {
            warn!("ignoring invalid delay {secs}");
            None
        }
        None => None,
    };
    Some((color, delay))
}
