//! Step virtual machine.
//!
//! Executes one program against a private workspace: a step cursor, the
//! current color, and loop frames in an indexed slot array (loop ids are
//! assigned sequentially at compile time).

use thiserror::Error;

use crate::color::ColorInfo;
use crate::pattern::{LoopId, Program, Step};

/// Internal-consistency failures of program execution.
///
/// The compiler always pairs loops, so hitting one of these means a
/// compiler or VM defect, not bad input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// A `CloseLoop` ran with no frame for its loop id.
    #[error("close of loop {0} with no matching open frame")]
    UnmatchedCloseLoop(LoopId),
}

/// Runtime state of one loop, alive only while the loop executes.
#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    open_idx: usize,
    iterations: i32,
}

/// Per-run execution state. Exclusively owned by its sequence's run; a
/// fresh workspace replays the same program identically.
#[derive(Debug)]
pub struct Workspace {
    next_idx: usize,
    color: ColorInfo,
    loops: Vec<Option<LoopFrame>>,
}

impl Workspace {
    pub fn new(program: &Program) -> Self {
        Self {
            next_idx: 0,
            color: program.initial_color(),
            loops: vec![None; program.loop_slots()],
        }
    }

    /// Color after the most recently executed step.
    pub fn color(&self) -> ColorInfo {
        self.color
    }

    /// Index of the step that will execute next.
    pub fn next_idx(&self) -> usize {
        self.next_idx
    }
}

/// Execute the next step of `program`, returning `true` once the cursor
/// has moved past the end.
///
/// `Delay` steps suspend the calling task; everything else is immediate.
pub async fn run_next_step(program: &Program, ws: &mut Workspace) -> Result<bool, VmError> {
    let Some(step) = program.step(ws.next_idx) else {
        return Ok(true);
    };
    let idx = ws.next_idx;
    ws.next_idx += 1;

    match step {
        Step::SetColor(color) => ws.color = *color,
        Step::OpenLoop(id) => {
            let slot = ws
                .loops
                .get_mut(*id)
                .expect("compiler sized the loop slot array");
            if slot.is_none() {
                *slot = Some(LoopFrame {
                    open_idx: idx,
                    iterations: 0,
                });
            }
        }
        Step::CloseLoop { id, repeats } => {
            let frame = ws
                .loops
                .get_mut(*id)
                .and_then(|slot| slot.as_mut())
                .ok_or(VmError::UnmatchedCloseLoop(*id))?;
            frame.iterations += 1;
            let open_idx = frame.open_idx;
            if *repeats < 0 || frame.iterations <= *repeats {
                // Re-enter the body, skipping the open marker itself.
                ws.next_idx = open_idx + 1;
            } else {
                ws.loops[*id] = None;
            }
        }
        Step::Delay(duration) => tokio::time::sleep(*duration).await,
    }

    Ok(ws.next_idx >= program.len())
}
