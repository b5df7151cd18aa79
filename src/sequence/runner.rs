//! Running-sequence wrapper: lifecycle around one program execution.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::vm::{self, Workspace};
use crate::color::ColorInfo;
use crate::pattern::Program;

/// A color program queued on a light, with its scheduling priority.
///
/// `run()` spawns a dedicated task that executes the program step by step
/// and publishes the workspace color after every step; the publish doubles
/// as the "step finished" signal the worker waits on. `stop()` cancels
/// cooperatively — an in-progress delay is interrupted at once.
#[derive(Debug)]
pub struct Sequence {
    priority: i32,
    weight: f32,
    program: Arc<Program>,
    color_rx: watch::Receiver<ColorInfo>,
    run: Option<RunHandle>,
}

#[derive(Debug)]
struct RunHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl Sequence {
    pub fn new(program: Program, priority: i32) -> Self {
        // Until run() is called the receiver just holds the initial color.
        let (_tx, color_rx) = watch::channel(program.initial_color());
        Self {
            priority,
            weight: 1.0,
            program: Arc::new(program),
            color_rx,
            run: None,
        }
    }

    /// Set the mixing weight used when this sequence shares the top
    /// priority tier. Default 1.0.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Color published after the most recent step, or the program's
    /// initial color before any step ran.
    pub fn color(&self) -> ColorInfo {
        *self.color_rx.borrow()
    }

    /// True while a run exists that has neither been stopped nor finished.
    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.cancel.is_cancelled() && !run.join.is_finished())
    }

    /// Start executing the program from the beginning.
    ///
    /// Restart is idempotent: a previous run is cancelled first and its
    /// workspace discarded.
    pub fn run(&mut self) {
        self.stop();

        let (tx, rx) = watch::channel(self.program.initial_color());
        self.color_rx = rx;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let program = Arc::clone(&self.program);

        let join = tokio::spawn(async move {
            let mut ws = Workspace::new(&program);
            loop {
                let stepped = tokio::select! {
                    _ = token.cancelled() => break,
                    result = vm::run_next_step(&program, &mut ws) => result,
                };
                match stepped {
                    Ok(done) => {
                        // Don't publish a color for an interrupted step.
                        if !token.is_cancelled() {
                            tx.send_replace(ws.color());
                        }
                        if done {
                            break;
                        }
                    }
                    Err(err) => {
                        // Internal fault; end this sequence, never the worker.
                        error!("sequence execution failed: {err}");
                        break;
                    }
                }
            }
            debug!("sequence run finished");
        });

        self.run = Some(RunHandle { cancel, join });
    }

    /// Request cooperative cancellation of the current run, if any.
    pub fn stop(&mut self) {
        if let Some(run) = &self.run {
            run.cancel.cancel();
        }
    }

    /// Resolves when the current run finishes a step (or ends). The worker
    /// re-evaluates the mixed output on every resolution.
    pub async fn step_finished(&mut self) {
        // An Err means the run ended and dropped its sender; callers treat
        // that as a wake-up too.
        let _ = self.color_rx.changed().await;
    }
}

impl Drop for Sequence {
    fn drop(&mut self) {
        self.stop();
    }
}
