//! Per-light worker — the single task that owns a light's state.
//!
//! One worker exists per managed light. It is the sole writer of the
//! light's active/visible sets: external events only ever enqueue
//! [`Command`]s on its inbox, sequences only ever publish colors, and the
//! worker serializes everything in one `select!` loop. Expiration timers
//! are independent tasks that feed a `Delete` back through the same inbox.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::color;
use crate::mux::Multiplexer;
use crate::pattern::{compile, PatternItem};
use crate::sequence::Sequence;
use crate::sink::OutputSink;

/// Reserved id of the always-present baseline sequence (priority 0, off).
/// It guarantees the active set is never empty.
pub const BASELINE_ID: &str = "off";

/// A state change queued on a light's inbox. Applied strictly in FIFO
/// order; multiple commands for one id resolve last-writer-wins.
#[derive(Debug)]
pub enum Command {
    /// Insert or replace a notification.
    Add {
        id: String,
        sequence: Box<Sequence>,
        /// Arm a timer that deletes the notification after this long.
        expire_after: Option<Duration>,
    },
    /// Remove a notification.
    Delete { id: String },
    /// Rotate the top-priority tier's round-robin emphasis.
    Cycle,
}

/// Per-light settings.
#[derive(Debug, Clone)]
pub struct LightConfig {
    pub name: String,
    /// Rotate tied top-priority entries this often; `None` disables
    /// cycling.
    pub cycle_interval: Option<Duration>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            name: "light".to_string(),
            cycle_interval: None,
        }
    }
}

/// Cheap, clonable command surface of a spawned worker.
#[derive(Debug, Clone)]
pub struct LightHandle {
    tx: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl LightHandle {
    pub fn add(&self, id: impl Into<String>, sequence: Sequence, expire_after: Option<Duration>) {
        self.send(Command::Add {
            id: id.into(),
            sequence: Box::new(sequence),
            expire_after,
        });
    }

    pub fn remove(&self, id: impl Into<String>) {
        self.send(Command::Delete { id: id.into() });
    }

    pub fn cycle(&self) {
        self.send(Command::Cycle);
    }

    /// Request worker shutdown; the join handle returned by
    /// [`LightWorker::spawn`] resolves once every sequence is stopped.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            warn!("light worker is gone, dropping command");
        }
    }
}

/// The per-light actor. Constructed and consumed by [`spawn`](Self::spawn).
pub struct LightWorker {
    name: String,
    mux: Multiplexer,
    inbox: mpsc::UnboundedReceiver<Command>,
    /// Used by expiration timers to feed deletes back through the inbox.
    self_tx: mpsc::UnboundedSender<Command>,
    sink: Box<dyn OutputSink>,
    cycle_interval: Option<Duration>,
    next_cycle: Option<Instant>,
    expire_timers: HashMap<String, JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl LightWorker {
    /// Spawn a worker for one light. The baseline sequence is installed
    /// before the first command can arrive.
    pub fn spawn(config: LightConfig, sink: Box<dyn OutputSink>) -> (LightHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let mut worker = LightWorker {
            name: config.name,
            mux: Multiplexer::new(),
            inbox: rx,
            self_tx: tx.clone(),
            sink,
            cycle_interval: config.cycle_interval,
            next_cycle: None,
            expire_timers: HashMap::new(),
            shutdown: shutdown.clone(),
        };
        worker.mux.insert(
            BASELINE_ID.to_string(),
            Sequence::new(compile(&[PatternItem::Color(color::OFF)]), 0),
        );

        let join = tokio::spawn(worker.run());
        (LightHandle { tx, shutdown }, join)
    }

    async fn run(mut self) {
        info!(light = %self.name, "light worker started");
        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                again = self.tick() => {
                    if !again {
                        break;
                    }
                }
            }
        }
        self.mux.stop_all();
        for (_, timer) in self.expire_timers.drain() {
            timer.abort();
        }
        info!(light = %self.name, "light worker stopped");
    }

    /// One loop iteration: refresh the output, then wait for whichever
    /// comes first — a command, a finished step, or the cycle deadline.
    /// Returns `false` when the inbox is closed.
    async fn tick(&mut self) -> bool {
        self.mux.process(self.sink.as_mut());

        let cycle_at = self.cycle_deadline();
        tokio::select! {
            maybe_cmd = self.inbox.recv() => match maybe_cmd {
                Some(cmd) => self.apply(cmd),
                None => return false,
            },
            _ = self.mux.step_finished() => {}
            _ = tokio::time::sleep_until(cycle_at.unwrap_or_else(far_future)), if cycle_at.is_some() => {
                self.mux.cycle();
                self.next_cycle = self.cycle_interval.map(|every| Instant::now() + every);
            }
        }
        true
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Add {
                id,
                sequence,
                expire_after,
            } => {
                if id == BASELINE_ID {
                    warn!("refusing to replace the baseline sequence");
                    return;
                }
                debug!(%id, priority = sequence.priority(), "adding notification");
                self.arm_expire_timer(&id, expire_after);
                self.mux.insert(id, *sequence);
            }
            Command::Delete { id } => {
                if id == BASELINE_ID {
                    warn!("refusing to remove the baseline sequence");
                    return;
                }
                self.disarm_expire_timer(&id);
                if self.mux.remove(&id) {
                    debug!(%id, "removed notification");
                }
            }
            Command::Cycle => {
                self.mux.cycle();
                self.next_cycle = self.cycle_interval.map(|every| Instant::now() + every);
            }
        }
    }

    /// Deadline for the next automatic rotation, armed only while the top
    /// tier is actually tied.
    fn cycle_deadline(&mut self) -> Option<Instant> {
        let every = self.cycle_interval?;
        if !self.mux.is_tied() {
            self.next_cycle = None;
            return None;
        }
        Some(*self.next_cycle.get_or_insert_with(|| Instant::now() + every))
    }

    fn arm_expire_timer(&mut self, id: &str, expire_after: Option<Duration>) {
        self.disarm_expire_timer(id);
        let Some(delay) = expire_after else {
            return;
        };
        let tx = self.self_tx.clone();
        let id = id.to_string();
        let timer = tokio::spawn({
            let id = id.clone();
            async move {
                tokio::time::sleep(delay).await;
                debug!(%id, "notification expired");
                let _ = tx.send(Command::Delete { id });
            }
        });
        self.expire_timers.insert(id, timer);
    }

    fn disarm_expire_timer(&mut self, id: &str) {
        if let Some(timer) = self.expire_timers.remove(id) {
            timer.abort();
        }
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorInfo;
    use crate::sink::OutputSink;

    const RED: ColorInfo = ColorInfo {
        rgb: (255, 0, 0),
        brightness: 100.0,
    };
    const GREEN: ColorInfo = ColorInfo {
        rgb: (0, 255, 0),
        brightness: 100.0,
    };

    struct NullSink;

    impl OutputSink for NullSink {
        fn turn_on(&mut self, _rgb: (u8, u8, u8), _brightness: f32) {}
        fn turn_off(&mut self) {}
    }

    fn bare_worker(cycle_interval: Option<Duration>) -> LightWorker {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut worker = LightWorker {
            name: "test".to_string(),
            mux: Multiplexer::new(),
            inbox: rx,
            self_tx: tx,
            sink: Box::new(NullSink),
            cycle_interval,
            next_cycle: None,
            expire_timers: HashMap::new(),
            shutdown: CancellationToken::new(),
        };
        worker.mux.insert(
            BASELINE_ID.to_string(),
            Sequence::new(compile(&[PatternItem::Color(color::OFF)]), 0),
        );
        worker
    }

    fn solid(color: ColorInfo, priority: i32) -> Box<Sequence> {
        Box::new(Sequence::new(compile(&[PatternItem::from(color)]), priority))
    }

    #[tokio::test]
    async fn test_baseline_cannot_be_removed_or_replaced() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Delete {
            id: BASELINE_ID.to_string(),
        });
        assert!(worker.mux.contains(BASELINE_ID));

        worker.apply(Command::Add {
            id: BASELINE_ID.to_string(),
            sequence: solid(RED, 5000),
            expire_after: None,
        });
        assert_eq!(worker.mux.active_len(), 1);
    }

    #[tokio::test]
    async fn test_add_replaces_same_id() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Add {
            id: "n1".to_string(),
            sequence: solid(RED, 10),
            expire_after: None,
        });
        worker.apply(Command::Add {
            id: "n1".to_string(),
            sequence: solid(GREEN, 20),
            expire_after: None,
        });
        assert_eq!(worker.mux.active_len(), 2); // baseline + n1
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_harmless() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Delete {
            id: "ghost".to_string(),
        });
        assert_eq!(worker.mux.active_len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_command_rotates_tied_tier() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Add {
            id: "a".to_string(),
            sequence: solid(RED, 10),
            expire_after: None,
        });
        worker.apply(Command::Add {
            id: "b".to_string(),
            sequence: solid(GREEN, 10),
            expire_after: None,
        });
        worker.mux.process(&mut NullSink);
        assert_eq!(worker.mux.visible_ids()[0], "a");

        worker.apply(Command::Cycle);
        assert_eq!(worker.mux.visible_ids()[0], "b");
    }

    #[tokio::test]
    async fn test_cycle_deadline_only_while_tied() {
        let mut worker = bare_worker(Some(Duration::from_secs(5)));
        assert!(worker.cycle_deadline().is_none());

        worker.apply(Command::Add {
            id: "a".to_string(),
            sequence: solid(RED, 10),
            expire_after: None,
        });
        worker.apply(Command::Add {
            id: "b".to_string(),
            sequence: solid(GREEN, 10),
            expire_after: None,
        });
        worker.mux.process(&mut NullSink);

        let first = worker.cycle_deadline().expect("tied tier arms the timer");
        // The deadline is stable across ticks until it fires.
        assert_eq!(worker.cycle_deadline(), Some(first));

        worker.apply(Command::Delete {
            id: "b".to_string(),
        });
        worker.mux.process(&mut NullSink);
        assert!(worker.cycle_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_timer_feeds_delete_through_inbox() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Add {
            id: "n1".to_string(),
            sequence: solid(RED, 10),
            expire_after: Some(Duration::from_secs(1)),
        });
        tokio::time::sleep(Duration::from_secs(2)).await;

        let cmd = worker.inbox.recv().await.expect("expiry command");
        assert!(matches!(cmd, Command::Delete { ref id } if id == "n1"));
        worker.apply(cmd);
        assert!(!worker.mux.contains("n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_readding_disarms_previous_expire_timer() {
        let mut worker = bare_worker(None);
        worker.apply(Command::Add {
            id: "n1".to_string(),
            sequence: solid(RED, 10),
            expire_after: Some(Duration::from_secs(1)),
        });
        worker.apply(Command::Add {
            id: "n1".to_string(),
            sequence: solid(GREEN, 10),
            expire_after: None,
        });
        tokio::time::sleep(Duration::from_secs(5)).await;

        // The aborted timer must not have queued a delete.
        assert!(worker.inbox.try_recv().is_err());
        assert!(worker.mux.contains("n1"));
    }
}
