//! Priority multiplexer — decides which sequences drive the light.
//!
//! Owns the active set (every notification currently on) and the visible
//! set (the subset actually executing). Only sequences tied at the highest
//! active priority are visible; their published colors are mixed and the
//! result pushed to the output sink whenever it changes.

use std::collections::HashMap;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error};

use crate::color::{self, ColorInfo};
use crate::sequence::Sequence;
use crate::sink::OutputSink;

/// Active/visible bookkeeping for one light.
///
/// Written to exclusively by that light's worker task; the invariants
/// (visible ⊆ active, visible all at the top priority) are re-established
/// by every [`process`](Multiplexer::process) call.
#[derive(Debug, Default)]
pub struct Multiplexer {
    active: HashMap<String, Sequence>,
    /// Visible ids in promotion order; the front entry is the "primary"
    /// one for round-robin emphasis.
    visible: Vec<String>,
    last_output: Option<ColorInfo>,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a notification. A replaced sequence is stopped
    /// and demoted first; the next `process` call decides visibility.
    pub fn insert(&mut self, id: String, sequence: Sequence) {
        self.remove(&id);
        self.active.insert(id, sequence);
    }

    /// Remove a notification, stopping it if it was visible.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.visible.iter().any(|v| v == id) {
            if let Some(seq) = self.active.get_mut(id) {
                seq.stop();
            }
            self.visible.retain(|v| v != id);
        }
        self.active.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Ids currently driving the light, primary first.
    pub fn visible_ids(&self) -> &[String] {
        &self.visible
    }

    /// More than one entry shares the top tier, so cycling is meaningful.
    pub fn is_tied(&self) -> bool {
        self.visible.len() > 1
    }

    /// Rotate the top tier's round-robin emphasis. The mixed color is
    /// unaffected.
    pub fn cycle(&mut self) {
        if self.visible.len() > 1 {
            self.visible.rotate_left(1);
            debug!(primary = %self.visible[0], "cycled top-priority tier");
        }
    }

    /// Re-establish the visible set and push the mixed color on change.
    pub fn process(&mut self, sink: &mut dyn OutputSink) {
        let Some(top) = self.active.values().map(Sequence::priority).max() else {
            // Structurally prevented: the worker installs a baseline
            // sequence before anything else.
            error!("active set is empty, nothing to display");
            return;
        };

        // Demote what fell below the top tier or was removed.
        let stale: Vec<String> = self
            .visible
            .iter()
            .filter(|id| {
                self.active
                    .get(id.as_str())
                    .map_or(true, |seq| seq.priority() < top)
            })
            .cloned()
            .collect();
        for id in &stale {
            if let Some(seq) = self.active.get_mut(id) {
                debug!(%id, "stopping demoted sequence");
                seq.stop();
            }
            self.visible.retain(|v| v != id);
        }

        // Promote every top-tier entry that is not yet visible.
        let mut promoted: Vec<String> = self
            .active
            .iter()
            .filter(|(id, seq)| seq.priority() == top && !self.visible.contains(*id))
            .map(|(id, _)| id.clone())
            .collect();
        promoted.sort();
        for id in promoted {
            let seq = self.active.get_mut(&id).expect("listed from active");
            debug!(%id, priority = top, "starting promoted sequence");
            seq.run();
            self.visible.push(id);
        }

        // Mix the visible colors and deduplicate against the last output.
        let colors: Vec<ColorInfo> = self
            .visible
            .iter()
            .map(|id| self.active[id.as_str()].color())
            .collect();
        let weights: Vec<f32> = self
            .visible
            .iter()
            .map(|id| self.active[id.as_str()].weight())
            .collect();
        let mixed = color::mix(&colors, Some(&weights));

        if self.last_output != Some(mixed) {
            if mixed.is_off() {
                sink.turn_off();
            } else {
                sink.turn_on(mixed.rgb, mixed.brightness);
            }
            self.last_output = Some(mixed);
        }
    }

    /// Resolves when any visible running sequence finishes a step. Pends
    /// forever when nothing is running — another wake source (the inbox)
    /// always exists.
    pub async fn step_finished(&mut self) {
        let visible = &self.visible;
        let mut waits: FuturesUnordered<_> = self
            .active
            .iter_mut()
            .filter(|(id, seq)| visible.iter().any(|v| v == *id) && seq.is_running())
            .map(|(_, seq)| seq.step_finished())
            .collect();
        if waits.is_empty() {
            futures::future::pending::<()>().await;
        }
        waits.next().await;
    }

    /// Stop every visible sequence; used on worker shutdown.
    pub fn stop_all(&mut self) {
        for id in &self.visible {
            if let Some(seq) = self.active.get_mut(id) {
                seq.stop();
            }
        }
    }
}
