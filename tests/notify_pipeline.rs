//! Integration tests for the notification pipeline.
//!
//! These exercise the full public API: compiling patterns, spawning a
//! light worker, posting and removing notifications through its handle,
//! and observing what reaches the output sink — the boundary between
//! `pattern`, `sequence`, `mux`, and `worker`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use color_notify::{
    compile, ColorInfo, LightConfig, LightWorker, NotificationConfig, OutputSink, PatternItem,
    Sequence,
};

const RED: ColorInfo = ColorInfo {
    rgb: (255, 0, 0),
    brightness: 100.0,
};
const GREEN: ColorInfo = ColorInfo {
    rgb: (0, 255, 0),
    brightness: 100.0,
};

#[derive(Debug, Clone, PartialEq)]
enum SinkCall {
    On((u8, u8, u8), f32),
    Off,
}

/// Records every sink invocation, shared with the test body.
#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl OutputSink for RecordingSink {
    fn turn_on(&mut self, rgb: (u8, u8, u8), brightness: f32) {
        self.calls.lock().unwrap().push(SinkCall::On(rgb, brightness));
    }

    fn turn_off(&mut self) {
        self.calls.lock().unwrap().push(SinkCall::Off);
    }
}

fn spawn_light(sink: &RecordingSink) -> (color_notify::LightHandle, tokio::task::JoinHandle<()>) {
    LightWorker::spawn(
        LightConfig {
            name: "test-light".to_string(),
            cycle_interval: None,
        },
        Box::new(sink.clone()),
    )
}

fn solid(color: ColorInfo, priority: i32) -> Sequence {
    Sequence::new(compile(&[PatternItem::Color(color)]), priority)
}

/// Poll until `cond` holds; virtual time makes this fast and deterministic.
async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(start_paused = true)]
async fn pipeline_startup_shows_baseline_off() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);

    wait_until(|| sink.len() == 1).await;
    assert_eq!(sink.calls(), vec![SinkCall::Off]);

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_priority_displacement_and_revert() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);
    wait_until(|| sink.len() == 1).await;

    // n1 drives the light.
    handle.add("n1", solid(RED, 1000), None);
    wait_until(|| sink.len() == 2).await;

    // n2 outranks it.
    handle.add("n2", solid(GREEN, 2000), None);
    wait_until(|| sink.len() == 3).await;

    // Removing n2 reveals n1 again.
    handle.remove("n2");
    wait_until(|| sink.len() == 4).await;

    assert_eq!(
        sink.calls(),
        vec![
            SinkCall::Off,
            SinkCall::On((255, 0, 0), 100.0),
            SinkCall::On((0, 255, 0), 100.0),
            SinkCall::On((255, 0, 0), 100.0),
        ]
    );

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_no_spurious_sink_calls_when_idle() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);

    handle.add("n1", solid(RED, 1000), None);
    wait_until(|| sink.len() == 2).await;

    // Nothing changes for a while: no further output.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.len(), 2);

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_removing_last_notification_reverts_to_off() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);
    wait_until(|| sink.len() == 1).await;

    handle.add("n1", solid(RED, 1000), None);
    wait_until(|| sink.len() == 2).await;

    handle.remove("n1");
    wait_until(|| sink.len() == 3).await;
    assert_eq!(sink.calls().last(), Some(&SinkCall::Off));

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_looping_pattern_alternates_on_the_sink() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);

    let blink = compile(&[
        PatternItem::from("["),
        PatternItem::from(r#"{"rgb_color": [255, 0, 0], "delay": 0.2}"#),
        PatternItem::from(r#"{"rgb_color": [0, 255, 0], "delay": 0.2}"#),
        PatternItem::from("]"),
    ]);
    handle.add("blink", Sequence::new(blink, 1000), None);

    wait_until(|| sink.len() >= 6).await;
    let calls = sink.calls();
    // After the initial baseline off: red, green, red, green, ...
    assert_eq!(calls[1], SinkCall::On((255, 0, 0), 100.0));
    assert_eq!(calls[2], SinkCall::On((0, 255, 0), 100.0));
    assert_eq!(calls[3], SinkCall::On((255, 0, 0), 100.0));
    assert_eq!(calls[4], SinkCall::On((0, 255, 0), 100.0));

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_finite_loop_holds_final_color() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);

    // Two blinks, then settle on green.
    let config = NotificationConfig {
        name: "doorbell".to_string(),
        priority: 1000,
        pattern: vec![
            PatternItem::from("["),
            PatternItem::from(r#"{"rgb_color": [255, 0, 0], "delay": 0.1}"#),
            PatternItem::from("],1"),
            PatternItem::from(GREEN),
        ],
        expire_ms: None,
        weight: 1.0,
        description: None,
    };
    handle.add("doorbell", config.to_sequence(), config.expire_after());

    wait_until(|| sink.calls().last() == Some(&SinkCall::On((0, 255, 0), 100.0))).await;

    // The finished sequence keeps holding its last color.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sink.calls().last(), Some(&SinkCall::On((0, 255, 0), 100.0)));

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_expiring_notification_clears_itself() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);
    wait_until(|| sink.len() == 1).await;

    handle.add("flash", solid(RED, 1000), Some(Duration::from_secs(5)));
    wait_until(|| sink.len() == 2).await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    wait_until(|| sink.len() == 3).await;
    assert_eq!(sink.calls().last(), Some(&SinkCall::Off));

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_tied_notifications_mix_and_cycling_stays_silent() {
    let sink = RecordingSink::default();
    let (handle, join) = LightWorker::spawn(
        LightConfig {
            name: "test-light".to_string(),
            cycle_interval: Some(Duration::from_secs(1)),
        },
        Box::new(sink.clone()),
    );
    wait_until(|| sink.len() == 1).await;

    let blue = ColorInfo::new((0, 0, 255), 50.0);
    handle.add("a", solid(RED, 1000), None);
    handle.add("b", solid(blue, 1000), None);

    wait_until(|| sink.calls().last() == Some(&SinkCall::On((128, 0, 128), 75.0))).await;
    let settled = sink.len();

    // Cycling rotates emphasis but never re-sends the same mixed color.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.len(), settled);

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_replacing_a_notification_takes_the_new_pattern() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);
    wait_until(|| sink.len() == 1).await;

    handle.add("n1", solid(RED, 1000), None);
    wait_until(|| sink.len() == 2).await;

    handle.add("n1", solid(GREEN, 500), None);
    wait_until(|| sink.calls().last() == Some(&SinkCall::On((0, 255, 0), 100.0))).await;

    handle.shutdown();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pipeline_commands_apply_in_fifo_order() {
    let sink = RecordingSink::default();
    let (handle, join) = spawn_light(&sink);

    // Enqueue an add and its delete back to back. Commands apply one per
    // loop iteration, so the notification shows briefly and the delete —
    // arriving last — wins.
    handle.add("n1", solid(RED, 1000), None);
    handle.remove("n1");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        sink.calls(),
        vec![
            SinkCall::Off,
            SinkCall::On((255, 0, 0), 100.0),
            SinkCall::Off,
        ]
    );

    handle.shutdown();
    join.await.unwrap();
}
