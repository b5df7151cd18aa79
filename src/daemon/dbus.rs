//! D-Bus interface for the notification daemon.
//!
//! Bus name: `org.colornotify.Light1`
//! Object path: `/org/colornotify/Light1`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use zbus::interface;

use crate::color;
use crate::config::{NotificationConfig, PatternLibrary, DEFAULT_PRIORITY};
use crate::pattern::PatternItem;
use crate::worker::{LightHandle, BASELINE_ID};

pub const BUS_NAME: &str = "org.colornotify.Light1";
pub const OBJECT_PATH: &str = "/org/colornotify/Light1";

/// Reserved id backing the light's own on/off surface.
const LIGHT_ON_ID: &str = "on";

/// What the daemon knows about a posted notification, for `List`.
#[derive(Debug, Clone)]
struct Posted {
    pattern: String,
    priority: i32,
}

/// D-Bus interface implementation.
pub struct NotifyInterface {
    handle: LightHandle,
    library: Arc<PatternLibrary>,
    on_priority: i32,
    posted: Mutex<BTreeMap<String, Posted>>,
}

impl NotifyInterface {
    pub fn new(handle: LightHandle, library: Arc<PatternLibrary>, on_priority: i32) -> Self {
        Self {
            handle,
            library,
            on_priority,
            posted: Mutex::new(BTreeMap::new()),
        }
    }

    fn check_id(id: &str) -> zbus::fdo::Result<()> {
        if id.is_empty() {
            return Err(zbus::fdo::Error::InvalidArgs(
                "notification id must not be empty".to_string(),
            ));
        }
        if id == BASELINE_ID || id == LIGHT_ON_ID {
            return Err(zbus::fdo::Error::InvalidArgs(format!(
                "notification id {id:?} is reserved"
            )));
        }
        Ok(())
    }

    async fn post(&self, id: &str, config: NotificationConfig, expire_ms: i64) {
        // Expiry: >0 = explicit ms, -1 = pattern default, 0 = never.
        let expire_after = if expire_ms > 0 {
            Some(Duration::from_millis(expire_ms as u64))
        } else if expire_ms == -1 {
            config.expire_after()
        } else {
            None
        };

        self.posted.lock().await.insert(
            id.to_string(),
            Posted {
                pattern: config.name.clone(),
                priority: config.priority,
            },
        );
        self.handle.add(id, config.to_sequence(), expire_after);
    }
}

#[interface(name = "org.colornotify.Light1")]
impl NotifyInterface {
    /// Turn a notification on using a named pattern from the library.
    ///
    /// `priority < 0` keeps the pattern's own priority; `expire_ms` of -1
    /// keeps the pattern's expiry, 0 disables it.
    async fn notify(
        &self,
        id: &str,
        pattern: &str,
        priority: i32,
        expire_ms: i64,
    ) -> zbus::fdo::Result<()> {
        Self::check_id(id)?;
        let def = self.library.get(pattern).ok_or_else(|| {
            zbus::fdo::Error::InvalidArgs(format!("unknown pattern: {pattern}"))
        })?;

        let mut config = def.clone();
        if priority >= 0 {
            config.priority = priority;
        }

        self.post(id, config, expire_ms).await;
        Ok(())
    }

    /// Turn a notification on from an inline JSON pattern array, e.g.
    /// `["[", {"rgb": [255, 0, 0]}, "],2"]`.
    async fn notify_pattern(
        &self,
        id: &str,
        pattern_json: &str,
        priority: i32,
        expire_ms: i64,
    ) -> zbus::fdo::Result<()> {
        Self::check_id(id)?;
        let items: Vec<PatternItem> = serde_json::from_str(pattern_json)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("bad pattern: {e}")))?;

        let mut config = NotificationConfig {
            name: "inline".to_string(),
            priority: DEFAULT_PRIORITY,
            pattern: items,
            expire_ms: None,
            weight: 1.0,
            description: None,
        };
        if priority >= 0 {
            config.priority = priority;
        }

        self.post(id, config, expire_ms).await;
        Ok(())
    }

    /// Turn a notification off.
    async fn turn_off(&self, id: &str) -> zbus::fdo::Result<()> {
        Self::check_id(id)?;
        self.posted.lock().await.remove(id);
        self.handle.remove(id);
        Ok(())
    }

    /// List active notifications: Vec<(id, pattern, priority)>.
    async fn list(&self) -> Vec<(String, String, i32)> {
        self.posted
            .lock()
            .await
            .iter()
            .map(|(id, posted)| (id.clone(), posted.pattern.clone(), posted.priority))
            .collect()
    }

    /// Clear all posted notifications. The light's own on/off state is
    /// untouched.
    async fn clear(&self) {
        let mut posted = self.posted.lock().await;
        for id in posted.keys() {
            self.handle.remove(id.clone());
        }
        posted.clear();
    }

    /// Rotate the round-robin emphasis of the top-priority tier.
    async fn cycle(&self) {
        self.handle.cycle();
    }

    /// Turn the light itself on (a warm-white notification at the
    /// configured priority).
    async fn light_on(&self) {
        self.handle.add(
            LIGHT_ON_ID,
            NotificationConfig::solid(color::WARM_WHITE, self.on_priority).to_sequence(),
            None,
        );
    }

    /// Turn the light itself off again.
    async fn light_off(&self) {
        self.handle.remove(LIGHT_ON_ID);
    }
}
