//! Named pattern library and notification configuration.
//!
//! Notifications are described by an explicit config struct rather than
//! loose option maps: a priority, a pattern, an optional expiry, and a
//! mixing weight. Reusable patterns live in a TOML library at
//! `~/.config/color-notify/patterns.toml`, created from the embedded
//! defaults on first use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::pattern::{compile, PatternItem};
use crate::sequence::Sequence;

/// Priority assigned to notifications that don't specify one. Well above
/// the baseline's reserved 0.
pub const DEFAULT_PRIORITY: i32 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything the engine needs to know about one notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(skip)]
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub pattern: Vec<PatternItem>,
    /// Auto-expire after this many milliseconds (absent or 0 = never).
    #[serde(default)]
    pub expire_ms: Option<u64>,
    /// Mixing weight against same-priority notifications.
    #[serde(default = "default_weight")]
    pub weight: f32,
    pub description: Option<String>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_weight() -> f32 {
    1.0
}

impl NotificationConfig {
    /// A single-color notification, the shape used for ad-hoc posts.
    pub fn solid(color: crate::color::ColorInfo, priority: i32) -> Self {
        Self {
            name: String::new(),
            priority,
            pattern: vec![PatternItem::Color(color)],
            expire_ms: None,
            weight: 1.0,
            description: None,
        }
    }

    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Compile the pattern and wrap it with this config's scheduling
    /// parameters.
    pub fn to_sequence(&self) -> Sequence {
        Sequence::new(compile(&self.pattern), self.priority).with_weight(self.weight)
    }
}

/// A named collection of notification configs loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatternLibrary {
    #[serde(flatten)]
    pub patterns: BTreeMap<String, NotificationConfig>,
}

impl PatternLibrary {
    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut lib: PatternLibrary = toml::from_str(content)?;
        // Backfill the name field from the map key.
        for (name, config) in &mut lib.patterns {
            config.name = name.clone();
        }
        Ok(lib)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load the library from the config directory, creating the default
    /// file if it doesn't exist yet.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_library_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, DEFAULT_PATTERNS_TOML).map_err(|source| {
                ConfigError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
            info!("created default pattern library at {}", path.display());
        }
        Self::load(&path)
    }

    pub fn get(&self, name: &str) -> Option<&NotificationConfig> {
        self.patterns.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.keys().map(|s| s.as_str()).collect()
    }
}

/// Path to the pattern library TOML file.
pub fn default_library_path() -> PathBuf {
    config_dir().join("patterns.toml")
}

fn config_dir() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("color-notify")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/color-notify")
    } else {
        PathBuf::from("/tmp/color-notify")
    }
}

pub const DEFAULT_PATTERNS_TOML: &str = r##"# ColorNotify pattern library
# Each section is a named notification: a priority, a color pattern, and
# optional expiry. Patterns mix structured colors and string tokens:
#   "["          open a loop
#   "]" / "],N"  close it (forever / N extra passes)
#   '{"rgb_color": [255, 0, 0], "delay": 0.5}'  color + hold time

[alert]
priority = 5000
description = "Urgent red flash until acknowledged"
pattern = [
    "[",
    '{"rgb_color": [255, 0, 0], "delay": 0.4}',
    '{"rgb_color": [40, 0, 0], "delay": 0.4}',
    "]",
]

[police]
priority = 2000
description = "Red/blue alternating flash"
pattern = [
    "[",
    '{"rgb_color": [255, 0, 0], "delay": 0.2}',
    '{"rgb_color": [0, 0, 255], "delay": 0.2}',
    "]",
]

[doorbell]
priority = 1500
expire_ms = 4000
description = "Three green blinks, then clears itself"
pattern = [
    "[",
    '{"rgb_color": [0, 255, 0], "delay": 0.3}',
    '{"rgb_color": [0, 40, 0], "delay": 0.3}',
    "],2",
    { rgb = [0, 255, 0] },
]

[mail]
priority = 800
description = "Calm blue reminder"
pattern = [
    "[",
    '{"rgb_color": [0, 80, 255], "delay": 1.5}',
    '{"rgb_color": [0, 20, 120], "delay": 1.5}',
    "]",
]

[solid]
priority = 1000
description = "Steady warm white"
pattern = [{ rgb = [255, 249, 216] }]
"##;
