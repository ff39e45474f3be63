//! Settings kept on the device rather than in the document database.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Theme variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::System, Theme::Light, Theme::Dark];

    /// Convert to string for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Theme::System),
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::System => "System Default",
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

/// Which local notifications the user wants. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(rename = "notificationsEnabled_appliance", default = "enabled")]
    pub appliance: bool,
    #[serde(rename = "notificationsEnabled_ai", default = "enabled")]
    pub insights: bool,
    #[serde(rename = "notificationsEnabled_predictions", default = "enabled")]
    pub predictions: bool,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            appliance: true,
            insights: true,
            predictions: true,
        }
    }
}

impl NotificationPreferences {
    pub fn all_disabled() -> Self {
        Self {
            appliance: false,
            insights: false,
            predictions: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "hasLaunchedBefore", default)]
    pub has_launched_before: bool,
    #[serde(rename = "appTheme", default)]
    pub theme: Theme,
    #[serde(flatten)]
    pub notifications: NotificationPreferences,
}

/// JSON file holding [`Preferences`].
#[derive(Debug, Clone)]
pub struct PreferencesFile {
    path: PathBuf,
}

impl PreferencesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file; a missing or unreadable file yields defaults.
    pub fn load(&self) -> Preferences {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", self.path.display());
                return Preferences::default();
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return Preferences::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed preferences {}: {}", self.path.display(), e);
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
