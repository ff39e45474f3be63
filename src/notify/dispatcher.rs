use super::{Notification, NotificationKind, Notifier};
use crate::preferences::NotificationPreferences;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

pub const POWER_TITLE: &str = "Smart Home Energy";
pub const PREDICTION_TITLE: &str = "New Predictions Available";
pub const PREDICTION_BODY: &str =
    "You have new energy usage predictions for multiple days. Tap to view the forecast!";
pub const INSIGHT_TITLE: &str = "New Energy Tip Available";
pub const INSIGHT_BODY: &str =
    "Your personalized AI energy-saving suggestion has been generated. Tap to view it!";

/// A device's `isOn` flag changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerTransition {
    pub device_id: String,
    pub device_name: String,
    pub is_on: bool,
}

impl PowerTransition {
    pub fn body(&self) -> String {
        format!(
            "Device '{}' was automatically turned {}.",
            self.device_name,
            if self.is_on { "ON" } else { "OFF" }
        )
    }
}

/// Decides which changes are worth a notification and sends them.
///
/// Each screen owns its own dispatcher, so the last-seen state is per
/// screen. Preferences are read at send time.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    preferences: watch::Receiver<NotificationPreferences>,
    last_prediction_count: usize,
    last_insight: Option<DateTime<Utc>>,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        preferences: watch::Receiver<NotificationPreferences>,
    ) -> Self {
        Self {
            notifier,
            preferences,
            last_prediction_count: 0,
            last_insight: None,
        }
    }

    /// Dispatcher with fixed preferences.
    pub fn with_preferences(notifier: Arc<dyn Notifier>, prefs: NotificationPreferences) -> Self {
        let (_, rx) = watch::channel(prefs);
        Self::new(notifier, rx)
    }

    fn preferences(&self) -> NotificationPreferences {
        *self.preferences.borrow()
    }

    async fn send(&self, notification: Notification) -> bool {
        match self.notifier.deliver(&notification).await {
            Ok(()) => {
                debug!("Sent {:?} notification {}", notification.kind, notification.id);
                true
            }
            Err(e) => {
                error!("Failed to send notification: {}", e);
                false
            }
        }
    }

    /// Returns whether a notification went out.
    pub async fn power_changed(&self, transition: &PowerTransition) -> bool {
        if !self.preferences().appliance {
            debug!("Appliance notifications disabled, skipping {}", transition.device_id);
            return false;
        }
        let notification =
            Notification::new(NotificationKind::Appliance, POWER_TITLE, transition.body());
        self.send(notification).await
    }

    /// Notify when more than one prediction appeared since the last load.
    pub async fn predictions_loaded(&mut self, count: usize) -> bool {
        let fire = count > self.last_prediction_count + 1;
        self.last_prediction_count = count;

        if !fire || !self.preferences().predictions {
            return false;
        }
        let notification =
            Notification::new(NotificationKind::Prediction, PREDICTION_TITLE, PREDICTION_BODY);
        self.send(notification).await
    }

    /// Notify on the first feed and whenever a newer suggestion arrives.
    pub async fn insights_loaded(&mut self, newest: Option<DateTime<Utc>>) -> bool {
        let Some(newest) = newest else {
            return false;
        };
        let fire = self.last_insight.map(|last| newest > last).unwrap_or(true);
        self.last_insight = Some(newest);

        if !fire || !self.preferences().insights {
            return false;
        }
        let notification =
            Notification::new(NotificationKind::Insight, INSIGHT_TITLE, INSIGHT_BODY);
        self.send(notification).await
    }
}
