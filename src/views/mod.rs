//! Per-screen state and the operations a UI triggers on it.
//!
//! Every screen follows the same rules: without a signed-in user an
//! operation does nothing and returns `Ok`; a failed backend call is logged,
//! stored in `error_message` and returned.

pub mod account;
pub mod appliance;
pub mod dashboard;
pub mod home;
pub mod insights;
pub mod prediction;
pub mod settings;
pub mod usage;

pub use account::{AccountScreen, SessionState};
pub use appliance::{ApplianceScreen, ApplianceState};
pub use dashboard::DashboardScreen;
pub use home::HomeScreen;
pub use insights::InsightsScreen;
pub use prediction::PredictionScreen;
pub use settings::SettingsScreen;
pub use usage::UsageScreen;

use crate::auth::AuthGateway;
use crate::error::AppError;
use crate::notify::{NotificationDispatcher, Notifier};
use crate::preferences::NotificationPreferences;
use crate::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

/// Backend handles shared by every screen.
#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<dyn AuthGateway>,
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
    notifications: watch::Sender<NotificationPreferences>,
}

impl AppContext {
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        notifications: NotificationPreferences,
    ) -> Self {
        let (notifications, _) = watch::channel(notifications);
        Self {
            auth,
            store,
            notifier,
            notifications,
        }
    }

    /// Uid of the signed-in user.
    pub fn uid(&self) -> Option<String> {
        self.auth.current_user().map(|u| u.uid)
    }

    /// Uid, or a debug line naming the skipped operation.
    fn require_uid(&self, operation: &str) -> Option<String> {
        let uid = self.uid();
        if uid.is_none() {
            debug!("Not signed in, skipping {}", operation);
        }
        uid
    }

    /// A dispatcher that follows the current notification toggles.
    pub fn dispatcher(&self) -> NotificationDispatcher {
        NotificationDispatcher::new(self.notifier.clone(), self.notifications.subscribe())
    }

    pub fn notification_preferences(&self) -> NotificationPreferences {
        *self.notifications.borrow()
    }

    fn publish_notification_preferences(&self, prefs: NotificationPreferences) {
        self.notifications.send_replace(prefs);
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

/// Log a failed operation and turn it into the screen's message.
fn report(error_message: &mut Option<String>, context: &str, err: &AppError) {
    error!("{}: {}", context, err);
    *error_message = Some(format!("{}: {}", context, err));
}
