use super::{report, AppContext};
use crate::config::DEFAULT_RATE;
use crate::error::Result;
use crate::preferences::{NotificationPreferences, Preferences, PreferencesFile, Theme};
use crate::repositories::UserRepository;
use tracing::info;

/// Rate, theme and notification toggles.
///
/// The rate lives on the user profile; everything else in the local
/// preferences file. Notification toggles are also published on the
/// context so running screens pick them up.
pub struct SettingsScreen {
    ctx: AppContext,
    file: PreferencesFile,
    prefs: Preferences,
    pub default_rate: f64,
    pub use_default_rate: bool,
    pub custom_rate: String,
    pub error_message: Option<String>,
}

impl SettingsScreen {
    pub fn new(ctx: AppContext, file: PreferencesFile) -> Self {
        let prefs = file.load();
        ctx.publish_notification_preferences(prefs.notifications);
        Self {
            ctx,
            file,
            prefs,
            default_rate: DEFAULT_RATE,
            use_default_rate: true,
            custom_rate: String::new(),
            error_message: None,
        }
    }

    pub fn with_default_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme
    }

    /// The rate that saving would store. An unparsable custom rate falls
    /// back to the default.
    pub fn effective_rate(&self) -> f64 {
        if self.use_default_rate {
            return self.default_rate;
        }
        self.custom_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(self.default_rate)
    }

    pub async fn save_rate(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("rate save") else {
            return Ok(());
        };
        let rate = self.effective_rate();
        match UserRepository::update_rate(self.ctx.store(), &uid, rate).await {
            Ok(()) => {
                info!("Rate saved: {}", rate);
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Failed to save rate", &e);
                Err(e)
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.prefs.theme = theme;
        self.persist()
    }

    pub fn set_notifications(&mut self, notifications: NotificationPreferences) -> Result<()> {
        self.prefs.notifications = notifications;
        self.ctx.publish_notification_preferences(notifications);
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        if let Err(e) = self.file.save(&self.prefs) {
            report(&mut self.error_message, "Failed to save settings", &e);
            return Err(e);
        }
        Ok(())
    }
}
