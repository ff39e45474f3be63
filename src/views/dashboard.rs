use super::{report, AppContext};
use crate::error::Result;
use crate::live::{DashboardState, LiveDashboard};
use crate::repositories::DeviceRepository;
use crate::store::paths;
use chrono::{NaiveDate, Utc};
use tokio::sync::watch;

pub const GUEST: &str = "Guest";

/// Landing screen: greeting and today's devices.
pub struct DashboardScreen {
    ctx: AppContext,
    pub user_name: String,
    pub error_message: Option<String>,
    date: Option<NaiveDate>,
    live: LiveDashboard,
}

impl DashboardScreen {
    pub fn new(ctx: AppContext) -> Self {
        let live = LiveDashboard::new(ctx.store.clone(), ctx.dispatcher());
        Self {
            ctx,
            user_name: GUEST.to_string(),
            error_message: None,
            date: None,
            live,
        }
    }

    /// Fetch the greeting and start following `date`'s devices.
    pub async fn load(&mut self, date: NaiveDate) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("dashboard load") else {
            return Ok(());
        };

        match self.ctx.store().get_document(&paths::user(&uid)).await {
            Ok(Some(doc)) => self.user_name = doc.str_or("name", GUEST),
            Ok(None) => {}
            Err(e) => {
                report(&mut self.error_message, "Error fetching user", &e);
                return Err(e);
            }
        }

        self.date = Some(date);
        if let Err(e) = self.live.start(&uid, date).await {
            report(&mut self.error_message, "Error fetching devices", &e);
            return Err(e);
        }
        Ok(())
    }

    pub fn state(&self) -> DashboardState {
        self.live.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.live.subscribe()
    }

    /// Flip a device on screen, then write the change. A failed write
    /// puts the previous state back.
    pub async fn toggle(&mut self, device_id: &str, is_on: bool) -> Result<()> {
        let (Some(uid), Some(date)) = (self.ctx.require_uid("device toggle"), self.date) else {
            return Ok(());
        };

        self.live.set_power_local(device_id, is_on).await;
        let written =
            DeviceRepository::set_power(self.ctx.store(), &uid, date, device_id, is_on, Utc::now())
                .await;
        if let Err(e) = written {
            self.live.revert_local(device_id).await;
            report(&mut self.error_message, "Error updating power state", &e);
            return Err(e);
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.live.stop();
    }
}
