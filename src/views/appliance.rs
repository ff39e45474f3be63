use super::{report, AppContext};
use crate::error::{AppError, Result};
use crate::models::{Device, DeviceWithEnergy, EnergyRecord};
use crate::notify::{NotificationDispatcher, PowerTransition};
use crate::repositories::{DeviceRepository, UserRepository};
use crate::store::{paths, Subscription};
use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceState {
    pub device: Option<DeviceWithEnergy>,
    pub is_loading: bool,
    /// Last listener failure; cleared by the next good snapshot.
    pub error_message: Option<String>,
}

impl Default for ApplianceState {
    fn default() -> Self {
        Self {
            device: None,
            is_loading: true,
            error_message: None,
        }
    }
}

/// One device with a live view of its record for the day.
pub struct ApplianceScreen {
    ctx: AppContext,
    pub user_rate: Option<f64>,
    pub error_message: Option<String>,
    state: watch::Sender<ApplianceState>,
    opened: Option<(String, NaiveDate)>,
    listener: Option<JoinHandle<()>>,
}

impl ApplianceScreen {
    pub fn new(ctx: AppContext) -> Self {
        let (state, _) = watch::channel(ApplianceState::default());
        Self {
            ctx,
            user_rate: None,
            error_message: None,
            state,
            opened: None,
            listener: None,
        }
    }

    /// Show `device_id` and follow its record for `date`. Opening again
    /// replaces the previous listener.
    pub async fn open(&mut self, device_id: &str, date: NaiveDate) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("appliance open") else {
            return Ok(());
        };
        self.close();

        let device = match DeviceRepository::get_device(self.ctx.store(), &uid, device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                let e = AppError::NotFound(format!("device {}", device_id));
                report(&mut self.error_message, "Device not found", &e);
                return Err(e);
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching device", &e);
                return Err(e);
            }
        };

        let path = paths::device_energy_record(&uid, date, device_id);
        let subscription = match self.ctx.store.listen_document(&path).await {
            Ok(s) => s,
            Err(e) => {
                report(&mut self.error_message, "Error listening for energy data", &e);
                return Err(e);
            }
        };

        self.state.send_replace(ApplianceState::default());
        self.listener = Some(tokio::spawn(follow_record(
            device,
            subscription,
            self.ctx.dispatcher(),
            self.state.clone(),
        )));
        self.opened = Some((device_id.to_string(), date));
        Ok(())
    }

    pub fn state(&self) -> ApplianceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ApplianceState> {
        self.state.subscribe()
    }

    pub async fn load_rate(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("rate lookup") else {
            return Ok(());
        };
        match UserRepository::get_rate(self.ctx.store(), &uid).await {
            Ok(rate) => {
                self.user_rate = rate;
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching rate", &e);
                Err(e)
            }
        }
    }

    /// Write a power change for the opened device.
    pub async fn set_power(&mut self, is_on: bool) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("power update") else {
            return Ok(());
        };
        let Some((device_id, date)) = self.opened.clone() else {
            debug!("No device open, ignoring power update");
            return Ok(());
        };

        let written =
            DeviceRepository::set_power(self.ctx.store(), &uid, date, &device_id, is_on, Utc::now())
                .await;
        if let Err(e) = written {
            report(&mut self.error_message, "Error updating power state", &e);
            return Err(e);
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.opened = None;
    }
}

impl Drop for ApplianceScreen {
    fn drop(&mut self) {
        self.close();
    }
}

async fn follow_record(
    device: Device,
    mut subscription: Subscription,
    dispatcher: NotificationDispatcher,
    state: watch::Sender<ApplianceState>,
) {
    while let Some(result) = subscription.next().await {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Energy listener for {} failed: {}", device.id, e);
                state.send_modify(|s| {
                    s.is_loading = false;
                    s.error_message = Some(format!("Error listening for energy data updates: {}", e));
                });
                continue;
            }
        };
        let Some(doc) = snapshot.documents.first() else {
            debug!("No energy record for {} yet", device.id);
            state.send_modify(|s| s.error_message = None);
            continue;
        };

        let record = EnergyRecord::from_document(doc, Utc::now());
        let previous = state
            .borrow()
            .device
            .as_ref()
            .and_then(|d| d.energy.as_ref())
            .map(|e| e.is_on);
        if previous.is_some_and(|was_on| was_on != record.is_on) {
            let transition = PowerTransition {
                device_id: device.id.clone(),
                device_name: device.name.clone(),
                is_on: record.is_on,
            };
            dispatcher.power_changed(&transition).await;
        }

        state.send_replace(ApplianceState {
            device: Some(DeviceWithEnergy::new(device.clone(), Some(record))),
            is_loading: false,
            error_message: None,
        });
    }
}
