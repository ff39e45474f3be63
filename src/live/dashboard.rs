use super::DeviceBoard;
use crate::error::{AppError, Result};
use crate::models::{Device, DeviceWithEnergy, EnergyRecord};
use crate::notify::NotificationDispatcher;
use crate::store::{paths, DocumentStore, Snapshot, Subscription};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// What the device list screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub devices: Vec<DeviceWithEnergy>,
    pub error_message: Option<String>,
}

enum Command {
    SetPower { device_id: String, is_on: bool },
    Revert { device_id: String },
}

/// Keeps today's device list in sync with the document store.
///
/// One worker task owns the [`DeviceBoard`] and both listeners; state is
/// published through a watch channel. Starting again stops the previous
/// worker first, so listeners never pile up.
pub struct LiveDashboard {
    store: Arc<dyn DocumentStore>,
    dispatcher: NotificationDispatcher,
    state: watch::Sender<DashboardState>,
    commands: Option<mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl LiveDashboard {
    pub fn new(store: Arc<dyn DocumentStore>, dispatcher: NotificationDispatcher) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            store,
            dispatcher,
            state,
            commands: None,
            worker: None,
        }
    }

    /// Load `date`'s devices and follow changes until stopped.
    ///
    /// The board is seeded from each listener's first snapshot, so the
    /// worker only ever sees changes made after that point.
    pub async fn start(&mut self, uid: &str, date: NaiveDate) -> Result<()> {
        self.stop();

        let (mut devices, mut energy) = match self.open_listeners(uid, date).await {
            Ok(listeners) => listeners,
            Err(e) => {
                error!("Failed to listen for device changes: {}", e);
                self.publish_error(format!("Error listening for device changes: {}", e));
                return Err(e);
            }
        };

        let initial = async {
            let catalog = first_snapshot(&mut devices).await?;
            let records = first_snapshot(&mut energy).await?;
            Ok::<_, AppError>((catalog, records))
        }
        .await;
        let (catalog, records) = match initial {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("Failed to load devices for {}: {}", uid, e);
                self.publish_error(format!("Error fetching devices: {}", e));
                return Err(e);
            }
        };

        let mut board = DeviceBoard::new();
        board.apply_devices(catalog.documents.iter().map(Device::from_document).collect());
        board.apply_energy(energy_records(&records));
        self.state.send_replace(DashboardState {
            devices: board.devices().to_vec(),
            error_message: None,
        });

        let (tx, rx) = mpsc::channel(16);
        let worker = Worker {
            board,
            devices,
            energy,
            commands: rx,
            dispatcher: self.dispatcher.clone(),
            state: self.state.clone(),
            devices_error: None,
            energy_error: None,
        };
        self.worker = Some(tokio::spawn(worker.run()));
        self.commands = Some(tx);
        info!("Live dashboard started for {} on {}", uid, date);
        Ok(())
    }

    /// Stop the worker and drop its listeners.
    pub fn stop(&mut self) {
        self.commands = None;
        if let Some(worker) = self.worker.take() {
            worker.abort();
            debug!("Live dashboard stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Show a new power state right away; the store write is separate.
    pub async fn set_power_local(&self, device_id: &str, is_on: bool) {
        self.send(Command::SetPower {
            device_id: device_id.to_string(),
            is_on,
        })
        .await;
    }

    /// Undo [`set_power_local`](Self::set_power_local) after a failed write.
    pub async fn revert_local(&self, device_id: &str) {
        self.send(Command::Revert {
            device_id: device_id.to_string(),
        })
        .await;
    }

    async fn send(&self, command: Command) {
        if let Some(commands) = &self.commands {
            if commands.send(command).await.is_err() {
                debug!("Dashboard worker gone, dropping local toggle");
            }
        }
    }

    async fn open_listeners(&self, uid: &str, date: NaiveDate) -> Result<(Subscription, Subscription)> {
        let devices = self.store.listen_collection(&paths::devices(uid)).await?;
        let energy = self
            .store
            .listen_collection(&paths::device_energy(uid, date))
            .await?;
        Ok((devices, energy))
    }

    fn publish_error(&self, message: String) {
        self.state.send_modify(|s| s.error_message = Some(message));
    }
}

impl Drop for LiveDashboard {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    board: DeviceBoard,
    devices: Subscription,
    energy: Subscription,
    commands: mpsc::Receiver<Command>,
    dispatcher: NotificationDispatcher,
    state: watch::Sender<DashboardState>,
    devices_error: Option<String>,
    energy_error: Option<String>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            // Local toggles are queued before their write, so they go first.
            tokio::select! {
                biased;
                Some(command) = self.commands.recv() => match command {
                    Command::SetPower { device_id, is_on } => {
                        self.board.set_power_local(&device_id, is_on);
                    }
                    Command::Revert { device_id } => {
                        self.board.revert_local(&device_id);
                    }
                },
                Some(result) = self.devices.next() => match result {
                    Ok(snapshot) => {
                        self.devices_error = None;
                        let catalog = snapshot.documents.iter().map(Device::from_document).collect();
                        self.board.apply_devices(catalog);
                    }
                    Err(e) => {
                        error!("Device listener failed: {}", e);
                        self.devices_error = Some(format!("Error listening for device changes: {}", e));
                    }
                },
                Some(result) = self.energy.next() => match result {
                    Ok(snapshot) => {
                        self.energy_error = None;
                        for transition in self.board.apply_energy(energy_records(&snapshot)) {
                            self.dispatcher.power_changed(&transition).await;
                        }
                    }
                    Err(e) => {
                        error!("Energy listener failed: {}", e);
                        self.energy_error =
                            Some(format!("Error listening for energy data updates: {}", e));
                    }
                },
                else => break,
            }

            self.state.send_replace(DashboardState {
                devices: self.board.devices().to_vec(),
                error_message: self.devices_error.clone().or_else(|| self.energy_error.clone()),
            });
        }
        debug!("Dashboard worker finished");
    }
}

async fn first_snapshot(subscription: &mut Subscription) -> Result<Snapshot> {
    subscription
        .next()
        .await
        .unwrap_or_else(|| Err(AppError::Backend("listener closed before its first snapshot".to_string())))
}

fn energy_records(snapshot: &Snapshot) -> Vec<EnergyRecord> {
    let now = Utc::now();
    snapshot
        .documents
        .iter()
        .map(|doc| EnergyRecord::from_document(doc, now))
        .collect()
}
