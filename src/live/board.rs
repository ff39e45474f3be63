use crate::models::{Device, DeviceWithEnergy, EnergyRecord};
use crate::models::device::UNKNOWN_DEVICE;
use crate::notify::PowerTransition;
use std::collections::HashMap;
use tracing::debug;

/// Today's devices merged with their energy records.
///
/// Records are cached by device id so a record that arrives before its
/// device is attached once the device shows up in the catalog. The cache
/// holds what the store last reported; toggles made on this client are
/// kept apart as pending until the store echoes them back.
#[derive(Debug, Clone, Default)]
pub struct DeviceBoard {
    devices: Vec<DeviceWithEnergy>,
    energy: HashMap<String, EnergyRecord>,
    pending: HashMap<String, bool>,
}

impl DeviceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an initial fetch.
    pub fn from_composites(composites: Vec<DeviceWithEnergy>) -> Self {
        let energy = composites
            .iter()
            .filter_map(|c| c.energy.clone().map(|e| (c.device.id.clone(), e)))
            .collect();
        Self {
            devices: composites,
            energy,
            pending: HashMap::new(),
        }
    }

    pub fn devices(&self) -> &[DeviceWithEnergy] {
        &self.devices
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceWithEnergy> {
        self.devices.iter().find(|c| c.device.id == device_id)
    }

    /// Whether a local toggle for the device is waiting for its echo.
    pub fn is_pending(&self, device_id: &str) -> bool {
        self.pending.contains_key(device_id)
    }

    /// Rebuild the list from a catalog snapshot. Devices missing from the
    /// snapshot are dropped.
    pub fn apply_devices(&mut self, catalog: Vec<Device>) {
        self.devices = catalog
            .into_iter()
            .map(|device| DeviceWithEnergy::new(device, None))
            .collect();
        self.refresh();
        debug!("Device catalog now has {} entries", self.devices.len());
    }

    /// Replace the day's records with a snapshot and report power changes.
    ///
    /// A change is only reported for a device whose previous state was
    /// known and that has no local toggle in flight. A record matching the
    /// pending toggle confirms it; any other record for that device is
    /// treated as not yet caught up.
    pub fn apply_energy(&mut self, records: Vec<EnergyRecord>) -> Vec<PowerTransition> {
        let mut transitions = Vec::new();
        let mut next = HashMap::with_capacity(records.len());

        for record in records {
            let pending = self.pending.get(&record.device_id).copied();
            match pending {
                Some(wanted) if wanted == record.is_on => {
                    debug!("Local toggle of {} confirmed", record.device_id);
                    self.pending.remove(&record.device_id);
                }
                Some(_) => {}
                None => {
                    let previous = self.energy.get(&record.device_id).map(|e| e.is_on);
                    if previous.is_some_and(|was_on| was_on != record.is_on) {
                        transitions.push(PowerTransition {
                            device_id: record.device_id.clone(),
                            device_name: self.device_name(&record.device_id),
                            is_on: record.is_on,
                        });
                    }
                }
            }
            next.insert(record.device_id.clone(), record);
        }

        self.energy = next;
        self.pending.retain(|id, _| self.energy.contains_key(id));
        self.refresh();
        transitions
    }

    /// Flip a device locally before the write is confirmed.
    ///
    /// Returns `false` when the device has no record for the day.
    pub fn set_power_local(&mut self, device_id: &str, is_on: bool) -> bool {
        if !self.energy.contains_key(device_id) {
            return false;
        }
        self.pending.insert(device_id.to_string(), is_on);
        self.refresh();
        true
    }

    /// Drop a local toggle whose write failed and show the stored state
    /// again. Returns `false` when nothing was pending.
    pub fn revert_local(&mut self, device_id: &str) -> bool {
        if self.pending.remove(device_id).is_none() {
            return false;
        }
        self.refresh();
        true
    }

    fn device_name(&self, device_id: &str) -> String {
        self.get(device_id)
            .map(|c| c.device.name.clone())
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string())
    }

    /// Attach cached records, with pending toggles laid over them.
    fn refresh(&mut self) {
        for composite in &mut self.devices {
            composite.energy = self.energy.get(&composite.device.id).cloned().map(|mut e| {
                if let Some(&is_on) = self.pending.get(&e.device_id) {
                    e.is_on = is_on;
                }
                e
            });
        }
    }
}
