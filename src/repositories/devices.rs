use crate::error::Result;
use crate::models::{Device, DeviceWithEnergy, EnergyRecord};
use crate::store::{paths, DocumentStore};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

pub struct DeviceRepository;

impl DeviceRepository {
    pub async fn list_devices(store: &dyn DocumentStore, uid: &str) -> Result<Vec<Device>> {
        let docs = store.list_documents(&paths::devices(uid)).await?;
        Ok(docs.iter().map(Device::from_document).collect())
    }

    pub async fn count_devices(store: &dyn DocumentStore, uid: &str) -> Result<usize> {
        Ok(store.list_documents(&paths::devices(uid)).await?.len())
    }

    pub async fn get_device(
        store: &dyn DocumentStore,
        uid: &str,
        device_id: &str,
    ) -> Result<Option<Device>> {
        let doc = store.get_document(&paths::device(uid, device_id)).await?;
        Ok(doc.as_ref().map(Device::from_document))
    }

    pub async fn get_energy(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EnergyRecord>> {
        let doc = store
            .get_document(&paths::device_energy_record(uid, date, device_id))
            .await?;
        Ok(doc.map(|d| EnergyRecord::from_document(&d, now)))
    }

    /// Every catalog device with its record for `date`, fetched concurrently.
    ///
    /// A device whose record cannot be read is listed without one.
    pub async fn list_with_energy(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeviceWithEnergy>> {
        let devices = Self::list_devices(store, uid).await?;
        let lookups = devices
            .iter()
            .map(|device| Self::get_energy(store, uid, date, &device.id, now));
        let records = join_all(lookups).await;

        let composites = devices
            .into_iter()
            .zip(records)
            .map(|(device, record)| {
                let energy = record.unwrap_or_else(|e| {
                    warn!("Failed to read energy for {}: {}", device.id, e);
                    None
                });
                DeviceWithEnergy::new(device, energy)
            })
            .collect::<Vec<_>>();
        debug!("Loaded {} devices for {}", composites.len(), date);
        Ok(composites)
    }

    /// Write a power change to the device's record for `date`.
    pub async fn set_power(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
        device_id: &str,
        is_on: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        store
            .update_document(
                &paths::device_energy_record(uid, date, device_id),
                EnergyRecord::power_update(is_on, at),
            )
            .await
    }
}
