use crate::store::{Document, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_DEVICE: &str = "Unknown Device";
pub const DEFAULT_IMAGE: &str = "AppLogo.png";
pub const DEFAULT_CATEGORY: &str = "Other";

/// An entry of the user's device catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub image: String,
    pub category: String,
}

impl Device {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.str_or("name", UNKNOWN_DEVICE),
            image: doc.str_or("image", DEFAULT_IMAGE),
            category: doc.str_or("category", DEFAULT_CATEGORY),
        }
    }
}

/// One device's usage for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub device_id: String,
    pub is_on: bool,
    /// Minutes switched on
    pub usage_time: i64,
    /// kWh
    pub consumption: f64,
    pub last_updated: DateTime<Utc>,
    pub cost: f64,
}

impl EnergyRecord {
    /// Decode a record; a missing `last_updated` is read as `now`.
    pub fn from_document(doc: &Document, now: DateTime<Utc>) -> Self {
        Self {
            device_id: doc.id.clone(),
            is_on: doc.bool_or("isOn", false),
            usage_time: doc.i64_or("usageTime", 0),
            consumption: doc.f64_or("consumption", 0.0),
            last_updated: doc.opt_timestamp("last_updated").unwrap_or(now),
            cost: doc.f64_or("cost", 0.0),
        }
    }

    /// Fields written when the power state is changed from this client.
    pub fn power_update(is_on: bool, at: DateTime<Utc>) -> Fields {
        crate::fields! {
            "isOn" => is_on,
            "last_updated" => at,
        }
    }
}

/// A catalog device with today's record, if it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceWithEnergy {
    pub device: Device,
    pub energy: Option<EnergyRecord>,
}

impl DeviceWithEnergy {
    pub fn new(device: Device, energy: Option<EnergyRecord>) -> Self {
        Self { device, energy }
    }

    pub fn id(&self) -> &str {
        &self.device.id
    }

    pub fn is_on(&self) -> bool {
        self.energy.as_ref().map(|e| e.is_on).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_device_defaults() {
        let device = Device::from_document(&Document::new("d1", Fields::new()));

        assert_eq!(
            device,
            Device {
                id: "d1".to_string(),
                name: "Unknown Device".to_string(),
                image: "AppLogo.png".to_string(),
                category: "Other".to_string(),
            }
        );
    }

    #[test]
    fn test_energy_record_from_document() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        let seen = Utc.with_ymd_and_hms(2025, 3, 4, 9, 15, 0).unwrap();
        let doc = Document::new(
            "kettle",
            fields! {
                "isOn" => true,
                "usageTime" => 42_i64,
                "consumption" => 1.5,
                "last_updated" => seen,
            },
        );

        let record = EnergyRecord::from_document(&doc, now);
        assert_eq!(record.device_id, "kettle");
        assert!(record.is_on);
        assert_eq!(record.usage_time, 42);
        assert_eq!(record.consumption, 1.5);
        assert_eq!(record.last_updated, seen);
        assert_eq!(record.cost, 0.0);
    }

    #[test]
    fn test_energy_record_missing_timestamp_uses_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        let record = EnergyRecord::from_document(&Document::new("x", Fields::new()), now);

        assert!(!record.is_on);
        assert_eq!(record.last_updated, now);
    }

    #[test]
    fn test_composite_without_record_is_off() {
        let device = Device::from_document(&Document::new("d1", Fields::new()));
        let composite = DeviceWithEnergy::new(device, None);
        assert_eq!(composite.id(), "d1");
        assert!(!composite.is_on());
    }
}
