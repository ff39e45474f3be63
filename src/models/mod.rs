pub mod device;
pub mod insight;
pub mod prediction;
pub mod usage;
pub mod user;

pub use device::{Device, DeviceWithEnergy, EnergyRecord};
pub use insight::Insight;
pub use prediction::{DailyPrediction, HourlyPrediction};
pub use usage::{DailyUsage, HourlyUsage};
pub use user::UserProfile;

use chrono::NaiveDate;

/// A record that belongs to one calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// A record carrying an energy amount (kWh) and its cost.
pub trait Metered {
    fn consumption(&self) -> f64;
    fn cost(&self) -> f64;
}
