//! Per-user document layout.

use chrono::NaiveDate;

/// Date format used for day document ids.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn day_id(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

pub fn parse_day_id(id: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(id, DAY_FORMAT).ok()
}

pub fn user(uid: &str) -> String {
    format!("users/{}", uid)
}

pub fn devices(uid: &str) -> String {
    format!("users/{}/devices", uid)
}

pub fn device(uid: &str, device_id: &str) -> String {
    format!("users/{}/devices/{}", uid, device_id)
}

pub fn energy_days(uid: &str) -> String {
    format!("users/{}/energy_data", uid)
}

pub fn device_energy(uid: &str, date: NaiveDate) -> String {
    format!("users/{}/energy_data/{}/devices", uid, day_id(date))
}

pub fn device_energy_record(uid: &str, date: NaiveDate, device_id: &str) -> String {
    format!("{}/{}", device_energy(uid, date), device_id)
}

pub fn hourly_usage(uid: &str, date: NaiveDate) -> String {
    format!("users/{}/energy_data/{}/hourly_data", uid, day_id(date))
}

pub fn predictions(uid: &str) -> String {
    format!("users/{}/predictions", uid)
}

pub fn hourly_predictions(uid: &str, date: NaiveDate) -> String {
    format!("users/{}/predictions/{}/hourly_prediction", uid, day_id(date))
}

pub fn insights(uid: &str) -> String {
    format!("users/{}/insights", uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_id_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(day_id(date), "2025-03-09");
        assert_eq!(parse_day_id("2025-03-09"), Some(date));
        assert_eq!(parse_day_id("summary"), None);
    }

    #[test]
    fn test_nested_paths() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(
            device_energy_record("u1", date, "fridge"),
            "users/u1/energy_data/2025-04-01/devices/fridge"
        );
        assert_eq!(
            hourly_predictions("u1", date),
            "users/u1/predictions/2025-04-01/hourly_prediction"
        );
    }
}
