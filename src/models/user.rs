use crate::store::{Document, Fields};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const NO_EMAIL: &str = "No email provided";

/// Profile stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Electricity rate in $/kWh
    pub rate: Option<f64>,
    pub total_bill_amount: Option<f64>,
}

impl UserProfile {
    pub fn new(uid: &str, name: &str, email: &str, rate: Option<f64>) -> Self {
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            latitude: None,
            longitude: None,
            rate,
            total_bill_amount: None,
        }
    }

    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.id.clone(),
            name: doc.str_or("name", UNKNOWN_NAME),
            email: doc.str_or("email", NO_EMAIL),
            latitude: doc.opt_f64("latitude"),
            longitude: doc.opt_f64("longitude"),
            rate: doc.opt_f64("rate"),
            total_bill_amount: doc.opt_f64("totalBillAmount"),
        }
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = crate::fields! {
            "uid" => self.uid.as_str(),
            "name" => self.name.as_str(),
            "email" => self.email.as_str(),
        };
        let optional = [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("rate", self.rate),
            ("totalBillAmount", self.total_bill_amount),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                fields.insert(key.to_string(), v.into());
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_defaults() {
        let profile = UserProfile::from_document(&Document::new("u1", Fields::new()));
        assert_eq!(profile.name, "Unknown");
        assert_eq!(profile.email, "No email provided");
        assert_eq!(profile.rate, None);
    }

    #[test]
    fn test_profile_round_trips_through_fields() {
        let mut profile = UserProfile::new("u1", "Sam", "sam@example.com", Some(0.41));
        profile.latitude = Some(59.33);

        let doc = Document::new("u1", profile.to_fields());
        assert_eq!(UserProfile::from_document(&doc), profile);
    }

    #[test]
    fn test_integer_rate_is_read() {
        let doc = Document::new("u1", fields! { "rate" => 1_i64, "totalBillAmount" => 88.5 });
        let profile = UserProfile::from_document(&doc);
        assert_eq!(profile.rate, Some(1.0));
        assert_eq!(profile.total_bill_amount, Some(88.5));
    }
}
