use super::{Dated, Metered};
use crate::store::{paths, Document};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Whole-home totals for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// `yyyy-MM-dd`
    pub id: String,
    pub date: NaiveDate,
    pub total_consumption: f64,
    pub total_cost: f64,
}

impl DailyUsage {
    /// `None` when the document id is not a day.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let Some(date) = paths::parse_day_id(&doc.id) else {
            warn!("Skipping usage document with non-date id {}", doc.id);
            return None;
        };

        Some(Self {
            id: doc.id.clone(),
            date,
            total_consumption: doc.f64_or("total_consumption", 0.0),
            total_cost: doc.f64_or("total_cost", 0.0),
        })
    }
}

impl Dated for DailyUsage {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Metered for DailyUsage {
    fn consumption(&self) -> f64 {
        self.total_consumption
    }

    fn cost(&self) -> f64 {
        self.total_cost
    }
}

/// Consumption during one hour of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyUsage {
    /// Hour label, taken from the document id
    pub hour: String,
    pub consumption: f64,
    pub cost: f64,
}

impl HourlyUsage {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let consumption = doc.opt_f64("consumption")?;
        Some(Self {
            hour: doc.id.clone(),
            consumption,
            cost: doc.f64_or("cost", 0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::store::Fields;

    #[test]
    fn test_daily_usage_defaults_missing_totals() {
        let doc = Document::new("2025-03-03", fields! { "total_consumption" => 12.5 });
        let usage = DailyUsage::from_document(&doc).unwrap();

        assert_eq!(usage.date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        assert_eq!(usage.total_consumption, 12.5);
        assert_eq!(usage.total_cost, 0.0);
    }

    #[test]
    fn test_daily_usage_skips_non_date_ids() {
        let doc = Document::new("monthly_summary", fields! { "total_consumption" => 1.0 });
        assert!(DailyUsage::from_document(&doc).is_none());
    }

    #[test]
    fn test_hourly_usage_requires_consumption() {
        let with = Document::new("08:00", fields! { "consumption" => 0.75 });
        let without = Document::new("09:00", Fields::new());

        let hour = HourlyUsage::from_document(&with).unwrap();
        assert_eq!(hour.hour, "08:00");
        assert_eq!(hour.consumption, 0.75);
        assert!(HourlyUsage::from_document(&without).is_none());
    }
}
