use crate::error::Result;
use crate::models::{DailyUsage, HourlyUsage};
use crate::store::{paths, DocumentStore};
use chrono::NaiveDate;

pub struct EnergyRepository;

impl EnergyRepository {
    /// Daily totals, ascending by date. Non-date documents are skipped.
    pub async fn daily_usages(store: &dyn DocumentStore, uid: &str) -> Result<Vec<DailyUsage>> {
        let docs = store.list_documents(&paths::energy_days(uid)).await?;
        let mut usages: Vec<DailyUsage> = docs.iter().filter_map(DailyUsage::from_document).collect();
        usages.sort_by_key(|u| u.date);
        Ok(usages)
    }

    pub async fn hourly_usage(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Vec<HourlyUsage>> {
        let docs = store.list_documents(&paths::hourly_usage(uid, date)).await?;
        Ok(docs.iter().filter_map(HourlyUsage::from_document).collect())
    }
}
