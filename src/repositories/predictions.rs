use crate::error::Result;
use crate::models::{DailyPrediction, HourlyPrediction};
use crate::store::{paths, DocumentStore};
use chrono::NaiveDate;

pub struct PredictionRepository;

impl PredictionRepository {
    pub async fn daily_predictions(
        store: &dyn DocumentStore,
        uid: &str,
    ) -> Result<Vec<DailyPrediction>> {
        let docs = store.list_documents(&paths::predictions(uid)).await?;
        let mut predictions: Vec<DailyPrediction> =
            docs.iter().filter_map(DailyPrediction::from_document).collect();
        predictions.sort_by_key(|p| p.date);
        Ok(predictions)
    }

    pub async fn hourly_predictions(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Vec<HourlyPrediction>> {
        let docs = store
            .list_documents(&paths::hourly_predictions(uid, date))
            .await?;
        Ok(docs.iter().filter_map(HourlyPrediction::from_document).collect())
    }
}
