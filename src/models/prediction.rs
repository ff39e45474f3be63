use super::{Dated, Metered};
use crate::store::{paths, Document};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Forecast totals for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrediction {
    pub id: String,
    pub date: NaiveDate,
    /// kWh
    pub prediction: f64,
    pub predicted_cost: f64,
}

impl DailyPrediction {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let parsed = paths::parse_day_id(&doc.id).and_then(|date| {
            Some((
                date,
                doc.opt_f64("total_prediction")?,
                doc.opt_f64("predicted_cost")?,
            ))
        });

        match parsed {
            Some((date, prediction, predicted_cost)) => Some(Self {
                id: doc.id.clone(),
                date,
                prediction,
                predicted_cost,
            }),
            None => {
                warn!("Failed to parse prediction document {}", doc.id);
                None
            }
        }
    }
}

impl Dated for DailyPrediction {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Metered for DailyPrediction {
    fn consumption(&self) -> f64 {
        self.prediction
    }

    fn cost(&self) -> f64 {
        self.predicted_cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrediction {
    pub hour: String,
    pub prediction: f64,
    pub predicted_cost: f64,
}

impl HourlyPrediction {
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            hour: doc.id.clone(),
            prediction: doc.opt_f64("prediction")?,
            predicted_cost: doc.opt_f64("predicted_cost")?,
        })
    }
}
