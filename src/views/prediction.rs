use super::{report, AppContext};
use crate::aggregation::{reconcile_selection, records_in_week, week_ranges, WeekRange};
use crate::error::{AppError, Result};
use crate::models::{DailyPrediction, DailyUsage, HourlyPrediction, HourlyUsage};
use crate::notify::NotificationDispatcher;
use crate::repositories::{EnergyRepository, PredictionRepository};
use chrono::NaiveDate;
use tracing::debug;

/// Forecast against actual usage, week by week.
pub struct PredictionScreen {
    ctx: AppContext,
    dispatcher: NotificationDispatcher,
    pub daily_predictions: Vec<DailyPrediction>,
    pub daily_usages: Vec<DailyUsage>,
    pub available_weeks: Vec<WeekRange>,
    pub selected_week: Option<WeekRange>,
    pub hourly_predictions: Vec<HourlyPrediction>,
    pub hourly_usages: Vec<HourlyUsage>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl PredictionScreen {
    pub fn new(ctx: AppContext) -> Self {
        let dispatcher = ctx.dispatcher();
        Self {
            ctx,
            dispatcher,
            daily_predictions: Vec::new(),
            daily_usages: Vec::new(),
            available_weeks: Vec::new(),
            selected_week: None,
            hourly_predictions: Vec::new(),
            hourly_usages: Vec::new(),
            is_loading: false,
            error_message: None,
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("prediction load") else {
            return Ok(());
        };

        self.is_loading = true;
        let fetched = async {
            let predictions = PredictionRepository::daily_predictions(self.ctx.store(), &uid).await?;
            let usages = EnergyRepository::daily_usages(self.ctx.store(), &uid).await?;
            Ok::<_, AppError>((predictions, usages))
        }
        .await;
        self.is_loading = false;

        let (predictions, usages) = match fetched {
            Ok(data) => data,
            Err(e) => {
                report(&mut self.error_message, "Error fetching prediction data", &e);
                return Err(e);
            }
        };

        self.dispatcher.predictions_loaded(predictions.len()).await;
        debug!(
            "Loaded {} predictions and {} usage records",
            predictions.len(),
            usages.len()
        );
        self.daily_predictions = predictions;
        self.daily_usages = usages;

        let dates = self
            .daily_predictions
            .iter()
            .map(|p| p.date)
            .chain(self.daily_usages.iter().map(|u| u.date));
        self.available_weeks = week_ranges(dates);
        self.selected_week = reconcile_selection(self.selected_week.as_ref(), &self.available_weeks);
        Ok(())
    }

    pub fn select_week(&mut self, week: Option<WeekRange>) {
        self.selected_week = week;
    }

    /// Predictions in the selected week; empty without a selection.
    pub fn filtered_predictions(&self) -> Vec<DailyPrediction> {
        self.selected_week
            .as_ref()
            .map(|week| records_in_week(&self.daily_predictions, week))
            .unwrap_or_default()
    }

    pub fn filtered_usages(&self) -> Vec<DailyUsage> {
        self.selected_week
            .as_ref()
            .map(|week| records_in_week(&self.daily_usages, week))
            .unwrap_or_default()
    }

    /// Hourly forecast and actual usage for one day.
    pub async fn load_hourly(&mut self, date: NaiveDate) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("hourly prediction") else {
            return Ok(());
        };

        let fetched = async {
            let predictions =
                PredictionRepository::hourly_predictions(self.ctx.store(), &uid, date).await?;
            let usages = EnergyRepository::hourly_usage(self.ctx.store(), &uid, date).await?;
            Ok::<_, AppError>((predictions, usages))
        }
        .await;

        match fetched {
            Ok((predictions, usages)) => {
                self.hourly_predictions = predictions;
                self.hourly_usages = usages;
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching hourly data", &e);
                Err(e)
            }
        }
    }
}
