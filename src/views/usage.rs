use super::{report, AppContext};
use crate::aggregation::{
    filter_month, month_totals, reconcile_selection, records_in_week, week_ranges, MonthSelection,
    UsageTotals, WeekRange,
};
use crate::error::{AppError, Result};
use crate::models::{DailyUsage, HourlyUsage};
use crate::repositories::{EnergyRepository, UserRepository};
use chrono::NaiveDate;
use tracing::debug;

/// Historical usage: month totals, weeks of the month, hourly drill-down.
pub struct UsageScreen {
    ctx: AppContext,
    pub daily_usages: Vec<DailyUsage>,
    pub selected_month: MonthSelection,
    pub available_weeks: Vec<WeekRange>,
    pub selected_week: Option<WeekRange>,
    pub monthly_totals: UsageTotals,
    pub hourly_usage: Vec<HourlyUsage>,
    pub rate: f64,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl UsageScreen {
    /// Starts on the month containing `today`.
    pub fn new(ctx: AppContext, today: NaiveDate) -> Self {
        Self {
            ctx,
            daily_usages: Vec::new(),
            selected_month: MonthSelection::of(today),
            available_weeks: Vec::new(),
            selected_week: None,
            monthly_totals: UsageTotals::default(),
            hourly_usage: Vec::new(),
            rate: 0.0,
            is_loading: false,
            error_message: None,
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("usage load") else {
            return Ok(());
        };

        self.is_loading = true;
        let fetched = async {
            let rate = UserRepository::get_rate(self.ctx.store(), &uid).await?;
            let usages = EnergyRepository::daily_usages(self.ctx.store(), &uid).await?;
            Ok::<_, AppError>((rate, usages))
        }
        .await;
        self.is_loading = false;

        match fetched {
            Ok((rate, usages)) => {
                if let Some(rate) = rate {
                    self.rate = rate;
                }
                debug!("Loaded {} daily usage records", usages.len());
                self.daily_usages = usages;
                self.recompute();
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching usage", &e);
                Err(e)
            }
        }
    }

    pub fn select_month(&mut self, month: MonthSelection) {
        self.selected_month = month;
        self.recompute();
    }

    pub fn select_week(&mut self, week: Option<WeekRange>) {
        self.selected_week = week;
    }

    /// Days of the selected week, or of the month when no week is selected.
    pub fn filtered_usage(&self) -> Vec<DailyUsage> {
        match &self.selected_week {
            Some(week) => records_in_week(&self.daily_usages, week),
            None => filter_month(&self.daily_usages, self.selected_month),
        }
    }

    pub async fn load_hourly(&mut self, date: NaiveDate) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("hourly usage") else {
            return Ok(());
        };
        match EnergyRepository::hourly_usage(self.ctx.store(), &uid, date).await {
            Ok(hours) => {
                self.hourly_usage = hours;
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching hourly data", &e);
                Err(e)
            }
        }
    }

    fn recompute(&mut self) {
        let in_month = filter_month(&self.daily_usages, self.selected_month);
        self.available_weeks = week_ranges(in_month.iter().map(|u| u.date));
        self.selected_week = reconcile_selection(self.selected_week.as_ref(), &self.available_weeks);
        self.monthly_totals = month_totals(&self.daily_usages, self.selected_month);
    }
}
