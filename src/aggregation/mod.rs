//! Weekly and monthly rollups of dated usage records.

mod month;
mod week;

pub use month::{filter_month, month_totals, MonthSelection};
pub use week::{group_by_week, records_in_week, week_range_for, week_ranges, WeekGroup, WeekRange};

use crate::models::Metered;
use serde::{Deserialize, Serialize};

/// Summed consumption (kWh) and cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub consumption: f64,
    pub cost: f64,
}

impl UsageTotals {
    pub fn add<R: Metered + ?Sized>(self, record: &R) -> Self {
        Self {
            consumption: self.consumption + record.consumption(),
            cost: self.cost + record.cost(),
        }
    }

    pub fn sum<R: Metered>(records: &[R]) -> Self {
        records.iter().fold(Self::default(), |acc, r| acc.add(r))
    }
}

/// Keep the previous week if it still exists.
///
/// A selection that disappeared falls back to the first week; no selection
/// picks the most recent one.
pub fn reconcile_selection(previous: Option<&WeekRange>, ranges: &[WeekRange]) -> Option<WeekRange> {
    match previous {
        None => ranges.last().cloned(),
        Some(prev) => {
            let id = prev.id();
            ranges
                .iter()
                .find(|r| r.id() == id)
                .or_else(|| ranges.first())
                .cloned()
        }
    }
}
