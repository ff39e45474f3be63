use super::UsageTotals;
use crate::models::{Dated, Metered};
use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthSelection {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl MonthSelection {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `"March 2025"`, or a bare `"March"` which resolves to
    /// `current_year`. Month names are English, full or abbreviated.
    pub fn parse(input: &str, current_year: i32) -> Option<Self> {
        let mut parts = input.split_whitespace();
        let month: Month = parts.next()?.parse().ok()?;
        let year = match parts.next() {
            Some(y) => y.parse().ok()?,
            None => current_year,
        };
        if parts.next().is_some() {
            return None;
        }
        Self::new(year, month.number_from_month())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// `"March 2025"`
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for MonthSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Records dated inside `selection`, in input order.
pub fn filter_month<R>(records: &[R], selection: MonthSelection) -> Vec<R>
where
    R: Dated + Clone,
{
    records
        .iter()
        .filter(|r| selection.contains(r.date()))
        .cloned()
        .collect()
}

pub fn month_totals<R>(records: &[R], selection: MonthSelection) -> UsageTotals
where
    R: Dated + Metered,
{
    records
        .iter()
        .filter(|r| selection.contains(r.date()))
        .fold(UsageTotals::default(), |acc, r| acc.add(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyUsage;
    use pretty_assertions::assert_eq;

    fn usage(y: i32, m: u32, d: u32, kwh: f64, cost: f64) -> DailyUsage {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        DailyUsage {
            id: date.to_string(),
            date,
            total_consumption: kwh,
            total_cost: cost,
        }
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            MonthSelection::parse("March 2025", 2030),
            MonthSelection::new(2025, 3)
        );
        assert_eq!(
            MonthSelection::parse("december", 2024),
            MonthSelection::new(2024, 12)
        );
        assert_eq!(MonthSelection::parse("Smarch 2025", 2025), None);
        assert_eq!(MonthSelection::parse("March 2025 extra", 2025), None);
        assert_eq!(MonthSelection::parse("", 2025), None);
        assert_eq!(MonthSelection::new(2025, 13), None);
    }

    #[test]
    fn test_label() {
        let selection = MonthSelection::new(2025, 3).unwrap();
        assert_eq!(selection.label(), "March 2025");
        assert_eq!(
            MonthSelection::parse(&selection.to_string(), 1999),
            Some(selection)
        );
    }

    #[test]
    fn test_filter_month_matches_month_and_year() {
        let records = vec![
            usage(2025, 3, 1, 1.0, 0.5),
            usage(2024, 3, 15, 9.0, 4.0),
            usage(2025, 4, 1, 2.0, 1.0),
            usage(2025, 3, 31, 3.0, 1.5),
        ];
        let march = MonthSelection::new(2025, 3).unwrap();

        let filtered = filter_month(&records, march);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| march.contains(r.date)));

        let totals = month_totals(&records, march);
        assert_eq!(totals.consumption, 4.0);
        assert_eq!(totals.cost, 2.0);
    }

    #[test]
    fn test_filter_month_without_matches() {
        let records = vec![usage(2025, 3, 1, 1.0, 0.5)];
        let june = MonthSelection::new(2025, 6).unwrap();

        assert!(filter_month(&records, june).is_empty());
        assert_eq!(month_totals(&records, june), UsageTotals::default());
    }
}
