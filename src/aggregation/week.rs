use super::UsageTotals;
use crate::models::{Dated, Metered};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A Monday-to-Sunday span identified by its ISO year and week number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub iso_year: i32,
    pub week_number: u32,
    /// Monday
    pub start: NaiveDate,
    /// Sunday
    pub end: NaiveDate,
}

impl WeekRange {
    /// `"{week}-{monday as unix seconds}"`
    pub fn id(&self) -> String {
        let start_ts = self.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        format!("{}-{}", self.week_number, start_ts)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn description(&self) -> String {
        format!(
            "Week {} ({} to {})",
            self.week_number,
            self.start.format("%m/%d/%Y"),
            self.end.format("%m/%d/%Y")
        )
    }

    fn key(&self) -> (i32, u32) {
        (self.iso_year, self.week_number)
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// The ISO week that contains `date`.
pub fn week_range_for(date: NaiveDate) -> WeekRange {
    let iso = date.iso_week();
    let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    WeekRange {
        iso_year: iso.year(),
        week_number: iso.week(),
        start,
        end: start + Duration::days(6),
    }
}

/// Records of one week with their sums.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekGroup<R> {
    pub range: WeekRange,
    /// Members, ascending by date
    pub records: Vec<R>,
    pub totals: UsageTotals,
}

/// Bucket records by ISO week, earliest week first.
///
/// Every record lands in exactly one group.
pub fn group_by_week<R>(records: &[R]) -> Vec<WeekGroup<R>>
where
    R: Dated + Metered + Clone,
{
    let mut buckets: BTreeMap<(i32, u32), Vec<R>> = BTreeMap::new();
    for record in records {
        let iso = record.date().iso_week();
        buckets
            .entry((iso.year(), iso.week()))
            .or_default()
            .push(record.clone());
    }

    buckets
        .into_values()
        .filter_map(|mut members| {
            members.sort_by_key(|r| r.date());
            let earliest = members.first()?.date();
            let totals = UsageTotals::sum(&members);
            Some(WeekGroup {
                range: week_range_for(earliest),
                records: members,
                totals,
            })
        })
        .collect()
}

/// Distinct weeks covering `dates`, earliest first.
pub fn week_ranges<I>(dates: I) -> Vec<WeekRange>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut seen = BTreeSet::new();
    let mut ranges: Vec<WeekRange> = dates
        .into_iter()
        .map(week_range_for)
        .filter(|range| seen.insert(range.key()))
        .collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Records whose date falls inside `range`, ascending by date.
pub fn records_in_week<R>(records: &[R], range: &WeekRange) -> Vec<R>
where
    R: Dated + Clone,
{
    let mut members: Vec<R> = records
        .iter()
        .filter(|r| range.contains(r.date()))
        .cloned()
        .collect();
    members.sort_by_key(|r| r.date());
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyUsage;
    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usage(date: NaiveDate, kwh: f64, cost: f64) -> DailyUsage {
        DailyUsage {
            id: date.to_string(),
            date,
            total_consumption: kwh,
            total_cost: cost,
        }
    }

    #[test]
    fn test_week_bounds_are_monday_to_sunday() {
        let range = week_range_for(day(2025, 3, 6));

        assert_eq!(range.start, day(2025, 3, 3));
        assert_eq!(range.end, day(2025, 3, 9));
        assert_eq!(range.start.weekday(), Weekday::Mon);
        assert_eq!(range.end.weekday(), Weekday::Sun);
        assert_eq!(range.week_number, 10);
    }

    #[test]
    fn test_monday_and_sunday_share_bucket() {
        let records = vec![
            usage(day(2025, 3, 9), 2.0, 0.8),
            usage(day(2025, 3, 3), 1.0, 0.4),
            usage(day(2025, 3, 10), 4.0, 1.6),
        ];

        let groups = group_by_week(&records);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].range.start, day(2025, 3, 3));
        assert_eq!(groups[0].range.end, day(2025, 3, 9));
        assert_eq!(
            groups[0].records.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![day(2025, 3, 3), day(2025, 3, 9)]
        );
        assert_eq!(groups[0].totals.consumption, 3.0);

        assert_eq!(groups[1].range.start, day(2025, 3, 10));
        assert_eq!(groups[1].records.len(), 1);
    }

    #[test]
    fn test_groups_partition_input() {
        let start = day(2024, 12, 20);
        let records: Vec<DailyUsage> = (0..40)
            .step_by(3)
            .map(|offset| usage(start + Duration::days(offset), 1.0, 0.5))
            .collect();

        let groups = group_by_week(&records);
        let grouped: usize = groups.iter().map(|g| g.records.len()).sum();
        assert_eq!(grouped, records.len());

        for record in &records {
            let owners = groups.iter().filter(|g| g.range.contains(record.date)).count();
            assert_eq!(owners, 1, "{} owned by {} buckets", record.date, owners);
        }

        for pair in groups.windows(2) {
            assert!(pair[0].range.end < pair[1].range.start);
        }
    }

    #[test]
    fn test_iso_year_boundary() {
        // 2024-12-30 is a Monday in ISO week 1 of 2025
        let range = week_range_for(day(2025, 1, 2));
        assert_eq!(range.iso_year, 2025);
        assert_eq!(range.week_number, 1);
        assert_eq!(range.start, day(2024, 12, 30));
        assert_eq!(week_range_for(day(2024, 12, 30)), range);
    }

    #[test]
    fn test_id_and_description() {
        let range = week_range_for(day(2025, 3, 3));
        assert_eq!(range.id(), "10-1740960000");
        assert_eq!(range.description(), "Week 10 (03/03/2025 to 03/09/2025)");
        assert_eq!(range.to_string(), range.description());
    }

    #[test]
    fn test_week_ranges_deduplicate_and_sort() {
        let ranges = week_ranges(vec![
            day(2025, 3, 12),
            day(2025, 3, 4),
            day(2025, 3, 5),
            day(2025, 3, 10),
        ]);

        assert_eq!(
            ranges.iter().map(|r| r.start).collect::<Vec<_>>(),
            vec![day(2025, 3, 3), day(2025, 3, 10)]
        );
        assert!(week_ranges(Vec::new()).is_empty());
    }

    #[test]
    fn test_records_in_week_sorted() {
        let records = vec![
            usage(day(2025, 3, 8), 1.0, 0.0),
            usage(day(2025, 3, 2), 1.0, 0.0),
            usage(day(2025, 3, 4), 1.0, 0.0),
        ];
        let range = week_range_for(day(2025, 3, 5));

        let members = records_in_week(&records, &range);
        assert_eq!(
            members.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![day(2025, 3, 4), day(2025, 3, 8)]
        );
    }
}
