use crate::store::{Document, FieldValue};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An energy-saving suggestion produced for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub source: String,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Insight {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let source = doc.get("source").and_then(FieldValue::as_str);
        let suggestions = doc.get("suggestions").and_then(FieldValue::as_array).map(|items| {
            items
                .iter()
                .filter_map(FieldValue::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        let timestamp = doc.opt_timestamp("timestamp");

        match (source, suggestions, timestamp) {
            (Some(source), Some(suggestions), Some(timestamp)) => Some(Self {
                id: doc.id.clone(),
                source: source.to_string(),
                suggestions,
                timestamp,
            }),
            _ => {
                warn!("Skipping malformed insight {}", doc.id);
                None
            }
        }
    }

    /// Calendar day of the timestamp as seen in `tz`.
    pub fn day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.timestamp.with_timezone(tz).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use chrono::FixedOffset;

    #[test]
    fn test_insight_from_document() {
        let ts = Utc.with_ymd_and_hms(2025, 4, 4, 21, 30, 0).unwrap();
        let doc = Document::new(
            "i1",
            fields! {
                "source" => "weekly-model",
                "suggestions" => vec!["Lower the heater by 1 degree".to_string()],
                "timestamp" => ts,
            },
        );

        let insight = Insight::from_document(&doc).unwrap();
        assert_eq!(insight.source, "weekly-model");
        assert_eq!(insight.suggestions.len(), 1);
        assert_eq!(insight.day_in(&Utc), NaiveDate::from_ymd_opt(2025, 4, 4).unwrap());
    }

    #[test]
    fn test_insight_day_follows_offset() {
        let insight = Insight {
            id: "i3".to_string(),
            source: "weekly-model".to_string(),
            suggestions: Vec::new(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, 4, 21, 30, 0).unwrap(),
        };

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();
        assert_eq!(insight.day_in(&tokyo), NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
        assert_eq!(insight.day_in(&new_york), NaiveDate::from_ymd_opt(2025, 4, 4).unwrap());
    }

    #[test]
    fn test_insight_missing_timestamp_is_skipped() {
        let doc = Document::new(
            "i2",
            fields! { "source" => "x", "suggestions" => Vec::<String>::new() },
        );
        assert!(Insight::from_document(&doc).is_none());
    }
}
