use crate::error::Result;
use crate::models::Insight;
use crate::store::{paths, DocumentStore, Snapshot, Subscription};

pub struct InsightRepository;

impl InsightRepository {
    /// Decode a feed snapshot, newest first.
    pub fn from_snapshot(snapshot: &Snapshot) -> Vec<Insight> {
        let mut insights: Vec<Insight> = snapshot
            .documents
            .iter()
            .filter_map(Insight::from_document)
            .collect();
        insights.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        insights
    }

    pub async fn listen(store: &dyn DocumentStore, uid: &str) -> Result<Subscription> {
        store.listen_collection(&paths::insights(uid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::store::Document;
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn test_snapshot_sorted_newest_first() {
        let older = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2025, 4, 3, 9, 0, 0).unwrap();
        let doc = |id: &str, ts: DateTime<Utc>| {
            Document::new(
                id,
                fields! {
                    "source" => "model",
                    "suggestions" => vec!["tip".to_string()],
                    "timestamp" => ts,
                },
            )
        };
        let snapshot = Snapshot {
            path: "users/u1/insights".to_string(),
            documents: vec![doc("a", older), doc("b", newer), Document::new("c", fields! {})],
        };

        let insights = InsightRepository::from_snapshot(&snapshot);
        let ids: Vec<&str> = insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
