//! Document database access.
//!
//! Everything the client reads or writes goes through [`DocumentStore`]. Two
//! backends exist: [`memory::InMemoryStore`] for tests and offline runs, and
//! [`rest::RestStore`] for the hosted document database.

pub mod memory;
pub mod paths;
pub mod rest;
mod value;

pub use value::{FieldValue, Fields};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A document: its id (last path segment) and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(FieldValue::as_f64).unwrap_or(default)
    }

    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(FieldValue::as_i64).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(FieldValue::as_bool).unwrap_or(default)
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(FieldValue::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn opt_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(FieldValue::as_timestamp)
    }
}

/// State of a listened collection or document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Collection or document path that was listened to
    pub path: String,
    /// Documents currently present, ordered by id. A document listener
    /// carries zero or one entries.
    pub documents: Vec<Document>,
}

/// A live listener. Delivers an initial snapshot, then one per change.
///
/// Dropping the subscription unregisters the listener.
pub struct Subscription {
    rx: mpsc::Receiver<Result<Snapshot>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Wrap a channel whose sending half is driven by `task`.
    pub fn new(rx: mpsc::Receiver<Result<Snapshot>>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Next snapshot, or `None` once the listener has stopped.
    pub async fn next(&mut self) -> Option<Result<Snapshot>> {
        self.rx.recv().await
    }

    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Remote document database.
///
/// Paths are slash-separated, alternating collection and document ids, as
/// built by [`paths`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when it does not exist.
    async fn get_document(&self, path: &str) -> Result<Option<Document>>;

    /// All documents directly inside a collection, ordered by id.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>>;

    /// Create or replace a document.
    async fn set_document(&self, path: &str, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document. Fails with `NotFound` when
    /// the document does not exist.
    async fn update_document(&self, path: &str, fields: Fields) -> Result<()>;

    async fn listen_collection(&self, collection: &str) -> Result<Subscription>;

    async fn listen_document(&self, path: &str) -> Result<Subscription>;
}

/// Split a document path into its parent collection and id.
pub(crate) fn split_document_path(path: &str) -> Option<(&str, &str)> {
    let (parent, id) = path.rsplit_once('/')?;
    if parent.is_empty() || id.is_empty() {
        return None;
    }
    Some((parent, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_split_document_path() {
        assert_eq!(
            split_document_path("users/u1/devices/d1"),
            Some(("users/u1/devices", "d1"))
        );
        assert_eq!(split_document_path("users"), None);
        assert_eq!(split_document_path("users/"), None);
    }

    #[test]
    fn test_document_accessors_fall_back() {
        let doc = Document::new(
            "d1",
            fields! { "name" => "Heater", "usageTime" => 30_i64, "cost" => 2_i64 },
        );

        assert_eq!(doc.str_or("name", "Unknown Device"), "Heater");
        assert_eq!(doc.str_or("image", "AppLogo.png"), "AppLogo.png");
        assert_eq!(doc.i64_or("usageTime", 0), 30);
        assert_eq!(doc.f64_or("cost", 0.0), 2.0);
        assert!(!doc.bool_or("isOn", false));
        assert_eq!(doc.opt_f64("rate"), None);
    }
}
