use super::{split_document_path, Document, DocumentStore, Fields, Snapshot, Subscription};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, warn};

type Documents = Arc<RwLock<BTreeMap<String, Fields>>>;

/// Process-local document store with live listeners.
///
/// Every write is announced on a broadcast channel; each listener task
/// filters the announcements for its own path and re-reads the snapshot.
#[derive(Clone)]
pub struct InMemoryStore {
    docs: Documents,
    changes: broadcast::Sender<String>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            docs: Arc::new(RwLock::new(BTreeMap::new())),
            changes,
        }
    }

    /// Number of live listener tasks currently attached.
    pub fn listener_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn announce(&self, path: &str) {
        // No receivers simply means nobody is listening.
        let _ = self.changes.send(path.to_string());
    }

    fn spawn_listener(
        &self,
        mut changes: broadcast::Receiver<String>,
        path: String,
        matches: fn(&str, &str) -> bool,
        read: fn(&BTreeMap<String, Fields>, &str) -> Vec<Document>,
        initial: Vec<Document>,
    ) -> Subscription {
        let docs = self.docs.clone();
        let (tx, rx) = mpsc::channel(32);

        let task = tokio::spawn(async move {
            let first = Snapshot {
                path: path.clone(),
                documents: initial,
            };
            if tx.send(Ok(first)).await.is_err() {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(changed) if matches(&path, &changed) => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Listener on {} lagged by {} changes, resyncing", path, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                let documents = read(&*docs.read().await, &path);
                let snapshot = Snapshot {
                    path: path.clone(),
                    documents,
                };
                if tx.send(Ok(snapshot)).await.is_err() {
                    debug!("Listener on {} dropped", path);
                    break;
                }
            }
        });

        Subscription::new(rx, task)
    }
}

fn collection_documents(docs: &BTreeMap<String, Fields>, collection: &str) -> Vec<Document> {
    let prefix = format!("{}/", collection);
    docs.range(prefix.clone()..)
        .take_while(|(path, _)| path.starts_with(&prefix))
        .filter_map(|(path, fields)| {
            let id = &path[prefix.len()..];
            (!id.contains('/')).then(|| Document::new(id, fields.clone()))
        })
        .collect()
}

fn single_document(docs: &BTreeMap<String, Fields>, path: &str) -> Vec<Document> {
    match (docs.get(path), split_document_path(path)) {
        (Some(fields), Some((_, id))) => vec![Document::new(id, fields.clone())],
        _ => Vec::new(),
    }
}

fn is_in_collection(collection: &str, changed: &str) -> bool {
    split_document_path(changed)
        .map(|(parent, _)| parent == collection)
        .unwrap_or(false)
}

fn is_same_document(path: &str, changed: &str) -> bool {
    path == changed
}

fn checked_document_path(path: &str) -> Result<()> {
    if split_document_path(path).is_none() {
        return Err(AppError::Validation(format!(
            "invalid document path: {}",
            path
        )));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        checked_document_path(path)?;
        Ok(single_document(&*self.docs.read().await, path).pop())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(collection_documents(&*self.docs.read().await, collection))
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<()> {
        checked_document_path(path)?;
        self.docs.write().await.insert(path.to_string(), fields);
        self.announce(path);
        Ok(())
    }

    async fn update_document(&self, path: &str, fields: Fields) -> Result<()> {
        checked_document_path(path)?;
        {
            let mut docs = self.docs.write().await;
            let existing = docs
                .get_mut(path)
                .ok_or_else(|| AppError::NotFound(format!("document {}", path)))?;
            existing.extend(fields);
        }
        self.announce(path);
        Ok(())
    }

    async fn listen_collection(&self, collection: &str) -> Result<Subscription> {
        // Subscribe before reading so no write can slip between the two.
        let changes = self.changes.subscribe();
        let initial = self.list_documents(collection).await?;
        Ok(self.spawn_listener(
            changes,
            collection.to_string(),
            is_in_collection,
            collection_documents,
            initial,
        ))
    }

    async fn listen_document(&self, path: &str) -> Result<Subscription> {
        checked_document_path(path)?;
        let changes = self.changes.subscribe();
        let initial = single_document(&*self.docs.read().await, path);
        Ok(self.spawn_listener(
            changes,
            path.to_string(),
            is_same_document,
            single_document,
            initial,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::store::FieldValue;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_set_get_and_list() {
        let store = InMemoryStore::new();
        store
            .set_document("users/u1/devices/b", fields! { "name" => "Oven" })
            .await
            .unwrap();
        store
            .set_document("users/u1/devices/a", fields! { "name" => "Fridge" })
            .await
            .unwrap();
        store
            .set_document("users/u1/devices/a/history/x", fields! { "n" => 1_i64 })
            .await
            .unwrap();

        let doc = store.get_document("users/u1/devices/a").await.unwrap().unwrap();
        assert_eq!(doc.id, "a");

        let listed = store.list_documents("users/u1/devices").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = InMemoryStore::new();
        let missing = store
            .update_document("users/u1", fields! { "name" => "X" })
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        store
            .set_document("users/u1", fields! { "name" => "A", "rate" => 0.3 })
            .await
            .unwrap();
        store
            .update_document("users/u1", fields! { "name" => "B" })
            .await
            .unwrap();

        let doc = store.get_document("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&FieldValue::Text("B".into())));
        assert_eq!(doc.get("rate"), Some(&FieldValue::Double(0.3)));
    }

    #[tokio::test]
    async fn test_collection_listener_sees_initial_and_changes() {
        let store = InMemoryStore::new();
        store
            .set_document("users/u1/devices/a", fields! { "name" => "Fridge" })
            .await
            .unwrap();

        let mut sub = store.listen_collection("users/u1/devices").await.unwrap();
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.documents.len(), 1);

        // Writes elsewhere are ignored.
        store
            .set_document("users/u1/insights/i1", fields! { "source" => "x" })
            .await
            .unwrap();
        store
            .set_document("users/u1/devices/b", fields! { "name" => "Oven" })
            .await
            .unwrap();

        let second = timeout(Duration::from_secs(1), sub.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_document_listener_starts_empty_for_missing_document() {
        let store = InMemoryStore::new();
        let mut sub = store.listen_document("users/u1/devices/a").await.unwrap();

        let first = sub.next().await.unwrap().unwrap();
        assert!(first.documents.is_empty());

        store
            .set_document("users/u1/devices/a", fields! { "name" => "Fridge" })
            .await
            .unwrap();
        let second = timeout(Duration::from_secs(1), sub.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.documents[0].id, "a");
    }

    #[tokio::test]
    async fn test_dropping_subscription_detaches_listener() {
        let store = InMemoryStore::new();
        let sub = store.listen_collection("users/u1/devices").await.unwrap();
        assert_eq!(store.listener_count(), 1);

        drop(sub);
        // The aborted task releases its receiver on the next scheduler turn.
        for _ in 0..50 {
            if store.listener_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.listener_count(), 0);
    }
}
