use super::{split_document_path, Document, DocumentStore, FieldValue, Fields, Snapshot, Subscription};
use crate::auth::AuthGateway;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

const DEFAULT_HOST: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Hosted document database over its REST API.
///
/// The REST API has no streaming listener, so listeners poll at a fixed
/// interval and emit a snapshot only when the contents changed.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    documents_url: String,
    auth: Arc<dyn AuthGateway>,
    poll_interval: Duration,
}

impl RestStore {
    pub fn new(project_id: &str, auth: Arc<dyn AuthGateway>, poll_interval: Duration) -> Self {
        Self::with_host(DEFAULT_HOST, project_id, auth, poll_interval)
    }

    pub fn with_host(
        host: &str,
        project_id: &str,
        auth: Arc<dyn AuthGateway>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                host.trim_end_matches('/'),
                project_id
            ),
            auth,
            poll_interval,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.documents_url, path);
        let builder = self.client.request(method, url);
        match self.auth.current_user().and_then(|u| u.id_token) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn spawn_poller(&self, path: String, single: bool) -> Subscription {
        let store = self.clone();
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            let mut ticker = interval(store.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Document>> = None;

            loop {
                ticker.tick().await;

                let fetched = if single {
                    store
                        .get_document(&path)
                        .await
                        .map(|doc| doc.into_iter().collect::<Vec<_>>())
                } else {
                    store.list_documents(&path).await
                };

                match fetched {
                    Ok(documents) => {
                        if last.as_ref() == Some(&documents) {
                            continue;
                        }
                        last = Some(documents.clone());
                        let snapshot = Snapshot {
                            path: path.clone(),
                            documents,
                        };
                        if tx.send(Ok(snapshot)).await.is_err() {
                            debug!("Listener on {} dropped", path);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Listener on {} failed: {}", path, e);
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Subscription::new(rx, task)
    }
}

async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("document {}", path)));
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    warn!("Document request on {} failed: {} {}", path, status, message);
    Err(AppError::Backend(format!("{}: {}", status, message)))
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = check_status(response, path).await?.json().await?;
        Ok(Some(decode_document(raw)))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .request(reqwest::Method::GET, collection)
                .query(&query)
                .send()
                .await?;
            let page: ListResponse = check_status(response, collection).await?.json().await?;
            documents.extend(page.documents.into_iter().map(decode_document));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<()> {
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .request(reqwest::Method::PATCH, path)
            .json(&body)
            .send()
            .await?;
        check_status(response, path).await?;
        Ok(())
    }

    async fn update_document(&self, path: &str, fields: Fields) -> Result<()> {
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", quote_field_path(key)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .request(reqwest::Method::PATCH, path)
            .query(&query)
            .json(&body)
            .send()
            .await?;
        check_status(response, path).await?;
        Ok(())
    }

    async fn listen_collection(&self, collection: &str) -> Result<Subscription> {
        Ok(self.spawn_poller(collection.to_string(), false))
    }

    async fn listen_document(&self, path: &str) -> Result<Subscription> {
        if split_document_path(path).is_none() {
            return Err(AppError::Validation(format!(
                "invalid document path: {}",
                path
            )));
        }
        Ok(self.spawn_poller(path.to_string(), true))
    }
}

/// Field names outside `[A-Za-z_][A-Za-z0-9_]*` must be backquoted in masks.
fn quote_field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn decode_document(raw: RawDocument) -> Document {
    let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
    Document::new(id, decode_fields(&raw.fields))
}

pub(crate) fn decode_fields(raw: &Map<String, Value>) -> Fields {
    raw.iter()
        .filter_map(|(key, value)| match decode_value(value) {
            Some(v) => Some((key.clone(), v)),
            None => {
                warn!("Skipping undecodable field {}: {}", key, value);
                None
            }
        })
        .collect()
}

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Decode one typed value, e.g. `{"integerValue": "42"}`.
pub(crate) fn decode_value(value: &Value) -> Option<FieldValue> {
    let (kind, inner) = value.as_object()?.iter().next()?;
    match kind.as_str() {
        "nullValue" => Some(FieldValue::Null),
        "booleanValue" => inner.as_bool().map(FieldValue::Bool),
        "integerValue" => match inner {
            Value::String(s) => s.parse().ok().map(FieldValue::Integer),
            other => other.as_i64().map(FieldValue::Integer),
        },
        "doubleValue" => match inner {
            Value::String(s) => s.parse().ok().map(FieldValue::Double),
            other => other.as_f64().map(FieldValue::Double),
        },
        "stringValue" | "referenceValue" | "bytesValue" => {
            inner.as_str().map(|s| FieldValue::Text(s.to_string()))
        }
        "timestampValue" => inner
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc))),
        "geoPointValue" => {
            let mut point = Fields::new();
            for axis in ["latitude", "longitude"] {
                point.insert(
                    axis.to_string(),
                    FieldValue::Double(inner[axis].as_f64().unwrap_or_default()),
                );
            }
            Some(FieldValue::Map(point))
        }
        "arrayValue" => {
            let values = inner["values"].as_array().cloned().unwrap_or_default();
            Some(FieldValue::Array(
                values.iter().filter_map(decode_value).collect(),
            ))
        }
        "mapValue" => {
            let fields = inner["fields"].as_object().cloned().unwrap_or_default();
            Some(FieldValue::Map(decode_fields(&fields)))
        }
        _ => None,
    }
}

pub(crate) fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::Text(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}
