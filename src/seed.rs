//! YAML fixture for the in-memory backend.
//!
//! ```yaml
//! accounts:
//!   - uid: demo
//!     email: demo@example.com
//!     password: demo123
//!     verified: true
//! documents:
//!   users/demo:
//!     name: Demo
//!   users/demo/energy_data/{today}/devices/fridge:
//!     isOn: true
//! ```
//!
//! `{today}` in a document path is replaced with the current day id.

use crate::auth::InMemoryAuth;
use crate::error::Result;
use crate::store::memory::InMemoryStore;
use crate::store::{paths, DocumentStore, FieldValue, Fields};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const TODAY: &str = "{today}";

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    #[serde(default)]
    pub uid: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    #[serde(default)]
    pub documents: BTreeMap<String, Map<String, Value>>,
}

impl Seed {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Register the accounts and write the documents.
    pub async fn apply(&self, auth: &InMemoryAuth, store: &InMemoryStore, today: NaiveDate) -> Result<()> {
        for account in &self.accounts {
            auth.add_account(
                account.uid.as_deref(),
                &account.email,
                &account.password,
                account.verified,
            )?;
        }

        let day = paths::day_id(today);
        for (path, raw) in &self.documents {
            let path = path.replace(TODAY, &day);
            let fields: Fields = raw
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect();
            store.set_document(&path, fields).await?;
        }

        info!(
            "Seeded {} accounts and {} documents",
            self.accounts.len(),
            self.documents.len()
        );
        Ok(())
    }
}
