#![allow(dead_code)]

use chrono::NaiveDate;
use home_energy_client::auth::InMemoryAuth;
use home_energy_client::notify::ChannelNotifier;
use home_energy_client::preferences::NotificationPreferences;
use home_energy_client::seed::Seed;
use home_energy_client::store::memory::InMemoryStore;
use home_energy_client::{AppContext, AuthGateway, DocumentStore, Notification};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const EMAIL: &str = "sam@example.com";
pub const PASSWORD: &str = "secret1";

pub const FIXTURE: &str = r#"
accounts:
  - uid: u1
    email: sam@example.com
    password: secret1
    verified: true
  - uid: u2
    email: pending@example.com
    password: secret2
    verified: false
documents:
  users/u1:
    name: Sam
    email: sam@example.com
    rate: 0.3
    totalBillAmount: 42.5
  users/u1/devices/fridge:
    name: Fridge
    category: Kitchen
  users/u1/devices/heater:
    name: Heater
  "users/u1/energy_data/{today}/devices/fridge":
    isOn: true
    usageTime: 30
    consumption: 1.5
    cost: 0.45
  "users/u1/energy_data/{today}/devices/heater":
    isOn: false
    usageTime: 10
  users/u1/energy_data/2025-03-03:
    total_consumption: 10.0
    total_cost: 3.0
  users/u1/energy_data/2025-03-09:
    total_consumption: 5.0
    total_cost: 1.5
  users/u1/energy_data/2025-03-10:
    total_consumption: 8.0
    total_cost: 2.4
  users/u1/energy_data/2025-04-01:
    total_consumption: 7.0
    total_cost: 2.1
  users/u1/energy_data/2025-03-10/hourly_data/08:
    consumption: 0.5
    cost: 0.15
  users/u1/predictions/2025-03-11:
    total_prediction: 9.0
    predicted_cost: 2.7
  users/u1/predictions/2025-03-17:
    total_prediction: 6.0
    predicted_cost: 1.8
  users/u1/predictions/2025-03-11/hourly_prediction/08:
    prediction: 0.4
    predicted_cost: 0.12
"#;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// A seeded in-memory backend wired into an app context.
pub struct Harness {
    pub auth: Arc<InMemoryAuth>,
    pub store: Arc<InMemoryStore>,
    pub ctx: AppContext,
    pub notifications: mpsc::Receiver<Notification>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_preferences(NotificationPreferences::default()).await
    }

    pub async fn with_preferences(prefs: NotificationPreferences) -> Self {
        Self::build(prefs, |store| store as Arc<dyn DocumentStore>).await
    }

    /// Like [`Harness::new`], but the app sees the seeded store through
    /// `wrap`. `store` stays the unwrapped backend.
    pub async fn wrapping_store<F>(wrap: F) -> Self
    where
        F: FnOnce(Arc<InMemoryStore>) -> Arc<dyn DocumentStore>,
    {
        Self::build(NotificationPreferences::default(), wrap).await
    }

    async fn build<F>(prefs: NotificationPreferences, wrap: F) -> Self
    where
        F: FnOnce(Arc<InMemoryStore>) -> Arc<dyn DocumentStore>,
    {
        let auth = Arc::new(InMemoryAuth::new());
        let store = Arc::new(InMemoryStore::new());
        Seed::from_yaml(FIXTURE)
            .unwrap()
            .apply(&auth, &store, today())
            .await
            .unwrap();

        let (notifier, notifications) = ChannelNotifier::new(16);
        let ctx = AppContext::new(auth.clone(), wrap(store.clone()), Arc::new(notifier), prefs);
        Self {
            auth,
            store,
            ctx,
            notifications,
        }
    }

    pub async fn signed_in() -> Self {
        let harness = Self::new().await;
        harness.auth.sign_in(EMAIL, PASSWORD).await.unwrap();
        harness
    }

    /// Next notification, or `None` if nothing arrives shortly.
    pub async fn next_notification(&mut self) -> Option<Notification> {
        tokio::time::timeout(Duration::from_millis(500), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }

    /// True when no notification arrives within a short grace period.
    pub async fn quiet(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(150), self.notifications.recv())
            .await
            .is_err()
    }
}

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "home-energy-{}-{}-{}",
        name,
        std::process::id(),
        uuid::Uuid::new_v4().simple()
    ))
}
