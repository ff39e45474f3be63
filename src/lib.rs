pub mod aggregation;
pub mod auth;
pub mod config;
pub mod error;
pub mod live;
pub mod models;
pub mod notify;
pub mod preferences;
pub mod repositories;
pub mod seed;
pub mod store;
pub mod views;

// Re-export commonly used items
pub use auth::{AuthGateway, AuthUser};
pub use config::Config;
pub use error::{AppError, AuthError, Result};
pub use live::{DashboardState, DeviceBoard, LiveDashboard};
pub use notify::{Notification, NotificationDispatcher, Notifier};
pub use store::{Document, DocumentStore, FieldValue, Fields, Snapshot, Subscription};
pub use views::AppContext;
