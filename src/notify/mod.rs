//! Local notifications raised when watched data changes.

pub mod dispatcher;

pub use dispatcher::{NotificationDispatcher, PowerTransition};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Appliance,
    Insight,
    Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Where notifications are shown.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            kind = ?notification.kind,
            id = %notification.id,
            "{}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Forwards notifications to a receiver, e.g. a UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .await
            .map_err(|_| AppError::Backend("notification receiver closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        let sent = Notification::new(NotificationKind::Insight, "t", "b");

        notifier.deliver(&sent).await.unwrap();
        assert_eq!(rx.recv().await, Some(sent));
    }

    #[tokio::test]
    async fn test_channel_notifier_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new(1);
        drop(rx);

        let result = notifier
            .deliver(&Notification::new(NotificationKind::Prediction, "t", "b"))
            .await;
        assert!(matches!(result, Err(AppError::Backend(_))));
    }

    #[tokio::test]
    async fn test_log_notifier_accepts() {
        let n = Notification::new(NotificationKind::Appliance, "t", "b");
        tokio_test::assert_ok!(LogNotifier.deliver(&n).await);
    }
}
