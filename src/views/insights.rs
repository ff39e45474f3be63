use super::{report, AppContext};
use crate::error::Result;
use crate::models::Insight;
use crate::notify::NotificationDispatcher;
use crate::repositories::InsightRepository;
use crate::store::{paths, Snapshot, Subscription};
use chrono::{FixedOffset, Local};
use std::collections::BTreeMap;

/// Suggestion feed grouped by day.
///
/// Days follow the device's UTC offset at construction; use
/// [`with_utc_offset`](Self::with_utc_offset) to group for another zone.
pub struct InsightsScreen {
    ctx: AppContext,
    dispatcher: NotificationDispatcher,
    /// Newest first
    pub insights: Vec<Insight>,
    /// Keyed by `yyyy-MM-dd`
    pub grouped: BTreeMap<String, Vec<Insight>>,
    pub selected_date: Option<String>,
    pub error_message: Option<String>,
    utc_offset: FixedOffset,
    subscription: Option<Subscription>,
}

impl InsightsScreen {
    pub fn new(ctx: AppContext) -> Self {
        let dispatcher = ctx.dispatcher();
        Self {
            ctx,
            dispatcher,
            insights: Vec::new(),
            grouped: BTreeMap::new(),
            selected_date: None,
            error_message: None,
            utc_offset: *Local::now().offset(),
            subscription: None,
        }
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Start following the feed, replacing any earlier listener.
    pub async fn open(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("insights open") else {
            return Ok(());
        };
        self.subscription = None;

        match InsightRepository::listen(self.ctx.store(), &uid).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching AI suggestions", &e);
                Err(e)
            }
        }
    }

    /// Wait for the next feed snapshot and apply it. `None` once the feed
    /// is closed or was never opened.
    pub async fn next_update(&mut self) -> Option<Result<()>> {
        let result = self.subscription.as_mut()?.next().await?;
        Some(match result {
            Ok(snapshot) => {
                self.apply_snapshot(&snapshot).await;
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching AI suggestions", &e);
                self.subscription = None;
                Err(e)
            }
        })
    }

    pub async fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let insights = InsightRepository::from_snapshot(snapshot);
        self.dispatcher
            .insights_loaded(insights.first().map(|i| i.timestamp))
            .await;

        let mut grouped: BTreeMap<String, Vec<Insight>> = BTreeMap::new();
        for insight in &insights {
            grouped
                .entry(paths::day_id(insight.day_in(&self.utc_offset)))
                .or_default()
                .push(insight.clone());
        }
        self.selected_date = grouped.keys().next_back().cloned();
        self.grouped = grouped;
        self.insights = insights;
    }

    pub fn select_date(&mut self, date: &str) {
        self.selected_date = Some(date.to_string());
    }

    pub fn selected_insights(&self) -> &[Insight] {
        self.selected_date
            .as_ref()
            .and_then(|d| self.grouped.get(d))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn close(&mut self) {
        self.subscription = None;
    }
}
