//! Admin page: manage news, documents, plannings and resources, and review
//! today's time-clock activity. Every operation sits behind the admin gate.

use super::{fetch_list, list_or_empty};
use crate::config::PortalConfig;
use crate::error::Result;
use crate::gateway::{to_row, Gateway, QueryOptions};
use crate::session::AdminGate;
use crate::types::{
    DocumentInput, DocumentLink, NewsInput, NewsItem, PlanningEvent, ResourceInput, ResourceItem,
    RowId, TimeEntry, Timestamp,
};
use crate::ui::{Notifier, ToastLevel};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

/// Headline counters for the admin landing section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub news: usize,
    pub documents: usize,
    pub plannings: usize,
    pub clocked_today: usize,
}

/// Everything the admin page renders in one load.
#[derive(Clone, Debug, Default)]
pub struct AdminOverview {
    pub news: Vec<NewsItem>,
    pub documents: Vec<DocumentLink>,
    pub plannings: Vec<PlanningEvent>,
    pub resources: Vec<ResourceItem>,
    pub todays_entries: Vec<TimeEntry>,
    pub stats: AdminStats,
}

pub struct AdminPage {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    gate: AdminGate,
    config: Arc<PortalConfig>,
}

impl AdminPage {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        gate: AdminGate,
        config: PortalConfig,
    ) -> Self {
        Self {
            gateway,
            notifier,
            gate,
            config: Arc::new(config),
        }
    }

    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    fn table<T: DeserializeOwned>(&self, collection: &str, options: &QueryOptions) -> Vec<T> {
        list_or_empty(
            collection,
            fetch_list(self.gateway.as_ref(), collection, options),
        )
    }

    /// Load the full overview. Requires an unlocked admin session; a section
    /// that fails to fetch renders empty.
    pub fn load(&self) -> Result<AdminOverview> {
        self.gate.require()?;

        let news = self.table("news", &QueryOptions::new().order_desc("published_at"));
        let documents = self.table("documents", &QueryOptions::new().order_desc("updated_at"));
        let plannings = self.table("plannings", &QueryOptions::new().order_desc("start_date"));
        let resources = self.table("resources", &QueryOptions::new().order_asc("name"));
        let entries: Vec<TimeEntry> = self.table(
            "time_entries",
            &QueryOptions::new()
                .order_desc("timestamp")
                .limit(self.config.clock_history_limit),
        );

        let midnight = Timestamp::now().start_of_day();
        let todays_entries: Vec<TimeEntry> = entries
            .into_iter()
            .filter(|entry| entry.timestamp >= midnight)
            .collect();

        let stats = AdminStats {
            news: news.len(),
            documents: documents.len(),
            plannings: plannings.len(),
            clocked_today: todays_entries.len(),
        };
        Ok(AdminOverview {
            news,
            documents,
            plannings,
            resources,
            todays_entries,
            stats,
        })
    }

    pub fn add_news(&self, mut input: NewsInput) -> Result<()> {
        self.gate.require()?;
        if input.published_at.is_none() {
            input.published_at = Some(Timestamp::now());
        }
        self.gateway.insert("news", to_row(&input)?)?;
        self.notifier.toast(ToastLevel::Success, "News item published");
        Ok(())
    }

    pub fn add_document(&self, input: DocumentInput) -> Result<()> {
        self.gate.require()?;
        let mut row = to_row(&input)?;
        row.insert("updated_at".to_string(), json!(Timestamp::now()));
        self.gateway.insert("documents", row)?;
        self.notifier.toast(ToastLevel::Success, "Document added");
        Ok(())
    }

    pub fn add_resource(&self, input: ResourceInput) -> Result<()> {
        self.gate.require()?;
        self.gateway.insert("resources", to_row(&input)?)?;
        self.notifier.toast(ToastLevel::Success, "Resource added");
        Ok(())
    }

    /// Delete one row from any managed collection.
    pub fn delete_item(&self, collection: &str, id: RowId) -> Result<()> {
        self.gate.require()?;
        if let Err(error) = self.gateway.delete(collection, id) {
            tracing::error!(collection, %id, %error, "delete failed");
            self.notifier
                .toast(ToastLevel::Danger, "Unable to delete this item.");
            return Err(error);
        }
        self.notifier.toast(ToastLevel::Success, "Item deleted");
        Ok(())
    }

    /// Lock the admin session again.
    pub fn close_session(&self) {
        self.gate.clear();
        self.notifier.toast(ToastLevel::Info, "Admin session closed");
    }
}
