//! Announcement board page: full announcement list with text search and tag
//! filtering. Deletion is admin-gated.

use super::fetch_list;
use crate::error::Result;
use crate::gateway::{to_row, Gateway, QueryOptions};
use crate::session::AdminGate;
use crate::types::{Announcement, AnnouncementInput, RowId};
use crate::ui::{Notifier, ToastLevel};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct BoardPage {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    gate: AdminGate,
    announcements: Arc<Mutex<Vec<Announcement>>>,
    search: Arc<Mutex<String>>,
    tag: Arc<Mutex<Option<String>>>,
}

impl BoardPage {
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>, gate: AdminGate) -> Self {
        Self {
            gateway,
            notifier,
            gate,
            announcements: Arc::new(Mutex::new(Vec::new())),
            search: Arc::new(Mutex::new(String::new())),
            tag: Arc::new(Mutex::new(None)),
        }
    }

    pub fn load(&self) {
        let options = QueryOptions::new().order_desc("created_at");
        match fetch_list::<Announcement>(self.gateway.as_ref(), "announcements", &options) {
            Ok(list) => *self.announcements.lock() = list,
            Err(error) => {
                tracing::error!(%error, "announcements fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load announcements.");
            }
        }
    }

    pub fn set_search(&self, query: &str) {
        *self.search.lock() = query.to_string();
    }

    pub fn set_tag(&self, tag: Option<&str>) {
        *self.tag.lock() = tag.map(str::to_string);
    }

    /// All tags appearing across the loaded announcements, sorted, deduped.
    pub fn tag_options(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .announcements
            .lock()
            .iter()
            .filter_map(|announcement| announcement.tags.as_deref())
            .flat_map(|tags| tags.split(','))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Announcements passing the current search text and tag filter.
    pub fn visible(&self) -> Vec<Announcement> {
        let query = self.search.lock().to_lowercase();
        let tag = self.tag.lock().clone();
        self.announcements
            .lock()
            .iter()
            .filter(|announcement| {
                if !query.is_empty() {
                    let haystack = format!(
                        "{} {} {} {}",
                        announcement.title.as_deref().unwrap_or(""),
                        announcement.message,
                        announcement.author.as_deref().unwrap_or(""),
                        announcement.tags.as_deref().unwrap_or(""),
                    )
                    .to_lowercase();
                    if !haystack.contains(&query) {
                        return false;
                    }
                }
                if let Some(tag) = &tag {
                    let tagged = announcement
                        .tags
                        .as_deref()
                        .unwrap_or("")
                        .split(',')
                        .any(|candidate| candidate.trim() == tag);
                    if !tagged {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    pub fn post(&self, input: AnnouncementInput) -> Result<()> {
        self.gateway.insert("announcements", to_row(&input)?)?;
        self.notifier
            .toast(ToastLevel::Success, "Announcement published");
        self.load();
        Ok(())
    }

    /// Delete an announcement. Admin only.
    pub fn delete(&self, id: RowId) -> Result<()> {
        self.gate.require()?;
        if let Err(error) = self.gateway.delete("announcements", id) {
            tracing::error!(%id, %error, "announcement delete failed");
            self.notifier
                .toast(ToastLevel::Danger, "Unable to delete this announcement.");
            return Err(error);
        }
        self.notifier.toast(ToastLevel::Success, "Announcement deleted");
        self.load();
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.gate.is_admin()
    }
}
