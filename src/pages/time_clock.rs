//! Time-clock page: record arrival/departure/break entries and show the
//! recent history, optionally filtered to one employee's email.

use super::fetch_list;
use crate::config::PortalConfig;
use crate::error::Result;
use crate::gateway::{to_row, ChangeEvent, Gateway, QueryOptions};
use crate::realtime::RealtimeHandle;
use crate::types::{ClockInput, ClockKind, TimeEntry, Timestamp};
use crate::ui::{Notifier, ToastLevel};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct TimeClockPage {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    config: Arc<PortalConfig>,
    entries: Arc<Mutex<Vec<TimeEntry>>>,
    email_filter: Arc<Mutex<Option<String>>>,
    subscriptions: Arc<Mutex<Vec<RealtimeHandle>>>,
    realtime_connected: Arc<AtomicBool>,
}

impl TimeClockPage {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        config: PortalConfig,
    ) -> Self {
        Self {
            gateway,
            notifier,
            config: Arc::new(config),
            entries: Arc::new(Mutex::new(Vec::new())),
            email_filter: Arc::new(Mutex::new(None)),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            realtime_connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load the recent history, newest first, optionally scoped to one
    /// email. The filter sticks for later realtime re-pulls.
    pub fn load_history(&self, email: Option<&str>) {
        *self.email_filter.lock() = email.map(str::to_string);

        let mut options = QueryOptions::new()
            .order_desc("timestamp")
            .limit(self.config.clock_history_limit);
        if let Some(email) = email {
            options = options.eq("email", email);
        }
        match fetch_list::<TimeEntry>(self.gateway.as_ref(), "time_entries", &options) {
            Ok(entries) => *self.entries.lock() = entries,
            Err(error) => {
                tracing::error!(%error, "clock history fetch failed");
                self.notifier
                    .toast(ToastLevel::Danger, "Unable to load the clock history.");
            }
        }
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        self.entries.lock().clone()
    }

    pub fn email_filter(&self) -> Option<String> {
        self.email_filter.lock().clone()
    }

    /// Count of today's loaded entries per entry kind.
    pub fn todays_stats(&self) -> HashMap<ClockKind, usize> {
        let midnight = Timestamp::now().start_of_day();
        let mut stats = HashMap::new();
        for entry in self.entries.lock().iter() {
            if entry.timestamp >= midnight {
                *stats.entry(entry.kind).or_insert(0) += 1;
            }
        }
        stats
    }

    /// Record one clock entry, stamped now, then reload scoped to that
    /// employee.
    pub fn clock(&self, input: ClockInput) -> Result<()> {
        let mut row = to_row(&input)?;
        row.insert("timestamp".to_string(), json!(Timestamp::now()));
        self.gateway.insert("time_entries", row)?;
        self.notifier
            .toast(ToastLevel::Success, "Clock entry recorded");
        self.load_history(Some(&input.email));
        Ok(())
    }

    /// Re-pull the history on pushed entries, keeping the current filter.
    /// Idempotent.
    pub fn connect_realtime(&self) {
        if self.realtime_connected.swap(true, Ordering::SeqCst) {
            return;
        }
        let page = self.clone();
        let handle = self.gateway.subscribe(
            "time_entries",
            Arc::new(move |_: &ChangeEvent| {
                let filter = page.email_filter();
                page.load_history(filter.as_deref());
            }),
        );
        self.subscriptions.lock().push(handle);
    }

    pub fn disconnect(&self) {
        self.subscriptions.lock().clear();
        self.realtime_connected.store(false, Ordering::SeqCst);
    }
}
