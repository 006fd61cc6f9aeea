//! Plannings page: team events, absences and resources, with client-side
//! team and date-range filtering.

use super::{fetch_list, list_or_empty};
use crate::error::Result;
use crate::gateway::{to_row, ChangeEvent, Gateway, QueryOptions};
use crate::realtime::RealtimeHandle;
use crate::types::{Absence, AbsenceInput, PlanningEvent, PlanningInput, ResourceItem, Timestamp};
use crate::ui::{Notifier, ToastLevel};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lists rendered by the plannings page.
#[derive(Clone, Debug, Default)]
pub struct PlanningData {
    pub events: Vec<PlanningEvent>,
    pub absences: Vec<Absence>,
    pub resources: Vec<ResourceItem>,
}

/// Client-side filters applied over the loaded lists.
#[derive(Clone, Debug, Default)]
pub struct PlanningFilters {
    /// Only events/absences for this team, when set.
    pub team: Option<String>,
    /// Inclusive start of the visible date range.
    pub start: Option<Timestamp>,
    /// Inclusive end of the visible date range.
    pub end: Option<Timestamp>,
}

#[derive(Clone)]
pub struct PlanningsPage {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    data: Arc<Mutex<PlanningData>>,
    filters: Arc<Mutex<PlanningFilters>>,
    subscriptions: Arc<Mutex<Vec<RealtimeHandle>>>,
    realtime_connected: Arc<AtomicBool>,
}

impl PlanningsPage {
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            data: Arc::new(Mutex::new(PlanningData::default())),
            filters: Arc::new(Mutex::new(PlanningFilters::default())),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            realtime_connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load all three lists. A partial failure renders the failed list empty
    /// and raises one toast.
    pub fn load(&self) {
        let events = fetch_list(
            self.gateway.as_ref(),
            "plannings",
            &QueryOptions::new().order_asc("start_date"),
        );
        let absences = fetch_list(
            self.gateway.as_ref(),
            "absences",
            &QueryOptions::new().order_asc("start_date"),
        );
        let resources = fetch_list(
            self.gateway.as_ref(),
            "resources",
            &QueryOptions::new().order_asc("name"),
        );

        if events.is_err() || absences.is_err() || resources.is_err() {
            self.notifier
                .toast(ToastLevel::Danger, "Unable to load all planning data.");
        }

        let mut data = self.data.lock();
        data.events = list_or_empty("plannings", events);
        data.absences = list_or_empty("absences", absences);
        data.resources = list_or_empty("resources", resources);
    }

    pub fn data(&self) -> PlanningData {
        self.data.lock().clone()
    }

    pub fn filters(&self) -> PlanningFilters {
        self.filters.lock().clone()
    }

    pub fn set_team(&self, team: Option<&str>) {
        self.filters.lock().team = team.map(str::to_string);
    }

    pub fn set_range(&self, start: Option<Timestamp>, end: Option<Timestamp>) {
        let mut filters = self.filters.lock();
        filters.start = start;
        filters.end = end;
    }

    pub fn reset_filters(&self) {
        *self.filters.lock() = PlanningFilters::default();
    }

    /// Teams appearing in the loaded events and absences, sorted, deduped.
    pub fn team_options(&self) -> Vec<String> {
        let data = self.data.lock();
        let mut teams: Vec<String> = data
            .events
            .iter()
            .map(|event| event.team.clone())
            .chain(data.absences.iter().map(|absence| absence.team.clone()))
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }

    /// Events passing the current filters.
    pub fn filtered_events(&self) -> Vec<PlanningEvent> {
        let filters = self.filters();
        let data = self.data.lock();
        data.events
            .iter()
            .filter(|event| {
                if let Some(team) = &filters.team {
                    if &event.team != team {
                        return false;
                    }
                }
                if let Some(start) = filters.start {
                    if event.start_date < start {
                        return false;
                    }
                }
                if let Some(end) = filters.end {
                    if event.start_date > end {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    pub fn add_event(&self, input: PlanningInput) -> Result<()> {
        self.gateway.insert("plannings", to_row(&input)?)?;
        self.notifier.toast(ToastLevel::Success, "Event planned");
        self.reload_events();
        Ok(())
    }

    pub fn add_absence(&self, input: AbsenceInput) -> Result<()> {
        self.gateway.insert("absences", to_row(&input)?)?;
        self.notifier.toast(ToastLevel::Success, "Absence recorded");
        self.reload_absences();
        Ok(())
    }

    fn reload_events(&self) {
        let events = fetch_list(
            self.gateway.as_ref(),
            "plannings",
            &QueryOptions::new().order_asc("start_date"),
        );
        self.data.lock().events = list_or_empty("plannings", events);
    }

    fn reload_absences(&self) {
        let absences = fetch_list(
            self.gateway.as_ref(),
            "absences",
            &QueryOptions::new().order_asc("start_date"),
        );
        self.data.lock().absences = list_or_empty("absences", absences);
    }

    fn reload_resources(&self) {
        let resources = fetch_list(
            self.gateway.as_ref(),
            "resources",
            &QueryOptions::new().order_asc("name"),
        );
        self.data.lock().resources = list_or_empty("resources", resources);
    }

    /// Re-pull each list when its collection changes. Idempotent.
    pub fn connect_realtime(&self) {
        if self.realtime_connected.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut handles = Vec::new();

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "plannings",
            Arc::new(move |_: &ChangeEvent| page.reload_events()),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "absences",
            Arc::new(move |_: &ChangeEvent| page.reload_absences()),
        ));

        let page = self.clone();
        handles.push(self.gateway.subscribe(
            "resources",
            Arc::new(move |_: &ChangeEvent| page.reload_resources()),
        ));

        *self.subscriptions.lock() = handles;
    }

    pub fn disconnect(&self) {
        self.subscriptions.lock().clear();
        self.realtime_connected.store(false, Ordering::SeqCst);
    }
}
