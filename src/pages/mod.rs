//! Page controllers.
//!
//! Each page owns its data loading, realtime wiring, and user actions. The
//! dashboard routes its data through the shared state store; the smaller
//! pages hold their lists directly. All of them follow the same lifecycle:
//! `load` for the first paint, `connect_realtime` to re-pull on pushed
//! changes, `disconnect` on teardown.

mod admin;
mod board;
mod dashboard;
mod plannings;
mod time_clock;

pub use admin::{AdminOverview, AdminPage, AdminStats};
pub use board::BoardPage;
pub use dashboard::{keys, DashboardPage};
pub use plannings::{PlanningData, PlanningFilters, PlanningsPage};
pub use time_clock::TimeClockPage;

use crate::error::Result;
use crate::gateway::{from_rows, Gateway, QueryOptions};
use serde::de::DeserializeOwned;

/// Query a collection and decode it into typed records.
pub(crate) fn fetch_list<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    collection: &str,
    options: &QueryOptions,
) -> Result<Vec<T>> {
    from_rows(gateway.query(collection, options)?)
}

/// Unwrap a section fetch, logging a failure and rendering it empty rather
/// than taking the whole page down.
pub(crate) fn list_or_empty<T>(collection: &str, result: Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(error) => {
            tracing::error!(collection, %error, "section fetch failed");
            Vec::new()
        }
    }
}
