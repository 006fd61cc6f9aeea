//! # Intranet Portal
//!
//! Page controllers and state plumbing for a small company intranet: news,
//! announcements, shared documents, reservations, tasks, team chat,
//! comments, plannings, time clock and an admin area, all backed by a hosted
//! relational platform reached through the [`Gateway`] trait.
//!
//! ## Core Concepts
//!
//! - **Store**: a keyed observable state container. Sections subscribe to
//!   the keys they render; updates commit first, then notify, with per-key
//!   change detection so redundant assignments stay silent.
//! - **Gateway**: the generic query/insert/update/delete, realtime and
//!   upload surface of the data platform. [`MemoryGateway`] is the
//!   in-process implementation used by tests and demos.
//! - **Realtime**: pushed change events buffered per subscription and
//!   delivered between other work via [`Gateway::deliver_pending`].
//!   Handlers re-pull the affected section; chat appends in place.
//! - **Pages**: one controller per page ([`DashboardPage`], [`AdminPage`],
//!   [`PlanningsPage`], [`TimeClockPage`], [`BoardPage`]) owning its loads,
//!   actions and realtime wiring.
//!
//! ## Example
//!
//! ```ignore
//! use intranet_portal::{
//!     DashboardPage, MemoryGateway, MemorySession, PortalConfig, RecordingNotifier,
//! };
//! use std::sync::Arc;
//!
//! let gateway = Arc::new(MemoryGateway::new());
//! let page = DashboardPage::new(
//!     gateway.clone(),
//!     Arc::new(RecordingNotifier::new()),
//!     Arc::new(MemorySession::new()),
//!     PortalConfig::default(),
//! );
//! page.load();
//! page.connect_realtime();
//! // ... later, after pushes arrive:
//! gateway.deliver_pending();
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod pages;
pub mod realtime;
pub mod session;
pub mod state;
pub mod types;
pub mod ui;

pub use config::PortalConfig;
pub use error::{PortalError, Result};
pub use gateway::{
    from_row, from_rows, row_id, to_row, ChangeEvent, ChangeHandler, ChangeKind, Direction,
    Filter, Gateway, MemoryGateway, OrderBy, QueryOptions,
};
pub use pages::{
    keys, AdminOverview, AdminPage, AdminStats, BoardPage, DashboardPage, PlanningData,
    PlanningFilters, PlanningsPage, TimeClockPage,
};
pub use realtime::{ChangeFeed, FeedId, RealtimeHandle};
pub use session::{AdminGate, MemorySession, SessionStorage, ADMIN_SESSION_KEY};
pub use state::{
    FetchTicket, QuerySlot, RowMap, Rows, StateMap, StateValue, Store, Subscriber, Subscription,
};
pub use types::*;
pub use ui::{
    submit_form, FormFields, LogNotifier, Notifier, RecordingNotifier, ToastLevel,
};
