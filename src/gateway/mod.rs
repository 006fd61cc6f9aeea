//! Remote data gateway boundary.
//!
//! The portal owns no durable state: every collection lives on a hosted
//! relational platform reached through this generic query/insert/update/
//! delete surface, plus a change-notification feed and a blob upload
//! endpoint. [`MemoryGateway`] is the in-process reference implementation
//! used by tests and local demos.

mod memory;

pub use memory::MemoryGateway;

use crate::error::{PortalError, Result};
use crate::realtime::RealtimeHandle;
use crate::types::{Row, RowId, StoredFile};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Sort direction for a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering column and direction.
#[derive(Clone, Debug)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Row filter applied server-side.
#[derive(Clone, Debug)]
pub enum Filter {
    /// Column equals value.
    Eq { column: String, value: Value },
    /// Column value is one of the given values.
    Within { column: String, values: Vec<Value> },
}

/// Options for a collection query.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
    pub filters: Vec<Filter>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order by `column`, newest first (the platform default direction).
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction: Direction::Descending,
        });
        self
    }

    /// Order by `column`, oldest first.
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn within(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::Within {
            column: column.to_string(),
            values,
        });
        self
    }
}

/// Kind of a pushed change event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One pushed change. The payload is largely advisory: handlers usually
/// re-fetch the authoritative list rather than merging the delta.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub collection: String,
    pub kind: ChangeKind,
    /// Row after the change (insert/update).
    pub new: Option<Row>,
    /// Row before the change (update/delete).
    pub old: Option<Row>,
}

impl ChangeEvent {
    /// The row carried by this event, whichever side is present.
    pub fn record(&self) -> Option<&Row> {
        self.new.as_ref().or(self.old.as_ref())
    }
}

/// Handler invoked with queued change events.
pub type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Generic CRUD, realtime and upload surface of the remote data platform.
pub trait Gateway: Send + Sync {
    /// Fetch rows from `collection` under `options`.
    fn query(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Row>>;

    /// Insert a row; the returned row carries the server-assigned id.
    fn insert(&self, collection: &str, payload: Row) -> Result<Row>;

    /// Apply a partial payload to the row with `id`, returning the result.
    fn update(&self, collection: &str, id: RowId, payload: Row) -> Result<Row>;

    /// Delete the row with `id`.
    fn delete(&self, collection: &str, id: RowId) -> Result<()>;

    /// Establish a push channel for `collection`. Queued events reach
    /// `handler` on the next [`Gateway::deliver_pending`] call; dropping the
    /// handle detaches the channel.
    fn subscribe(&self, collection: &str, handler: ChangeHandler) -> RealtimeHandle;

    /// Drain queued change events into their handlers.
    fn deliver_pending(&self);

    /// Store binary content at `path`, returning its public address.
    fn upload(&self, path: &str, content: &[u8]) -> Result<StoredFile>;
}

/// Serialize a payload struct into a row.
pub fn to_row<T: Serialize>(payload: &T) -> Result<Row> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(PortalError::Decode(format!(
            "expected an object payload, got {other}"
        ))),
    }
}

/// Decode one row into a typed record.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Decode a result set into typed records.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

/// Read the server-assigned id column of a row.
pub fn row_id(row: &Row) -> Option<RowId> {
    row.get("id").and_then(Value::as_u64).map(RowId)
}
