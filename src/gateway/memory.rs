//! In-memory gateway used by tests and local demos.

use super::{
    row_id, ChangeEvent, ChangeHandler, ChangeKind, Filter, Gateway, QueryOptions,
};
use crate::error::{PortalError, Result};
use crate::realtime::{ChangeFeed, RealtimeHandle};
use crate::types::{Row, RowId, StoredFile, Timestamp};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Gateway backed by in-process tables, with the same observable behavior as
/// the hosted platform: server-assigned ids, created_at stamping, filtered
/// and ordered queries, change broadcast on every mutation, and fault
/// injection for exercising error paths.
pub struct MemoryGateway {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    files: RwLock<HashMap<String, Vec<u8>>>,
    feed: Arc<ChangeFeed>,
    next_id: AtomicU64,
    failing: RwLock<HashSet<String>>,
    public_base: String,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_buffer(256)
    }

    /// Use a custom realtime buffer size.
    pub fn with_buffer(buffer_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(buffer_size),
            next_id: AtomicU64::new(0),
            failing: RwLock::new(HashSet::new()),
            public_base: "memory://".to_string(),
        }
    }

    /// Make every operation against `collection` fail until restored.
    pub fn fail_collection(&self, collection: &str) {
        self.failing.write().insert(collection.to_string());
    }

    pub fn restore_collection(&self, collection: &str) {
        self.failing.write().remove(collection);
    }

    /// Number of open realtime subscriptions.
    pub fn realtime_subscribers(&self) -> usize {
        self.feed.subscription_count()
    }

    /// Uploaded content at `path`, if any.
    pub fn stored_content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    fn check(&self, collection: &str) -> Result<()> {
        if self.failing.read().contains(collection) {
            Err(PortalError::Gateway(format!(
                "collection {collection} is unavailable"
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway for MemoryGateway {
    fn query(&self, collection: &str, options: &QueryOptions) -> Result<Vec<Row>> {
        self.check(collection)?;
        let mut rows: Vec<Row> = self
            .tables
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        rows.retain(|row| options.filters.iter().all(|filter| matches(row, filter)));
        if let Some(order) = &options.order {
            // Stable sort keeps insertion order among ties.
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    super::Direction::Ascending => ordering,
                    super::Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = options.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn insert(&self, collection: &str, payload: Row) -> Result<Row> {
        self.check(collection)?;
        let mut row = payload;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        row.insert("id".to_string(), json!(id));
        row.entry("created_at".to_string())
            .or_insert_with(|| json!(Timestamp::now()));

        self.tables
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());

        self.feed.broadcast(&ChangeEvent {
            collection: collection.to_string(),
            kind: ChangeKind::Insert,
            new: Some(row.clone()),
            old: None,
        });
        Ok(row)
    }

    fn update(&self, collection: &str, id: RowId, payload: Row) -> Result<Row> {
        self.check(collection)?;
        let (old, updated) = {
            let mut tables = self.tables.write();
            let rows = tables.entry(collection.to_string()).or_default();
            let row = rows
                .iter_mut()
                .find(|row| row_id(row) == Some(id))
                .ok_or_else(|| PortalError::RowNotFound {
                    collection: collection.to_string(),
                    id,
                })?;
            let old = row.clone();
            for (column, value) in payload {
                if column != "id" {
                    row.insert(column, value);
                }
            }
            (old, row.clone())
        };

        self.feed.broadcast(&ChangeEvent {
            collection: collection.to_string(),
            kind: ChangeKind::Update,
            new: Some(updated.clone()),
            old: Some(old),
        });
        Ok(updated)
    }

    fn delete(&self, collection: &str, id: RowId) -> Result<()> {
        self.check(collection)?;
        let old = {
            let mut tables = self.tables.write();
            let rows = tables.entry(collection.to_string()).or_default();
            let position = rows
                .iter()
                .position(|row| row_id(row) == Some(id))
                .ok_or_else(|| PortalError::RowNotFound {
                    collection: collection.to_string(),
                    id,
                })?;
            rows.remove(position)
        };

        self.feed.broadcast(&ChangeEvent {
            collection: collection.to_string(),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(old),
        });
        Ok(())
    }

    fn subscribe(&self, collection: &str, handler: ChangeHandler) -> RealtimeHandle {
        self.feed.subscribe(collection, handler)
    }

    fn deliver_pending(&self) {
        self.feed.pump();
    }

    fn upload(&self, path: &str, content: &[u8]) -> Result<StoredFile> {
        if path.is_empty() {
            return Err(PortalError::Upload("empty destination path".to_string()));
        }
        self.files
            .write()
            .insert(path.to_string(), content.to_vec());
        Ok(StoredFile {
            path: path.to_string(),
            url: format!("{}{}", self.public_base, path),
        })
    }
}

fn matches(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column) == Some(value),
        Filter::Within { column, values } => {
            row.get(column).is_some_and(|value| values.contains(value))
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        _ => CmpOrdering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn payload(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_insert_assigns_id_and_created_at() {
        let gateway = MemoryGateway::new();
        let row = gateway
            .insert("news", payload(&[("title", json!("Launch"))]))
            .unwrap();
        assert!(row_id(&row).is_some());
        assert!(row.get("created_at").is_some());
    }

    #[test]
    fn test_query_orders_filters_and_limits() {
        let gateway = MemoryGateway::new();
        for (channel, at) in [("general", 30), ("dev", 10), ("general", 20), ("general", 10)] {
            gateway
                .insert(
                    "messages",
                    payload(&[("channel", json!(channel)), ("created_at", json!(at))]),
                )
                .unwrap();
        }

        let rows = gateway
            .query(
                "messages",
                &QueryOptions::new()
                    .order_asc("created_at")
                    .eq("channel", "general")
                    .limit(2),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["created_at"], json!(10));
        assert_eq!(rows[1]["created_at"], json!(20));
    }

    #[test]
    fn test_within_filter() {
        let gateway = MemoryGateway::new();
        let kept = gateway
            .insert("attachments", payload(&[("target_id", json!(7))]))
            .unwrap();
        gateway
            .insert("attachments", payload(&[("target_id", json!(8))]))
            .unwrap();

        let rows = gateway
            .query(
                "attachments",
                &QueryOptions::new().within("target_id", vec![json!(7), json!(9)]),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(row_id(&rows[0]), row_id(&kept));
    }

    #[test]
    fn test_update_merges_and_keeps_id() {
        let gateway = MemoryGateway::new();
        let row = gateway
            .insert("tasks", payload(&[("title", json!("Ship")), ("status", json!("open"))]))
            .unwrap();
        let id = row_id(&row).unwrap();

        let updated = gateway
            .update("tasks", id, payload(&[("status", json!("done"))]))
            .unwrap();
        assert_eq!(updated["status"], json!("done"));
        assert_eq!(updated["title"], json!("Ship"));
        assert_eq!(row_id(&updated), Some(id));
    }

    #[test]
    fn test_delete_missing_row_fails() {
        let gateway = MemoryGateway::new();
        let result = gateway.delete("tasks", RowId(404));
        assert!(matches!(result, Err(PortalError::RowNotFound { .. })));
    }

    #[test]
    fn test_mutations_broadcast_changes() {
        let gateway = MemoryGateway::new();
        let seen: Arc<Mutex<Vec<ChangeKind>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let _handle = gateway.subscribe(
            "tasks",
            Arc::new(move |event: &ChangeEvent| log.lock().push(event.kind)),
        );

        let row = gateway.insert("tasks", payload(&[("title", json!("A"))])).unwrap();
        let id = row_id(&row).unwrap();
        gateway
            .update("tasks", id, payload(&[("title", json!("B"))]))
            .unwrap();
        gateway.delete("tasks", id).unwrap();
        gateway.deliver_pending();

        assert_eq!(
            *seen.lock(),
            vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );
    }

    #[test]
    fn test_fault_injection() {
        let gateway = MemoryGateway::new();
        gateway.fail_collection("tasks");
        assert!(matches!(
            gateway.query("tasks", &QueryOptions::new()),
            Err(PortalError::Gateway(_))
        ));
        gateway.restore_collection("tasks");
        assert!(gateway.query("tasks", &QueryOptions::new()).is_ok());
    }

    #[test]
    fn test_upload_returns_public_url() {
        let gateway = MemoryGateway::new();
        let stored = gateway.upload("tasks/7/plan.pdf", b"content").unwrap();
        assert_eq!(stored.url, "memory://tasks/7/plan.pdf");
        assert_eq!(gateway.stored_content("tasks/7/plan.pdf").unwrap(), b"content");
        assert!(matches!(
            gateway.upload("", b"content"),
            Err(PortalError::Upload(_))
        ));
    }
}
