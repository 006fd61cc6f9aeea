//! Values held in store slots, and their change-detection rules.

use crate::types::{Row, RowId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared list of rows, compared by identity.
pub type Rows = Arc<Vec<Row>>;

/// Row lists grouped by owning record id (e.g. attachments per task).
pub type RowMap = Arc<HashMap<RowId, Rows>>;

/// One slot of page state.
///
/// Container variants hold shared handles. A fresh handle counts as a change
/// even when the contents are equal; only [`StateValue::RowMap`] gets the
/// deeper size-plus-entries comparison, because those maps are rebuilt
/// wholesale on every fetch while usually staying logically unchanged.
#[derive(Clone, Debug)]
pub enum StateValue {
    /// Absent or cleared slot.
    Null,
    Flag(bool),
    Text(String),
    Rows(Rows),
    RowMap(RowMap),
    /// Arbitrary shared record (comment context, metrics row).
    Context(Arc<Value>),
}

impl StateValue {
    pub fn rows(rows: Vec<Row>) -> Self {
        StateValue::Rows(Arc::new(rows))
    }

    pub fn row_map(map: HashMap<RowId, Vec<Row>>) -> Self {
        StateValue::RowMap(Arc::new(
            map.into_iter().map(|(id, rows)| (id, Arc::new(rows))).collect(),
        ))
    }

    pub fn text(text: impl Into<String>) -> Self {
        StateValue::Text(text.into())
    }

    pub fn context(value: Value) -> Self {
        StateValue::Context(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            StateValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&Rows> {
        match self {
            StateValue::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_row_map(&self) -> Option<&RowMap> {
        match self {
            StateValue::RowMap(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Value> {
        match self {
            StateValue::Context(value) => Some(value),
            _ => None,
        }
    }

    /// Whether assigning `next` over `self` is a no-op for subscribers.
    ///
    /// Scalars compare by value, row lists and contexts by identity. Row maps
    /// are unchanged when sizes match and every key in `next` maps to the
    /// identical row list in `self`.
    pub(crate) fn same_as(&self, next: &StateValue) -> bool {
        match (self, next) {
            (StateValue::Null, StateValue::Null) => true,
            (StateValue::Flag(a), StateValue::Flag(b)) => a == b,
            (StateValue::Text(a), StateValue::Text(b)) => a == b,
            (StateValue::Rows(a), StateValue::Rows(b)) => Arc::ptr_eq(a, b),
            (StateValue::Context(a), StateValue::Context(b)) => Arc::ptr_eq(a, b),
            (StateValue::RowMap(a), StateValue::RowMap(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && b.iter().all(|(id, rows)| {
                            a.get(id).is_some_and(|prev| Arc::ptr_eq(prev, rows))
                        }))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), serde_json::json!(id));
        row
    }

    #[test]
    fn test_scalars_compare_by_value() {
        assert!(StateValue::Null.same_as(&StateValue::Null));
        assert!(StateValue::Flag(true).same_as(&StateValue::Flag(true)));
        assert!(!StateValue::Flag(true).same_as(&StateValue::Flag(false)));
        assert!(StateValue::text("general").same_as(&StateValue::text("general")));
        assert!(!StateValue::text("general").same_as(&StateValue::text("dev")));
        assert!(!StateValue::Null.same_as(&StateValue::Flag(false)));
    }

    #[test]
    fn test_rows_compare_by_identity() {
        let rows = Arc::new(vec![row(1)]);
        let same = StateValue::Rows(Arc::clone(&rows));
        assert!(StateValue::Rows(rows).same_as(&same));
        // Equal contents, fresh handle: still a change.
        assert!(!StateValue::rows(vec![row(1)]).same_as(&StateValue::rows(vec![row(1)])));
        assert!(!StateValue::rows(Vec::new()).same_as(&StateValue::rows(Vec::new())));
    }

    #[test]
    fn test_row_map_compares_entries() {
        let shared: Rows = Arc::new(vec![row(9)]);

        let mut old = HashMap::new();
        old.insert(RowId(1), Arc::clone(&shared));
        let old = StateValue::RowMap(Arc::new(old));

        // Rebuilt map, same entry handles: unchanged.
        let mut rebuilt = HashMap::new();
        rebuilt.insert(RowId(1), Arc::clone(&shared));
        assert!(old.same_as(&StateValue::RowMap(Arc::new(rebuilt))));

        // One entry swapped for a fresh list: changed.
        let mut swapped = HashMap::new();
        swapped.insert(RowId(1), Arc::new(vec![row(9)]));
        assert!(!old.same_as(&StateValue::RowMap(Arc::new(swapped))));

        // Different size: changed.
        let mut grown = HashMap::new();
        grown.insert(RowId(1), Arc::clone(&shared));
        grown.insert(RowId(2), Arc::clone(&shared));
        assert!(!old.same_as(&StateValue::RowMap(Arc::new(grown))));
    }

    #[test]
    fn test_empty_row_maps_are_unchanged() {
        let a = StateValue::row_map(HashMap::new());
        let b = StateValue::row_map(HashMap::new());
        assert!(a.same_as(&b));
    }
}
