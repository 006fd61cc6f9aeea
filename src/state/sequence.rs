//! Latest-request-wins sequencing for overlapping fetches.
//!
//! Fetches carry no ordering of their own: a slow query issued earlier can
//! resolve after, and would otherwise overwrite, a later one. Each logical
//! query owns a [`QuerySlot`]; results are only applied while their ticket is
//! still the most recently issued one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket identifying one issued fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Monotonic counter for one logical query slot.
#[derive(Debug, Default)]
pub struct QuerySlot {
    issued: AtomicU64,
}

impl QuerySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for an outgoing fetch, superseding earlier ones.
    pub fn issue(&self) -> FetchTicket {
        FetchTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the most recently issued fetch.
    pub fn is_latest(&self, ticket: FetchTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let slot = QuerySlot::new();
        let first = slot.issue();
        assert!(slot.is_latest(first));

        let second = slot.issue();
        assert!(!slot.is_latest(first));
        assert!(slot.is_latest(second));
    }

    #[test]
    fn test_slots_are_independent() {
        let tasks = QuerySlot::new();
        let news = QuerySlot::new();
        let ticket = tasks.issue();
        news.issue();
        news.issue();
        assert!(tasks.is_latest(ticket));
    }
}
