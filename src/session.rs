//! Admin session handling.
//!
//! The portal has a single privileged role unlocked by a shared password.
//! The unlocked flag lives in session storage so it survives page switches
//! within one browsing session, and is mirrored into the state store so UI
//! sections re-render when it flips. This is a presentation gate only: the
//! data platform applies its own access rules.

use crate::error::{PortalError, Result};
use crate::state::{StateValue, Store};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Session-storage key flagging an unlocked admin session.
pub const ADMIN_SESSION_KEY: &str = "intranet_admin";

/// Key/value storage scoped to one browsing session.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process session storage.
#[derive(Default)]
pub struct MemorySession {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Password gate in front of admin-only operations.
#[derive(Clone)]
pub struct AdminGate {
    session: Arc<dyn SessionStorage>,
    password: String,
    mirror: Option<(Store, String)>,
}

impl AdminGate {
    pub fn new(session: Arc<dyn SessionStorage>, password: &str) -> Self {
        Self {
            session,
            password: password.to_string(),
            mirror: None,
        }
    }

    /// Mirror the unlocked flag into `store` under `key`, pushing the
    /// current value immediately.
    pub fn bind_store(mut self, store: Store, key: &str) -> Self {
        self.mirror = Some((store, key.to_string()));
        self.sync_store();
        self
    }

    /// Try to unlock with `password`. Returns whether the session is now
    /// unlocked.
    pub fn unlock(&self, password: &str) -> bool {
        if password == self.password {
            self.session.set(ADMIN_SESSION_KEY, "1");
            self.sync_store();
            true
        } else {
            false
        }
    }

    pub fn is_admin(&self) -> bool {
        self.session
            .get(ADMIN_SESSION_KEY)
            .is_some_and(|value| value == "1")
    }

    /// Close the admin session.
    pub fn clear(&self) {
        self.session.remove(ADMIN_SESSION_KEY);
        self.sync_store();
    }

    /// Fail unless the session is unlocked.
    pub fn require(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(PortalError::AdminRequired)
        }
    }

    fn sync_store(&self) {
        if let Some((store, key)) = &self.mirror {
            store.update([(key.clone(), StateValue::Flag(self.is_admin()))]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateMap;

    fn gate() -> AdminGate {
        AdminGate::new(Arc::new(MemorySession::new()), "ADMIN")
    }

    #[test]
    fn test_unlock_checks_password() {
        let gate = gate();
        assert!(!gate.unlock("letmein"));
        assert!(!gate.is_admin());
        assert!(gate.unlock("ADMIN"));
        assert!(gate.is_admin());
    }

    #[test]
    fn test_clear_locks_again() {
        let gate = gate();
        gate.unlock("ADMIN");
        gate.clear();
        assert!(!gate.is_admin());
        assert!(matches!(gate.require(), Err(PortalError::AdminRequired)));
    }

    #[test]
    fn test_flag_survives_within_session() {
        let session: Arc<dyn SessionStorage> = Arc::new(MemorySession::new());
        let first = AdminGate::new(Arc::clone(&session), "ADMIN");
        first.unlock("ADMIN");

        // A new gate over the same storage sees the unlocked session.
        let second = AdminGate::new(session, "ADMIN");
        assert!(second.is_admin());
    }

    #[test]
    fn test_store_mirror_tracks_flag() {
        let store = Store::new(StateMap::new());
        let gate = gate().bind_store(store.clone(), "admin");
        assert_eq!(store.get("admin").as_flag(), Some(false));

        gate.unlock("ADMIN");
        assert_eq!(store.get("admin").as_flag(), Some(true));

        gate.clear();
        assert_eq!(store.get("admin").as_flag(), Some(false));
    }
}
