//! Presence registry – identity → last-heartbeat time, with TTL eviction.
//!
//! Eviction happens at read time inside [`PresenceRegistry::list_active`];
//! there is no timer task. The scan costs O(registry size) per roster query,
//! which is fine at the connection counts a single editor instance sees.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// How long an identity stays listed without a heartbeat. Clients assume a
/// peer is gone after roughly this much silence, so it is a fixed protocol
/// value, not configuration.
pub const LIVENESS_WINDOW: Duration = Duration::from_secs(30);

/// Shared roster of currently-connected identities.
///
/// Written by every active session (heartbeats, removals) and read by the
/// roster-broadcast step. Interleaved calls are safe; the eviction scan and
/// the returned roster are not atomic with respect to each other, which is
/// acceptable – a just-expired entry may be listed one final time.
#[derive(Default)]
pub struct PresenceRegistry {
    entries: Mutex<HashMap<String, Instant>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or refresh an identity's last-seen time to now.
    pub fn heartbeat(&self, identity: &str) {
        self.entries
            .lock()
            .insert(identity.to_owned(), Instant::now());
    }

    /// Explicit removal on graceful disconnect.
    pub fn remove(&self, identity: &str) {
        self.entries.lock().remove(identity);
    }

    /// Evict stale entries, then return the remaining identities sorted.
    pub fn list_active(&self) -> Vec<String> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, seen| now.duration_since(*seen) <= LIVENESS_WINDOW);

        let mut active: Vec<String> = entries.keys().cloned().collect();
        active.sort();
        active
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
