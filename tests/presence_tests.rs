//! PresenceRegistry unit tests

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use town_sync::presence::{PresenceRegistry, LIVENESS_WINDOW};

    // -----------------------------------------------------------------------
    // Heartbeat / removal
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn heartbeat_registers_an_identity() {
        let registry = PresenceRegistry::new();
        assert!(registry.is_empty());

        registry.heartbeat("alice");
        assert_eq!(registry.list_active(), vec!["alice".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_removal_takes_effect_immediately() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("alice");
        registry.heartbeat("bob");

        registry.remove("alice");
        assert_eq!(registry.list_active(), vec!["bob".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn roster_is_sorted() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("carol");
        registry.heartbeat("alice");
        registry.heartbeat("bob");

        assert_eq!(
            registry.list_active(),
            vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
        );
    }

    // -----------------------------------------------------------------------
    // Liveness window
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_evicted_on_read() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("alice");

        tokio::time::advance(LIVENESS_WINDOW + Duration::from_secs(1)).await;
        assert!(registry.list_active().is_empty());
        assert!(registry.is_empty(), "eviction removes the entry, not just the listing");
    }

    #[tokio::test(start_paused = true)]
    async fn entries_inside_the_window_survive() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("alice");

        tokio::time::advance(LIVENESS_WINDOW).await;
        // Exactly at the boundary the entry is still considered live.
        assert_eq!(registry.list_active(), vec!["alice".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_keep_an_identity_alive_indefinitely() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("alice");

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(20)).await;
            registry.heartbeat("alice");
        }
        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(registry.list_active(), vec!["alice".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_is_per_identity() {
        let registry = PresenceRegistry::new();
        registry.heartbeat("alice");
        tokio::time::advance(Duration::from_secs(20)).await;
        registry.heartbeat("bob");
        tokio::time::advance(Duration::from_secs(15)).await;

        // alice is 35s stale, bob only 15s.
        assert_eq!(registry.list_active(), vec!["bob".to_string()]);
    }
}
