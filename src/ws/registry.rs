//! Connection registry - live socket bookkeeping
//!
//! Connection ids double as player ids once the client joins. Ids are
//! random v4 UUIDs assigned at upgrade time and never reused.

use std::time::Instant;

use dashmap::DashMap;
use uuid::Uuid;

/// Tracks every open WebSocket connection
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Instant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, conn_id: Uuid) {
        self.connections.insert(conn_id, Instant::now());
    }

    pub fn remove(&self, conn_id: &Uuid) {
        self.connections.remove(conn_id);
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_track_the_count() {
        let registry = ConnectionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        registry.insert(a);
        registry.insert(b);
        assert_eq!(registry.count(), 2);

        registry.remove(&a);
        assert_eq!(registry.count(), 1);

        // Removing an unknown id is harmless.
        registry.remove(&Uuid::new_v4());
        assert_eq!(registry.count(), 1);
    }
}
