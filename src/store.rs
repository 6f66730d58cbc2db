//! SnapshotStore – canonical town state, durable-backend-first with an
//! in-memory fallback.
//!
//! ## Consistency policy
//!
//! Writes are last-writer-wins, both for concurrent in-process callers and
//! across independent processes sharing the same backend. There is no lock,
//! transaction, or compare-and-swap on the durable key; concurrent writers
//! may clobber each other. This is a deliberate availability trade-off –
//! the rest of the protocol (wholesale `full` pushes, idempotent client
//! application) assumes exactly these semantics.

use crate::backend::{BackendError, DurableBackend};
use crate::codec::{self, CodecError};
use crate::types::Snapshot;
use bytes::Bytes;
use log::warn;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Write outcome
// ---------------------------------------------------------------------------

/// How a `set_snapshot` call landed.
///
/// Degradation is part of the contract, so it is reported as a value rather
/// than buried in logs – the in-memory copy is authoritative either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Persisted to the durable backend (and memory).
    Durable,
    /// Memory only – no backend configured, or the durable write failed.
    MemoryOnly,
}

// ---------------------------------------------------------------------------
// Internal read error (never leaves this module)
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum ReadError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("snapshot deserialize failed: {0}")]
    Deserialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owns the canonical [`Snapshot`]. Readers always receive their own copy.
pub struct SnapshotStore {
    backend: Option<Arc<dyn DurableBackend>>,
    memory: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// `backend: None` runs the store as a pure in-process cache –
    /// acceptable only for single-instance deployments.
    pub fn new(backend: Option<Arc<dyn DurableBackend>>) -> Self {
        Self {
            backend,
            memory: RwLock::new(Snapshot::default()),
        }
    }

    /// Current canonical snapshot. Infallible: any backend, codec, or
    /// deserialize failure degrades to the last known in-memory value.
    pub async fn get_snapshot(&self) -> Snapshot {
        if let Some(backend) = &self.backend {
            match self.load_durable(backend.as_ref()).await {
                Ok(Some(snapshot)) => return snapshot,
                Ok(None) => {}
                Err(e) => warn!("durable read failed, using in-memory snapshot: {}", e),
            }
        }
        self.memory.read().clone()
    }

    /// Replace the snapshot wholesale. The in-memory copy is updated
    /// unconditionally; the durable write is best-effort.
    pub async fn set_snapshot(&self, snapshot: Snapshot) -> WriteOutcome {
        *self.memory.write() = snapshot.clone();

        let Some(backend) = &self.backend else {
            return WriteOutcome::MemoryOnly;
        };

        let raw = match serde_json::to_vec(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("snapshot serialize failed, saved to memory only: {}", e);
                return WriteOutcome::MemoryOnly;
            }
        };

        match backend.store_snapshot(Bytes::from(codec::encode(&raw))).await {
            Ok(()) => WriteOutcome::Durable,
            Err(e) => {
                warn!("durable write failed, snapshot saved to memory only: {}", e);
                WriteOutcome::MemoryOnly
            }
        }
    }

    async fn load_durable(
        &self,
        backend: &dyn DurableBackend,
    ) -> Result<Option<Snapshot>, ReadError> {
        let Some(payload) = backend.load_snapshot().await? else {
            return Ok(None);
        };
        let raw = codec::decode(&payload)?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }
}
