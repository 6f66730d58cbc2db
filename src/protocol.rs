//! Wire protocol: every message that crosses the sync boundary between the
//! town service and any consumer (browser, another server…).
//!
//! ## Channels
//!
//! | Direction          | Carried by                         |
//! |--------------------|------------------------------------|
//! | server → client    | SSE frames (`data: <json>\n\n`)    |
//! | server ↔ server    | NATS subject pub/sub               |
//!
//! ## Design rules
//!
//! 1. Every event is `Serialize + Deserialize` with a `type` discriminator.
//! 2. The event set is **closed** – malformed or unknown types are rejected
//!    at the publish boundary, not discovered by clients.
//! 3. Relayed payloads are forwarded to clients byte-for-byte; the session
//!    layer never re-serializes an event it did not author.

use crate::types::{Snapshot, Vec3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A transient, typed message relayed to every subscriber.
///
/// Events are never stored – they exist only for the duration of one
/// publish/relay hop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Entire canonical snapshot, pushed after bulk mutations and as the
    /// first message of every session.
    Full { town: Snapshot },
    /// Current roster of connected identities.
    Users { users: Vec<String> },
    /// Collaborative cursor update.
    Cursor {
        username: String,
        position: Vec3,
        camera_position: Vec3,
    },
}

impl Event {
    /// Serialize to the JSON bytes that travel over the bus.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ---------------------------------------------------------------------------
// Outbound frames
// ---------------------------------------------------------------------------

/// One outbound message of a streaming session, in SSE framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An application event, relayed as `data: <json>\n\n`.
    Data(String),
    /// Idle-period comment frame (`: keepalive\n\n`) – keeps intermediaries
    /// from reaping the connection.
    Keepalive,
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frame::Data(json) => write!(f, "data: {}\n\n", json),
            Frame::Keepalive => write!(f, ": keepalive\n\n"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subject / key helpers
// ---------------------------------------------------------------------------

/// All bus subjects and durable keys used by the town protocol.
pub mod subjects {
    /// Pub/sub subject every event is relayed on.
    pub const EVENTS: &str = "town.events";

    /// JetStream KV bucket holding the durable snapshot.
    pub const KV_BUCKET: &str = "town-sync";

    /// Key within [`KV_BUCKET`] holding the compressed, serialized snapshot.
    pub const SNAPSHOT_KEY: &str = "town_data";
}
