//! Town Sync Service
//!
//! Real-time synchronization backbone for the collaborative 3D town editor.
//!
//! ## Architecture
//!
//! ```text
//! server.rs (axum host)
//!   └── SessionManager  (session.rs)  ← per-connection relay protocol
//!         ├── EventBus        (bus.rs)      ← publish/subscribe relay
//!         ├── SnapshotStore   (store.rs)    ← canonical state, LWW
//!         └── PresenceRegistry (presence.rs) ← who is connected
//!               ↑ all three share one DurableBackend (backend.rs)
//! ```
//!
//! The CRUD route layer, static assets, and the model catalog live in a
//! separate service; they reach this core only through "publish an event",
//! "get/set the snapshot", and "open a session".

// Protocol and data types are always available (no server feature needed).
pub mod codec;
pub mod normalize;
pub mod protocol;
pub mod types;

// Server-side modules require the `server` feature.
#[cfg(feature = "server")]
pub mod backend;
#[cfg(feature = "server")]
pub mod bus;
#[cfg(feature = "server")]
pub mod presence;
#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
pub mod session;
#[cfg(feature = "server")]
pub mod store;

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use backend::{DurableBackend, MemoryBackend, NatsBackend};
#[cfg(feature = "server")]
pub use bus::{EventBus, MessageOutcome, Subscription};
#[cfg(feature = "server")]
pub use presence::PresenceRegistry;
#[cfg(feature = "server")]
pub use session::{SessionHandle, SessionManager};
#[cfg(feature = "server")]
pub use store::{SnapshotStore, WriteOutcome};
pub use protocol::{Event, Frame};
pub use types::{PlacedObject, Snapshot, Vec3, CATEGORIES};
