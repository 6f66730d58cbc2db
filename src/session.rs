//! Streaming sessions – one per connected client.
//!
//! ## Protocol
//!
//! ```text
//! Init → Subscribed → Syncing → Relaying → Closed
//! ```
//!
//! 1. Subscribe to the bus. With an identity attached, heartbeat it and
//!    publish a roster event so peers see the join immediately.
//! 2. Emit the current snapshot (`full`) and roster (`users`) as the first
//!    two frames – every client starts from a consistent base state.
//! 3. Relay loop: bounded wait on the subscription. Delivered events are
//!    forwarded verbatim; timeouts refresh presence, re-publish the roster,
//!    and emit a keepalive comment frame.
//! 4. On disconnect: remove the identity, publish the shrunk roster, release
//!    the subscription. This runs on *every* exit path – peer-visible
//!    presence depends on it.
//!
//! The session runs as a spawned task feeding a bounded channel. Dropping
//! the [`SessionHandle`] is the cancellation signal; the task observes it
//! and still performs full teardown.

use crate::bus::{EventBus, MessageOutcome, Subscription};
use crate::presence::PresenceRegistry;
use crate::protocol::{Event, Frame};
use crate::store::SnapshotStore;
use log::{debug, info, warn};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Bounded wait on the subscription per relay iteration. Also the cadence
/// of keepalive frames when no events arrive.
pub const WAIT_BUDGET: Duration = Duration::from_secs(10);

/// Minimum interval between presence refreshes on the event-delivery path.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Outbound frame buffer per session before the relay loop blocks.
const FRAME_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A live streaming connection, seen from the transport side.
///
/// Yields [`Frame`]s forever until dropped; dropping it cancels the relay
/// loop and triggers teardown. Not restartable – a reconnecting client gets
/// a fresh session.
pub struct SessionHandle {
    frames: mpsc::Receiver<Frame>,
}

impl SessionHandle {
    /// Next outbound frame. `None` only after the session task has ended.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.frames.recv().await
    }
}

impl futures::Stream for SessionHandle {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Opens sessions against one store / bus / registry triple.
pub struct SessionManager {
    store: Arc<SnapshotStore>,
    bus: Arc<EventBus>,
    presence: Arc<PresenceRegistry>,
}

impl SessionManager {
    pub fn new(
        store: Arc<SnapshotStore>,
        bus: Arc<EventBus>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            store,
            bus,
            presence,
        }
    }

    /// Open a streaming session, optionally bound to an identity.
    ///
    /// The relay loop runs as its own task; the returned handle is the only
    /// link to it and doubles as the cancellation token.
    pub fn open_session(&self, identity: Option<String>) -> SessionHandle {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        tokio::spawn(run_session(
            self.store.clone(),
            self.bus.clone(),
            self.presence.clone(),
            identity,
            tx,
        ));
        SessionHandle { frames: rx }
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

async fn run_session(
    store: Arc<SnapshotStore>,
    bus: Arc<EventBus>,
    presence: Arc<PresenceRegistry>,
    identity: Option<String>,
    tx: mpsc::Sender<Frame>,
) {
    let mut subscription = bus.subscribe().await;

    // Announce the join before the first frame so peers converge without
    // waiting for the next timeout cycle.
    if let Some(name) = &identity {
        presence.heartbeat(name);
        publish_roster(&bus, &presence).await;
    }

    relay(&store, &bus, &presence, &identity, &tx, &mut subscription).await;

    // Teardown – runs on every exit path, including cancellation.
    if let Some(name) = &identity {
        presence.remove(name);
        publish_roster(&bus, &presence).await;
    }
    drop(subscription);
    info!("session closed ({})", identity.as_deref().unwrap_or("anonymous"));
}

/// Initial sync plus the steady-state relay loop. Returns when the client
/// disconnects (handle dropped) on any path.
async fn relay(
    store: &SnapshotStore,
    bus: &EventBus,
    presence: &PresenceRegistry,
    identity: &Option<String>,
    tx: &mpsc::Sender<Frame>,
    subscription: &mut Subscription,
) {
    // Initial sync: snapshot first, then roster, before any live event.
    let town = store.get_snapshot().await;
    if !send_event(tx, &Event::Full { town }).await {
        return;
    }
    let users = presence.list_active();
    if !send_event(tx, &Event::Users { users }).await {
        return;
    }

    let mut last_keepalive = Instant::now();

    loop {
        tokio::select! {
            _ = tx.closed() => return,
            outcome = subscription.next_message(WAIT_BUDGET) => match outcome {
                MessageOutcome::Message(payload) => {
                    // Forward verbatim – the payload is never re-serialized.
                    let json = String::from_utf8_lossy(&payload).into_owned();
                    if tx.send(Frame::Data(json)).await.is_err() {
                        return;
                    }
                    if let Some(name) = identity {
                        if last_keepalive.elapsed() > KEEPALIVE_INTERVAL {
                            presence.heartbeat(name);
                            last_keepalive = Instant::now();
                        }
                    }
                }
                MessageOutcome::TimedOut => {
                    if let Some(name) = identity {
                        presence.heartbeat(name);
                        publish_roster(bus, presence).await;
                    }
                    if tx.send(Frame::Keepalive).await.is_err() {
                        return;
                    }
                    last_keepalive = Instant::now();
                }
            }
        }
    }
}

/// Publish the current roster to every subscriber.
async fn publish_roster(bus: &EventBus, presence: &PresenceRegistry) {
    let users = presence.list_active();
    debug!("roster broadcast: {} active", users.len());
    bus.publish(&Event::Users { users }).await;
}

/// Serialize and send an event this session authored. Returns `false` when
/// the client is gone.
async fn send_event(tx: &mpsc::Sender<Frame>, event: &Event) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize session event, skipping: {}", e);
            return true;
        }
    };
    tx.send(Frame::Data(json)).await.is_ok()
}
