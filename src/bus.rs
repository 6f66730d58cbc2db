//! Event bus – publish/subscribe relay over the shared channel.
//!
//! Publishing is fire-and-forget: a publisher never blocks on, or fails
//! because of, an unreachable channel backend. Subscriptions always open;
//! with no backend they simply never deliver, so relay loops fall back to
//! their keepalive cadence.

use crate::backend::{DurableBackend, EventStream};
use crate::protocol::Event;
use bytes::Bytes;
use futures::StreamExt;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Outcome of one bounded wait on a subscription.
#[derive(Debug)]
pub enum MessageOutcome {
    /// A relayed event payload, verbatim as published.
    Message(Bytes),
    /// Nothing arrived within the wait budget.
    TimedOut,
}

/// One caller's channel subscription.
///
/// Dropping the subscription releases it on every exit path, including
/// cancellation – callers never unsubscribe explicitly.
pub struct Subscription {
    stream: Option<EventStream>,
}

impl Subscription {
    /// Wait up to `wait` for the next event on this subscription.
    ///
    /// Never blocks past the budget: with no backend (or after the backend
    /// closes the stream) this sleeps out the budget and reports
    /// [`MessageOutcome::TimedOut`] so the caller can interleave keepalives.
    pub async fn next_message(&mut self, wait: Duration) -> MessageOutcome {
        let Some(stream) = self.stream.as_mut() else {
            tokio::time::sleep(wait).await;
            return MessageOutcome::TimedOut;
        };

        match tokio::time::timeout(wait, stream.next()).await {
            Ok(Some(payload)) => MessageOutcome::Message(payload),
            Ok(None) => {
                // Backend closed the stream – degrade to timeout-only.
                self.stream = None;
                MessageOutcome::TimedOut
            }
            Err(_) => MessageOutcome::TimedOut,
        }
    }

    /// Whether live delivery is possible on this subscription.
    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Publish/subscribe relay. `backend: None` degrades every operation to a
/// logged no-op, keeping a single-process deployment functional.
pub struct EventBus {
    backend: Option<Arc<dyn DurableBackend>>,
}

impl EventBus {
    pub fn new(backend: Option<Arc<dyn DurableBackend>>) -> Self {
        Self { backend }
    }

    /// Best-effort fire-and-forget publish. Serialization or backend
    /// failures drop the event with a warning; the caller never fails.
    pub async fn publish(&self, event: &Event) {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to serialize event, dropping: {}", e);
                return;
            }
        };
        self.publish_payload(Bytes::from(payload)).await;
    }

    /// Publish an already-serialized payload verbatim.
    pub async fn publish_payload(&self, payload: Bytes) {
        let Some(backend) = &self.backend else {
            warn!("event dropped: no channel backend configured");
            return;
        };
        if let Err(e) = backend.publish(payload).await {
            warn!("failed to publish event (backend unavailable): {}", e);
        }
    }

    /// Open a subscription scoped to the caller.
    ///
    /// Always succeeds; with no reachable backend the subscription is
    /// timeout-only.
    pub async fn subscribe(&self) -> Subscription {
        let Some(backend) = &self.backend else {
            return Subscription { stream: None };
        };
        match backend.subscribe().await {
            Ok(stream) => Subscription {
                stream: Some(stream),
            },
            Err(e) => {
                warn!("subscribe failed, session will run keepalive-only: {}", e);
                Subscription { stream: None }
            }
        }
    }
}
