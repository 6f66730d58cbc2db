//! Durable backend substrate: snapshot persistence + event fan-out.
//!
//! The store and the bus both talk to the same substrate through
//! [`DurableBackend`], so a deployment picks one backend for both concerns:
//!
//! * [`NatsBackend`] – JetStream KV for the snapshot, core pub/sub for
//!   events. Shared across processes.
//! * [`MemoryBackend`] – process-local; used by tests and single-instance
//!   deployments with no NATS available.
//!
//! Backend failures never propagate past the store/bus boundary – callers
//! degrade to their documented fallbacks instead.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Stream of raw event payloads from a backend subscription.
///
/// Dropping the stream releases the underlying subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend connect failed: {0}")]
    Connect(String),
    #[error("backend request failed: {0}")]
    Request(String),
}

/// The persistent/shared substrate backing the store and the bus.
#[async_trait]
pub trait DurableBackend: Send + Sync {
    /// Read the stored snapshot payload, `None` if nothing was ever written.
    async fn load_snapshot(&self) -> Result<Option<Bytes>, BackendError>;

    /// Replace the stored snapshot payload.
    async fn store_snapshot(&self, payload: Bytes) -> Result<(), BackendError>;

    /// Fan a raw event payload out to every current subscriber.
    async fn publish(&self, payload: Bytes) -> Result<(), BackendError>;

    /// Open a subscription to the shared event channel.
    async fn subscribe(&self) -> Result<EventStream, BackendError>;
}

// ---------------------------------------------------------------------------
// NATS backend
// ---------------------------------------------------------------------------

/// NATS-backed substrate: JetStream KV bucket + core pub/sub subject.
pub struct NatsBackend {
    client: async_nats::Client,
    kv: async_nats::jetstream::kv::Store,
    key: String,
    subject: String,
}

impl NatsBackend {
    /// Connect to NATS and ensure the KV bucket exists.
    ///
    /// A failure here means the process runs without a durable backend –
    /// callers log the error and pass `None` to the store and bus.
    pub async fn connect(
        endpoint: &str,
        bucket: &str,
        subject: &str,
    ) -> Result<Self, BackendError> {
        let client = async_nats::connect(endpoint)
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;

        let jetstream = async_nats::jetstream::new(client.clone());
        let kv = jetstream
            .create_key_value(async_nats::jetstream::kv::Config {
                bucket: bucket.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;

        log::info!("NATS backend connected (bucket='{}', subject='{}')", bucket, subject);

        Ok(Self {
            client,
            kv,
            key: crate::protocol::subjects::SNAPSHOT_KEY.to_string(),
            subject: subject.to_string(),
        })
    }
}

#[async_trait]
impl DurableBackend for NatsBackend {
    async fn load_snapshot(&self) -> Result<Option<Bytes>, BackendError> {
        self.kv
            .get(self.key.as_str())
            .await
            .map_err(|e| BackendError::Request(e.to_string()))
    }

    async fn store_snapshot(&self, payload: Bytes) -> Result<(), BackendError> {
        self.kv
            .put(&self.key, payload)
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Request(e.to_string()))
    }

    async fn publish(&self, payload: Bytes) -> Result<(), BackendError> {
        self.client
            .publish(self.subject.clone(), payload)
            .await
            .map_err(|e| BackendError::Request(e.to_string()))
    }

    async fn subscribe(&self) -> Result<EventStream, BackendError> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        // Subscriber unsubscribes when the mapped stream is dropped.
        Ok(Box::pin(subscriber.map(|message| message.payload)))
    }
}

// ---------------------------------------------------------------------------
// In-process backend
// ---------------------------------------------------------------------------

/// Process-local substrate: a slot for the snapshot payload and a broadcast
/// channel for events. No cross-process visibility.
pub struct MemoryBackend {
    snapshot: parking_lot::RwLock<Option<Bytes>>,
    events: broadcast::Sender<Bytes>,
}

impl MemoryBackend {
    const CHANNEL_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        let (events, _) = broadcast::channel(Self::CHANNEL_CAPACITY);
        Self {
            snapshot: parking_lot::RwLock::new(None),
            events,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableBackend for MemoryBackend {
    async fn load_snapshot(&self) -> Result<Option<Bytes>, BackendError> {
        Ok(self.snapshot.read().clone())
    }

    async fn store_snapshot(&self, payload: Bytes) -> Result<(), BackendError> {
        *self.snapshot.write() = Some(payload);
        Ok(())
    }

    async fn publish(&self, payload: Bytes) -> Result<(), BackendError> {
        // send only errs when no subscriber exists – not a failure here
        let _ = self.events.send(payload);
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventStream, BackendError> {
        let receiver = self.events.subscribe();
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => return Some((payload, rx)),
                    // A slow subscriber skips lagged events rather than dying
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("in-process subscriber lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}
