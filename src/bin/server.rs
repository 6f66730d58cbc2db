//! town-sync-server binary
//!
//! Hosts the SSE sync endpoint and connects to the durable backend.
//!
//! ## Configuration (flags / env)
//!
//! | Key                  | Default                 | Description                     |
//! |----------------------|-------------------------|---------------------------------|
//! | `TOWN_SYNC_LISTEN`   | `127.0.0.1:8000`        | HTTP listen address             |
//! | `TOWN_SYNC_ENDPOINT` | `nats://localhost:4222` | NATS endpoint                   |
//! | `TOWN_SYNC_BUCKET`   | `town-sync`             | JetStream KV bucket             |
//! | `TOWN_SYNC_SUBJECT`  | `town.events`           | Pub/sub subject for events      |
//! | `TOWN_SYNC_TOKEN`    | *(unset)*               | Shared token for `/events`      |
//! | `--in-process`       | off                     | Skip NATS, run memory-only      |

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use town_sync::backend::{DurableBackend, MemoryBackend, NatsBackend};
use town_sync::bus::EventBus;
use town_sync::presence::PresenceRegistry;
use town_sync::protocol::subjects;
use town_sync::server::{self, AppState};
use town_sync::session::SessionManager;
use town_sync::store::SnapshotStore;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "town-sync-server", about = "Town Sync Service", version)]
struct Args {
    /// HTTP listen address
    #[arg(long, env = "TOWN_SYNC_LISTEN", default_value = "127.0.0.1:8000")]
    listen: String,

    /// NATS endpoint
    #[arg(long, env = "TOWN_SYNC_ENDPOINT", default_value = "nats://localhost:4222")]
    endpoint: String,

    /// JetStream KV bucket for the durable snapshot
    #[arg(long, env = "TOWN_SYNC_BUCKET", default_value = subjects::KV_BUCKET)]
    bucket: String,

    /// Pub/sub subject events are relayed on
    #[arg(long, env = "TOWN_SYNC_SUBJECT", default_value = subjects::EVENTS)]
    subject: String,

    /// Shared auth token required on /events (open access when unset)
    #[arg(long, env = "TOWN_SYNC_TOKEN")]
    auth_token: Option<String>,

    /// Run with the in-process backend instead of NATS (single instance only)
    #[arg(long)]
    in_process: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("town_sync=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    log::info!(
        "Starting town-sync-server (listen='{}', endpoint='{}', subject='{}')",
        args.listen,
        args.endpoint,
        args.subject,
    );

    // Pick the backend. A failed NATS connect is not fatal: the service
    // degrades to a single-instance, memory-only editor.
    let backend: Option<Arc<dyn DurableBackend>> = if args.in_process {
        log::info!("Using in-process backend (--in-process)");
        Some(Arc::new(MemoryBackend::new()))
    } else {
        match NatsBackend::connect(&args.endpoint, &args.bucket, &args.subject).await {
            Ok(nats) => Some(Arc::new(nats)),
            Err(e) => {
                log::warn!("NATS unavailable, running memory-only: {}", e);
                None
            }
        }
    };

    let store = Arc::new(SnapshotStore::new(backend.clone()));
    let bus = Arc::new(EventBus::new(backend));
    let presence = Arc::new(PresenceRegistry::new());
    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        bus.clone(),
        presence.clone(),
    ));

    let app = server::router(AppState {
        sessions,
        bus,
        store,
        presence,
        auth_token: args.auth_token,
    });

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("town-sync-server shutting down (SIGINT)");
        })
        .await?;

    Ok(())
}
