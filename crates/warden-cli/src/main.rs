//! warden - access-control engine on simulated hardware.
//!
//! Configuration is read from the JSON file named by `WARDEN_CONFIG`
//! (defaults otherwise). Log output is controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use warden_core::Key;
use warden_engine::{AuditTrail, DeviceRuntime, SecuritySession};
use warden_storage::{CredentialStore, Database, SqliteAccessLogRepository};

mod config;
mod simulator;

use config::WardenConfig;
use simulator::Simulator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WardenConfig::load()?;

    let db = Database::new(config.database.clone())
        .await
        .context("opening credential database")?;
    let store = Arc::new(
        CredentialStore::from_database(&db)
            .await
            .context("loading credentials")?,
    );
    let audit = AuditTrail::with_repository(SqliteAccessLogRepository::new(db.pool().clone()));

    let (simulator, peripherals) = Simulator::new();
    let runtime = DeviceRuntime::start(config.runtime.clone(), peripherals, Arc::clone(&store), audit)
        .context("starting device runtime")?;
    let reporter = tokio::spawn(report_sessions(runtime.subscribe()));

    if config.simulate {
        let door_pin: Vec<Key> = store.read().door_pin().keys().to_vec();
        simulator.walk_through(&door_pin).await;
    }

    info!("running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    reporter.abort();
    runtime.shutdown().await;
    db.close().await;
    Ok(())
}

/// Log every state change as a JSON snapshot of the session.
async fn report_sessions(mut sessions: watch::Receiver<SecuritySession>) {
    let mut last_state = sessions.borrow().state;
    while sessions.changed().await.is_ok() {
        let session = *sessions.borrow_and_update();
        if session.state == last_state {
            continue;
        }
        last_state = session.state;
        match serde_json::to_string(&session) {
            Ok(snapshot) => info!(%snapshot, "session"),
            Err(error) => warn!(%error, "session snapshot not serialized"),
        }
    }
}
