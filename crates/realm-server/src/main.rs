//! Region server binary for Realm.
//!
//! Loads configuration, builds the region store with the built-in terrain
//! provider and server-driven entities, creates the configured warm regions,
//! and then serves until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `realm-config.yaml` (or `REALM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the terrain provider and entity factory
//! 4. Start the region store worker
//! 5. Warm the configured regions
//! 6. Wait for ctrl-c

mod error;
mod warmup;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use realm_core::{RealmConfig, RegionStore};
use realm_world::{FlatTerrainProvider, VirtualEntityFactory};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "realm-config.yaml";

/// Application entry point for the region server.
///
/// # Errors
///
/// Returns an error if configuration, terrain setup, warm-up, or signal
/// handling fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::var_os("REALM_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("realm-server starting");
    info!(
        path = %config_path.display(),
        from_file,
        ttl_seconds = config.regions.ttl_seconds,
        request_queue_capacity = config.regions.request_queue_capacity,
        terrain_width = config.terrain.width,
        terrain_height = config.terrain.height,
        "Configuration loaded"
    );

    // 3. Terrain provider and entity factory.
    let terrain = FlatTerrainProvider::new(config.terrain.width, config.terrain.height)
        .map_err(ServerError::from)?;
    let entities = VirtualEntityFactory::new(config.regions.inbox_capacity);

    // 4. Region store.
    let store = RegionStore::spawn(&config, Arc::new(terrain), Arc::new(entities));
    info!("Region store started");

    // 5. Warm-up.
    let warmed = warmup::warm_regions(&store, &config.server.warm_regions)
        .await
        .map_err(ServerError::from)?;
    info!(regions = warmed.len(), "realm-server ready");
    drop(warmed);

    // 6. Serve until interrupted.
    tokio::signal::ctrl_c().await.map_err(ServerError::from)?;
    info!(live_regions = store.len(), "Shutdown requested, exiting");

    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(RealmConfig, bool), ServerError> {
    if path.exists() {
        Ok((RealmConfig::from_file(path)?, true))
    } else {
        let mut config = RealmConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, false))
    }
}
