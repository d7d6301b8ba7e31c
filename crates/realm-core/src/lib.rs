//! Region lifecycle and the region store for the Realm server.
//!
//! This crate owns live regions: creating them on first use, tracking the
//! entities inside them, fanning events out to occupants, and evicting them
//! after a period without keep-alives.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `realm-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`RegionError`] and [`StoreError`].
//! - [`region`] -- [`Region`]: terrain, occupants, broadcast, eviction signal.
//! - [`store`] -- [`RegionStore`]: single-flight creation and TTL eviction.
//!
//! [`RegionError`]: error::RegionError
//! [`StoreError`]: error::StoreError
//! [`Region`]: region::Region
//! [`RegionStore`]: store::RegionStore

pub mod config;
pub mod error;
pub mod region;
pub mod store;

pub use config::{ConfigError, RealmConfig};
pub use error::{RegionError, StoreError};
pub use region::Region;
pub use store::RegionStore;
