//! Terrain, entities and initial population for the Realm world-state server.
//!
//! This crate holds the contracts the region core consumes from its
//! collaborators, plus small built-in implementations of each.
//!
//! # Modules
//!
//! - [`terrain`] -- [`Terrain`] grids, the [`TerrainProvider`] contract,
//!   decoration dispatch, and [`FlatTerrainProvider`].
//! - [`entity`] -- The [`Entity`] and [`EntityFactory`] contracts and the
//!   server-driven [`VirtualEntity`].
//! - [`populate`] -- [`EntityPopulator`]: coordinate-seeded initial occupants.
//! - [`error`] -- Resource-load failures.

pub mod entity;
pub mod error;
pub mod populate;
pub mod terrain;

// Re-export primary types at crate root.
pub use entity::{Entity, EntityFactory, RegionState, VirtualEntity, VirtualEntityFactory};
pub use error::WorldError;
pub use populate::{EntityPopulator, PopulationConfig, population_seed};
pub use terrain::{Decoration, FlatTerrainProvider, Terrain, TerrainProvider, generate};
