//! Shared type definitions for the Realm world-state server.
//!
//! This crate is the single source of truth for identifiers and messages
//! that cross crate boundaries.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Root worlds, region types and event kinds
//! - [`region_id`] -- Hierarchical region identifiers: parse, format, validate
//! - [`event`] -- Events broadcast to region occupants
//! - [`error`] -- Identifier parse errors

pub mod enums;
pub mod error;
pub mod event;
pub mod ids;
pub mod region_id;

// Re-export all public types at crate root for convenience.
pub use enums::{EventKind, RegionType, RootWorld};
pub use error::IdentityError;
pub use event::Event;
pub use ids::EntityId;
pub use region_id::{
    DUNGEON_ENTRANCE_POSITION, RegionId, Segment, TOWN_POSITION, is_dungeon_pos, is_town_pos,
};
