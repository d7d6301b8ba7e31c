//! Error types for the `realm-world` crate.
//!
//! These are the resource-load failures of the terrain and entity
//! collaborators. They are surfaced to whoever asked for the region instead
//! of taking the process down.

use realm_types::RegionId;

/// Errors that can occur while building terrain or spawning entities.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The terrain provider could not produce terrain for a region.
    #[error("terrain unavailable for {region}: {reason}")]
    TerrainUnavailable {
        /// The region being built.
        region: RegionId,
        /// Why the terrain could not be built.
        reason: String,
    },

    /// The entity factory has no definition for the requested kind.
    #[error("entity kind {kind:?} unavailable: {reason}")]
    EntityUnavailable {
        /// The requested entity kind.
        kind: String,
        /// Why the entity could not be created.
        reason: String,
    },

    /// Terrain dimensions are too small to hold a walled region.
    #[error("invalid terrain dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in tiles.
        width: usize,
        /// Requested height in tiles.
        height: usize,
    },
}
