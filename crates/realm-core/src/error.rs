//! Error types for region membership and the region store.

use realm_types::{EntityId, IdentityError, RegionId};
use realm_world::WorldError;

/// Errors from region membership operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// The entity is already an occupant of the region.
    #[error("entity {entity} is already in region {region}")]
    AlreadyPresent {
        /// The entity that tried to join twice.
        entity: EntityId,
        /// The region it is already in.
        region: RegionId,
    },

    /// The region has been evicted and no longer accepts occupants.
    #[error("region {region} has been evicted")]
    Evicted {
        /// The evicted region.
        region: RegionId,
    },
}

/// Errors from [`RegionStore`](crate::store::RegionStore) lookups.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The id string could not be parsed.
    #[error("malformed region id: {source}")]
    Malformed {
        /// The underlying parse error.
        #[from]
        source: IdentityError,
    },

    /// The id parsed but violates the nesting rules.
    #[error("invalid region id: {id}")]
    InvalidRegion {
        /// The rejected id.
        id: RegionId,
    },

    /// Terrain generation or initial population failed.
    #[error("failed to build region: {source}")]
    Build {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The blocking build task panicked or was cancelled.
    #[error("build task for region {id} did not complete")]
    BuildAborted {
        /// The region that was being built.
        id: RegionId,
    },

    /// The store worker has shut down.
    #[error("region store worker is not running")]
    WorkerStopped,
}
