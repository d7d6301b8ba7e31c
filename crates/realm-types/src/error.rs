//! Error types for the `realm-types` crate.

/// Errors raised when a region identifier fails structural parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The identifier was the empty string.
    #[error("region id is empty")]
    Empty,

    /// The chain does not start with a recognized root world.
    #[error("unknown root world: {token:?}")]
    UnknownWorld {
        /// The leading token that was not a root world.
        token: String,
    },

    /// The identifier names a bare root world with no region segment.
    #[error("region id {id:?} has no type:x:y segment")]
    MissingSegment {
        /// The offending identifier.
        id: String,
    },

    /// A nesting level is not of the form `type:x:y`.
    #[error("malformed region segment: {segment:?}")]
    BadSegment {
        /// The offending segment.
        segment: String,
    },

    /// A coordinate is not a signed integer.
    #[error("bad coordinate {value:?} in segment {segment:?}")]
    BadCoordinate {
        /// The segment containing the coordinate.
        segment: String,
        /// The coordinate text.
        value: String,
    },
}
