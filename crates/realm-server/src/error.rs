//! Error types for the region server binary.
//!
//! [`ServerError`] wraps every failure mode during startup and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the region server binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: realm_core::ConfigError,
    },

    /// The configured terrain provider could not be constructed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: realm_world::WorldError,
    },

    /// A region could not be created during warm-up.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: realm_core::StoreError,
    },

    /// Installing the shutdown signal handler failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
