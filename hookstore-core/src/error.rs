//! Error types for store operations.

use thiserror::Error;

/// Errors surfaced by producers, consumers, and configuration loading.
///
/// Panics raised by user code (computations, selectors, callback bodies)
/// are not converted into errors; they unwind through whichever phase
/// invoked them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `use_store` was called with no producer of this store installed
    /// in the current provider scope.
    #[error("store `{store}` consumed outside of a mounted producer")]
    MissingProducer {
        /// Display name of the store.
        store: String,
    },

    /// The producer owning the consumer's slot has been unmounted.
    #[error("producer of store `{store}` has been unmounted")]
    ProducerUnmounted {
        /// Display name of the store.
        store: String,
    },

    /// A store configuration document could not be parsed.
    #[error("invalid store config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
