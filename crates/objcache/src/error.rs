//! Error taxonomy for cache and object access.
//!
//! The four policy variants are the ones callers are expected to match on; they
//! can all be suppressed by opting into a permissive option (`ignore_existent`,
//! `ignore_inexistent`, `overwrite_existent`). The remaining variants wrap
//! failures from the filesystem, the codec, or a miss producer.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error from a codec or a producer closure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`Client`](crate::Client) and [`Cache`](crate::Cache).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Trying to access an inexistent cache. Cache: {cache}. Client: {client}.")]
    InexistentCacheAccess { cache: String, client: String },

    #[error("Trying to create an existent cache. Cache: {cache}. Client: {client}.")]
    ExistentCacheCreation { cache: String, client: String },

    #[error(
        "Trying to access an inexistent object. Object: {key}. Cache: {cache}. Client: {client}."
    )]
    InexistentObjectAccess {
        key: String,
        cache: String,
        client: String,
    },

    #[error(
        "Trying to create an existent object. Object: {key}. Cache: {cache}. Client: {client}."
    )]
    ExistentObjectCreation {
        key: String,
        cache: String,
        client: String,
    },

    #[error("filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode object {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to decode object {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("producer failed: {0}")]
    Producer(#[source] BoxError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the four existence-policy variants.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::InexistentCacheAccess { .. }
                | Self::ExistentCacheCreation { .. }
                | Self::InexistentObjectAccess { .. }
                | Self::ExistentObjectCreation { .. }
        )
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
