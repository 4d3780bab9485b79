//! Filesystem-backed object cache.
//!
//! Values are stored under a two-level namespace: a **client** owns a root
//! directory, the root holds **caches**, and each cache holds **objects**.
//! Cache names and object keys are hashed into fixed-length hex tokens so any
//! string is a valid identifier:
//!
//! ```text
//! {root_base}/{client_name}/{hash(cache_name)}/{hash(object_key)}
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use objcache::{CacheError, Client, CreateOptions, LoadOptions, SaveOptions};
//!
//! let client = Client::new("PyCache", "/tmp").unwrap();
//! let cache = client.create_cache("Tst", CreateOptions::ignore_existent()).unwrap();
//!
//! cache.save("Receba", &1, SaveOptions::default()).unwrap();
//!
//! // Strict by default: a second save under the same key is refused
//! match cache.save("Receba", &2, SaveOptions::default()) {
//!     Err(CacheError::ExistentObjectCreation { .. }) => {}
//!     other => panic!("unexpected: {other:?}"),
//! }
//! assert_eq!(cache.load::<i32>("Receba").unwrap(), 1);
//!
//! // Compute on a miss, store the result for next time
//! let answer: u64 = cache
//!     .load_or_insert_with("answer", LoadOptions::default(), || 42)
//!     .unwrap();
//! ```
//!
//! # Configuration
//!
//! Environment variables (see [`ObjCacheConfig::from_env`]):
//! - `OBJCACHE_ROOT`: Directory client roots live in
//! - `OBJCACHE_CLIENT`: Client name
//! - `OBJCACHE_ATOMIC_WRITES`: Set to "false" to write objects in place
//!
//! # Concurrency
//!
//! Everything is synchronous and unlocked. Object writes go through a temp
//! file and a rename, so readers never see a half-written object, and strict
//! saves cannot clobber each other. Cache creation and deletion are plain
//! check-then-act sequences; concurrent callers on the same cache name race.

pub mod cache;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod options;

// Re-exports for convenience
pub use cache::Cache;
pub use client::Client;
pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::ObjCacheConfig;
pub use error::{BoxError, CacheError, Result};
pub use hash::{hash_identifier, IdentifierHash};
pub use options::{CreateOptions, DeleteOptions, LoadOptions, SaveOptions};
