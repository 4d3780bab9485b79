//! Per-operation collision policies.
//!
//! Every option defaults to the strict behaviour: fail on any collision or
//! absence. Callers opt into the permissive ones explicitly.

/// Options for [`Client::create_cache`](crate::Client::create_cache).
///
/// When both flags are set, `overwrite_existent` wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Delete an existing cache (and everything in it) and create a fresh one.
    pub overwrite_existent: bool,
    /// Return a handle to an existing cache untouched.
    pub ignore_existent: bool,
}

impl CreateOptions {
    pub fn overwrite() -> Self {
        Self {
            overwrite_existent: true,
            ignore_existent: false,
        }
    }

    pub fn ignore_existent() -> Self {
        Self {
            overwrite_existent: false,
            ignore_existent: true,
        }
    }
}

/// Options for [`Client::delete_cache`](crate::Client::delete_cache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Deleting a cache that does not exist is a no-op instead of an error.
    pub ignore_inexistent: bool,
}

impl DeleteOptions {
    pub fn ignore_inexistent() -> Self {
        Self {
            ignore_inexistent: true,
        }
    }
}

/// Options for [`Cache::save`](crate::Cache::save) and
/// [`Client::save_obj`](crate::Client::save_obj).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Replace an object already stored under the same key.
    pub overwrite_existent: bool,
    /// Only honoured by `Client::save_obj`: create the cache first if missing.
    pub create_cache: bool,
}

impl SaveOptions {
    pub fn overwrite() -> Self {
        Self {
            overwrite_existent: true,
            create_cache: false,
        }
    }

    pub fn with_create_cache(mut self) -> Self {
        self.create_cache = true;
        self
    }
}

/// Options for [`Cache::load_or_else`](crate::Cache::load_or_else).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Persist the producer's result under the requested key. Defaults to true.
    pub save_ret: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { save_ret: true }
    }
}

impl LoadOptions {
    /// Run the producer on a miss but do not persist what it returns.
    pub fn no_save() -> Self {
        Self { save_ret: false }
    }
}
