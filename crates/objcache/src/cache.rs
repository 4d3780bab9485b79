//! Cache: object-level persistence inside one cache directory.
//!
//! Layout:
//! ```text
//! {client_root}/
//! └── {hash(cache_name)}/
//!     ├── {hash(key_a)}        # encoded value
//!     ├── {hash(key_b)}
//!     └── .tmpXXXXXX           # in-flight atomic write
//! ```
//!
//! There is no index: an object exists exactly when its file does.
//!
//! A process that dies mid-write leaves its `.tmp*` file behind. Such files
//! are never mistaken for objects (no token starts with a dot) and go away
//! with the cache; [`Cache::remove_stale_temp_files`] clears them sooner.

use std::convert::Infallible;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{BincodeCodec, Codec};
use crate::error::{BoxError, CacheError, Result};
use crate::hash::IdentifierHash;
use crate::options::{LoadOptions, SaveOptions};

/// Handle to one cache directory under a client root.
///
/// Obtained from [`Client::create_cache`](crate::Client::create_cache) or
/// [`Client::get_cache`](crate::Client::get_cache). The handle holds no open
/// files; if the directory is deleted underneath it, operations report
/// [`CacheError::InexistentCacheAccess`].
#[derive(Debug, Clone)]
pub struct Cache<C: Codec = BincodeCodec> {
    name: String,
    client: String,
    path: PathBuf,
    codec: C,
    atomic_writes: bool,
}

impl<C: Codec> Cache<C> {
    pub(crate) fn new(
        name: impl Into<String>,
        client: impl Into<String>,
        path: PathBuf,
        codec: C,
        atomic_writes: bool,
    ) -> Self {
        Self {
            name: name.into(),
            client: client.into(),
            path,
            codec,
            atomic_writes,
        }
    }

    /// The human-readable cache name this handle was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning client.
    pub fn client_name(&self) -> &str {
        &self.client
    }

    /// The cache directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Whether the cache directory is still present.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Get the path where the object for `key` is (or would be) stored.
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.path.join(IdentifierHash::of(key))
    }

    /// Check if an object exists without reading it.
    pub fn contains(&self, key: &str) -> bool {
        self.object_path(key).is_file()
    }

    /// Encode `value` and store it under `key`.
    ///
    /// Fails with [`CacheError::ExistentObjectCreation`] if the key is taken
    /// and `overwrite_existent` is not set.
    pub fn save<T>(&self, key: &str, value: &T, options: SaveOptions) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if !self.exists() {
            return Err(self.inexistent_cache());
        }

        if !options.overwrite_existent && self.contains(key) {
            return Err(self.existent_object(key));
        }

        let obj_path = self.object_path(key);

        let bytes = self.codec.encode(value).map_err(|e| CacheError::Encode {
            key: key.to_string(),
            source: Box::new(e),
        })?;

        if self.atomic_writes {
            self.write_atomic(key, &obj_path, &bytes, options.overwrite_existent)?;
        } else {
            fs::write(&obj_path, &bytes).map_err(|e| CacheError::io(&obj_path, e))?;
        }

        debug!(
            key,
            cache = %self.name,
            client = %self.client,
            size = bytes.len(),
            "saved object"
        );
        Ok(())
    }

    /// Write through a temp file in the cache directory, then rename it over
    /// the object path. A strict save renames without clobbering, so a writer
    /// that won the race keeps its object and we report the collision.
    fn write_atomic(
        &self,
        key: &str,
        obj_path: &Path,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(".tmp")
            .tempfile_in(&self.path)
            .map_err(|e| CacheError::io(&self.path, e))?;

        temp.write_all(bytes)
            .map_err(|e| CacheError::io(temp.path(), e))?;
        self.match_in_place_mode(temp.as_file())?;

        if overwrite {
            temp.persist(obj_path)
                .map_err(|e| CacheError::io(obj_path, e.error))?;
            return Ok(());
        }

        match temp.persist_noclobber(obj_path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(self.existent_object(key))
            }
            Err(e) => Err(CacheError::io(obj_path, e.error)),
        }
    }

    /// Temp files are created owner-only. Give them the mode a plain
    /// `fs::write` would: the directory's umask-governed bits minus execute.
    #[cfg(unix)]
    fn match_in_place_mode(&self, file: &fs::File) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir_mode = fs::metadata(&self.path)
            .map_err(|e| CacheError::io(&self.path, e))?
            .permissions()
            .mode();
        file.set_permissions(fs::Permissions::from_mode(dir_mode & 0o666))
            .map_err(|e| CacheError::io(&self.path, e))
    }

    #[cfg(not(unix))]
    fn match_in_place_mode(&self, _file: &fs::File) -> Result<()> {
        Ok(())
    }

    /// Load and decode the object stored under `key`.
    ///
    /// Fails with [`CacheError::InexistentObjectAccess`] if there is none.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.read(key)?
            .ok_or_else(|| self.inexistent_object(key))
    }

    /// Load `key`, or on a miss run `producer` to build the value.
    ///
    /// With `save_ret` (the default) the produced value is stored under `key`
    /// before it is returned, so the next `load` hits. Without it the value is
    /// returned and nothing is written.
    pub fn load_or_else<T, F, E>(
        &self,
        key: &str,
        options: LoadOptions,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
        E: Into<BoxError>,
    {
        if let Some(value) = self.read(key)? {
            return Ok(value);
        }

        debug!(key, cache = %self.name, "cache miss, running producer");
        let value = producer().map_err(|e| CacheError::Producer(e.into()))?;

        if options.save_ret {
            match self.save(key, &value, SaveOptions::default()) {
                Ok(()) => {}
                Err(CacheError::ExistentObjectCreation { .. }) => {
                    warn!(
                        key,
                        cache = %self.name,
                        client = %self.client,
                        "object appeared while producing, keeping the stored one"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(value)
    }

    /// Like [`load_or_else`](Self::load_or_else) for producers that cannot fail.
    pub fn load_or_insert_with<T, F>(
        &self,
        key: &str,
        options: LoadOptions,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.load_or_else(key, options, || Ok::<T, Infallible>(producer()))
    }

    /// Remove the object stored under `key`.
    pub fn delete(&self, key: &str) -> Result<()> {
        let obj_path = self.object_path(key);

        match fs::remove_file(&obj_path) {
            Ok(()) => {
                debug!(key, cache = %self.name, "deleted object");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.exists() {
                    Err(self.inexistent_object(key))
                } else {
                    Err(self.inexistent_cache())
                }
            }
            Err(e) => Err(CacheError::io(&obj_path, e)),
        }
    }

    /// Remove `.tmp*` files left by interrupted atomic writes.
    ///
    /// Only files last modified at least `min_age` ago are touched, so a
    /// write still in flight in another process survives a sweep with a sane
    /// age. Returns how many files were removed.
    pub fn remove_stale_temp_files(&self, min_age: Duration) -> Result<usize> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(self.inexistent_cache())
            }
            Err(e) => return Err(CacheError::io(&self.path, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.path, e))?;
            if !entry.file_name().to_string_lossy().starts_with(".tmp") {
                continue;
            }

            let path = entry.path();
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| modified.elapsed().unwrap_or_default())
                .map_err(|e| CacheError::io(&path, e))?;
            if age < min_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(&path, e)),
            }
        }

        if removed > 0 {
            warn!(cache = %self.name, removed, "removed stale temp files");
        }
        Ok(removed)
    }

    /// Read and decode, `None` on a miss.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let obj_path = self.object_path(key);

        let bytes = match fs::read(&obj_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.exists() {
                    return Ok(None);
                }
                return Err(self.inexistent_cache());
            }
            Err(e) => return Err(CacheError::io(&obj_path, e)),
        };

        debug!(key, cache = %self.name, size = bytes.len(), "loaded object");

        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Decode {
                key: key.to_string(),
                source: Box::new(e),
            })
    }

    fn inexistent_cache(&self) -> CacheError {
        CacheError::InexistentCacheAccess {
            cache: self.name.clone(),
            client: self.client.clone(),
        }
    }

    fn inexistent_object(&self, key: &str) -> CacheError {
        CacheError::InexistentObjectAccess {
            key: key.to_string(),
            cache: self.name.clone(),
            client: self.client.clone(),
        }
    }

    fn existent_object(&self, key: &str) -> CacheError {
        CacheError::ExistentObjectCreation {
            key: key.to_string(),
            cache: self.name.clone(),
            client: self.client.clone(),
        }
    }
}
