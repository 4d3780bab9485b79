//! Client: the root namespace that owns a directory of caches.
//!
//! The client directory is named verbatim after the client; each cache is a
//! subdirectory named by the hash of the cache name.
//!
//! Existence checks and the actions that follow them are not locked. Two
//! processes racing `create_cache` / `delete_cache` on the same name can both
//! pass the check; the filesystem decides who wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::codec::{BincodeCodec, Codec};
use crate::config::ObjCacheConfig;
use crate::error::{BoxError, CacheError, Result};
use crate::hash::IdentifierHash;
use crate::options::{CreateOptions, DeleteOptions, LoadOptions, SaveOptions};

/// A named root directory holding zero or more caches.
#[derive(Debug, Clone)]
pub struct Client<C: Codec = BincodeCodec> {
    name: String,
    path: PathBuf,
    codec: C,
    atomic_writes: bool,
}

impl Client<BincodeCodec> {
    /// Open (creating if needed) the client `name` under `root_base`.
    pub fn new(name: impl Into<String>, root_base: impl AsRef<Path>) -> Result<Self> {
        Self::with_codec(name, root_base, BincodeCodec)
    }

    /// Open the client `name` relative to the current working directory.
    pub fn in_current_dir(name: impl Into<String>) -> Result<Self> {
        Self::new(name, ".")
    }

    /// Open the client described by a configuration.
    pub fn from_config(config: &ObjCacheConfig) -> Result<Self> {
        Self::from_config_with_codec(config, BincodeCodec)
    }
}

impl<C: Codec> Client<C> {
    /// Open a client that encodes values with `codec`.
    pub fn with_codec(
        name: impl Into<String>,
        root_base: impl AsRef<Path>,
        codec: C,
    ) -> Result<Self> {
        let name = name.into();
        let joined = root_base.as_ref().join(&name);
        let path = std::path::absolute(&joined).map_err(|e| CacheError::io(&joined, e))?;

        fs::create_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
        debug!(client = %name, path = %path.display(), "opened client root");

        Ok(Self {
            name,
            path,
            codec,
            atomic_writes: true,
        })
    }

    /// Open the client described by a configuration, encoding with `codec`.
    pub fn from_config_with_codec(config: &ObjCacheConfig, codec: C) -> Result<Self> {
        Ok(Self::with_codec(config.client_name.clone(), &config.root_base, codec)?
            .atomic_writes(config.atomic_writes))
    }

    /// Toggle temp-file-and-rename object writes for caches handed out from now on.
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the client root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the directory where the cache `name` is (or would be) stored.
    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.path.join(IdentifierHash::of(name))
    }

    pub fn contains_cache(&self, name: &str) -> bool {
        self.cache_path(name).is_dir()
    }

    /// Create the cache `name`.
    ///
    /// | exists | overwrite_existent | ignore_existent | result |
    /// |--------|--------------------|-----------------|--------|
    /// | no     | -                  | -               | create |
    /// | yes    | true               | -               | delete, then create |
    /// | yes    | false              | true            | existing cache, untouched |
    /// | yes    | false              | false           | `ExistentCacheCreation` |
    pub fn create_cache(&self, name: &str, options: CreateOptions) -> Result<Cache<C>> {
        let path = self.cache_path(name);

        if path.is_dir() {
            if options.overwrite_existent {
                info!(cache = %name, client = %self.name, "overwriting existing cache");
                fs::remove_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
            } else if options.ignore_existent {
                debug!(cache = %name, client = %self.name, "cache exists, reusing it");
                return Ok(self.handle(name, path));
            } else {
                return Err(self.existent_cache(name));
            }
        }

        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
                if !options.ignore_existent {
                    return Err(self.existent_cache(name));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Client root was removed since we opened it.
                fs::create_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        }

        info!(cache = %name, client = %self.name, path = %path.display(), "created cache");
        Ok(self.handle(name, path))
    }

    /// Get a handle to an existing cache.
    pub fn get_cache(&self, name: &str) -> Result<Cache<C>> {
        let path = self.cache_path(name);
        if !path.is_dir() {
            return Err(self.inexistent_cache(name));
        }
        Ok(self.handle(name, path))
    }

    /// Delete the cache `name` and every object in it.
    pub fn delete_cache(&self, name: &str, options: DeleteOptions) -> Result<()> {
        let path = self.cache_path(name);

        if !path.is_dir() {
            if options.ignore_inexistent {
                debug!(cache = %name, client = %self.name, "cache already absent");
                return Ok(());
            }
            return Err(self.inexistent_cache(name));
        }

        fs::remove_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
        info!(cache = %name, client = %self.name, "deleted cache");
        Ok(())
    }

    /// Save an object into the cache named `cache`.
    ///
    /// With `create_cache` the cache is created first if missing; otherwise a
    /// missing cache is [`CacheError::InexistentCacheAccess`].
    pub fn save_obj<T>(
        &self,
        cache: &str,
        key: &str,
        value: &T,
        options: SaveOptions,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let handle = if options.create_cache {
            self.create_cache(cache, CreateOptions::ignore_existent())?
        } else {
            self.get_cache(cache)?
        };
        handle.save(key, value, options)
    }

    /// Load an object from the cache named `cache`.
    pub fn load_obj<T: DeserializeOwned>(&self, cache: &str, key: &str) -> Result<T> {
        self.get_cache(cache)?.load(key)
    }

    /// Load an object from the cache named `cache`, producing it on a miss.
    pub fn load_obj_or_else<T, F, E>(
        &self,
        cache: &str,
        key: &str,
        options: LoadOptions,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
        E: Into<BoxError>,
    {
        self.get_cache(cache)?.load_or_else(key, options, producer)
    }

    /// Delete an object from the cache named `cache`.
    pub fn delete_obj(&self, cache: &str, key: &str) -> Result<()> {
        self.get_cache(cache)?.delete(key)
    }

    fn handle(&self, name: &str, path: PathBuf) -> Cache<C> {
        Cache::new(
            name,
            self.name.clone(),
            path,
            self.codec.clone(),
            self.atomic_writes,
        )
    }

    fn inexistent_cache(&self, name: &str) -> CacheError {
        CacheError::InexistentCacheAccess {
            cache: name.to_string(),
            client: self.name.clone(),
        }
    }

    fn existent_cache(&self, name: &str) -> CacheError {
        CacheError::ExistentCacheCreation {
            cache: name.to_string(),
            client: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use anyhow::Result;
    use std::convert::Infallible;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_root_and_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let client = Client::new("PyCache", temp_dir.path())?;
        assert!(client.path().is_absolute());
        assert!(client.path().is_dir());
        assert_eq!(client.path(), temp_dir.path().join("PyCache"));

        let again = Client::new("PyCache", temp_dir.path())?;
        assert_eq!(again.path(), client.path());
        Ok(())
    }

    #[test]
    fn test_new_fails_when_root_is_a_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("taken"), b"not a directory")?;

        let err = Client::new("taken", temp_dir.path()).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
        Ok(())
    }

    #[test]
    fn test_cache_path_is_hashed_name() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let cache = client.create_cache("Tst", CreateOptions::default())?;
        assert_eq!(cache.path(), client.path().join(IdentifierHash::of("Tst")));
        assert_eq!(cache.name(), "Tst");
        assert_eq!(cache.client_name(), "PyCache");
        Ok(())
    }

    #[test]
    fn test_create_existing_cache_strict_fails() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        client.create_cache("A", CreateOptions::default())?;
        let err = client.create_cache("A", CreateOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CacheError::ExistentCacheCreation { ref cache, ref client }
                if cache == "A" && client == "PyCache"
        ));
        Ok(())
    }

    #[test]
    fn test_create_existing_cache_ignore_keeps_contents() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let first = client.create_cache("A", CreateOptions::default())?;
        first.save("k", &1, SaveOptions::default())?;

        let second = client.create_cache("A", CreateOptions::ignore_existent())?;
        assert_eq!(second.path(), first.path());
        assert_eq!(second.load::<i32>("k")?, 1);
        Ok(())
    }

    #[test]
    fn test_create_existing_cache_overwrite_empties_it() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let first = client.create_cache("A", CreateOptions::default())?;
        first.save("k", &1, SaveOptions::default())?;

        let fresh = client.create_cache("A", CreateOptions::overwrite())?;
        assert!(fresh.exists());
        assert!(!fresh.contains("k"));
        assert_eq!(fs::read_dir(fresh.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_overwrite_wins_over_ignore() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        client
            .create_cache("A", CreateOptions::default())?
            .save("k", &1, SaveOptions::default())?;

        let both = CreateOptions {
            overwrite_existent: true,
            ignore_existent: true,
        };
        let cache = client.create_cache("A", both)?;
        assert!(!cache.contains("k"));
        Ok(())
    }

    #[test]
    fn test_get_cache() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let err = client.get_cache("nope").unwrap_err();
        assert!(matches!(err, CacheError::InexistentCacheAccess { ref cache, .. } if cache == "nope"));

        client.create_cache("yes", CreateOptions::default())?;
        assert!(client.get_cache("yes")?.exists());
        Ok(())
    }

    #[test]
    fn test_delete_cache_policy() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let err = client.delete_cache("B", DeleteOptions::default()).unwrap_err();
        assert!(matches!(err, CacheError::InexistentCacheAccess { .. }));

        client.delete_cache("B", DeleteOptions::ignore_inexistent())?;
        assert!(!client.contains_cache("B"));
        Ok(())
    }

    #[test]
    fn test_delete_cache_removes_objects() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let cache = client.create_cache("B", CreateOptions::default())?;
        cache.save("a", &1, SaveOptions::default())?;
        cache.save("b", &2, SaveOptions::default())?;

        client.delete_cache("B", DeleteOptions::default())?;
        assert!(!client.contains_cache("B"));
        assert!(!cache.path().exists());
        Ok(())
    }

    #[test]
    fn test_recreating_cache_after_client_root_removed() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;
        fs::remove_dir_all(client.path())?;

        let cache = client.create_cache("A", CreateOptions::default())?;
        assert!(cache.exists());
        Ok(())
    }

    #[test]
    fn test_save_obj_requires_cache_unless_create() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;

        let err = client
            .save_obj("C", "k", &1, SaveOptions::default())
            .unwrap_err();
        assert!(matches!(err, CacheError::InexistentCacheAccess { .. }));

        client.save_obj("C", "k", &1, SaveOptions::default().with_create_cache())?;
        assert_eq!(client.load_obj::<i32>("C", "k")?, 1);

        // create_cache on an existing cache must not wipe it
        client.save_obj("C", "j", &2, SaveOptions::default().with_create_cache())?;
        assert_eq!(client.load_obj::<i32>("C", "k")?, 1);
        Ok(())
    }

    #[test]
    fn test_pass_through_object_operations() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let client = Client::new("PyCache", temp_dir.path())?;
        client.create_cache("C", CreateOptions::default())?;

        let value: Vec<String> =
            client.load_obj_or_else("C", "list", LoadOptions::default(), || {
                Ok::<_, Infallible>(vec!["x".to_string()])
            })?;
        assert_eq!(value, vec!["x".to_string()]);
        assert_eq!(client.load_obj::<Vec<String>>("C", "list")?, value);

        client.delete_obj("C", "list")?;
        let err = client.load_obj::<Vec<String>>("C", "list").unwrap_err();
        assert!(matches!(err, CacheError::InexistentObjectAccess { .. }));

        let err = client.load_obj::<i32>("missing-cache", "k").unwrap_err();
        assert!(matches!(err, CacheError::InexistentCacheAccess { .. }));
        Ok(())
    }

    #[test]
    fn test_from_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = ObjCacheConfig::with_root_base(temp_dir.path()).client_name("Configured");
        config.atomic_writes = false;

        let client = Client::from_config(&config)?;
        assert_eq!(client.name(), "Configured");
        assert_eq!(client.path(), config.client_root());

        let cache = client.create_cache("A", CreateOptions::default())?;
        cache.save("k", "v", SaveOptions::default())?;
        assert_eq!(cache.load::<String>("k")?, "v");
        Ok(())
    }

    #[test]
    fn test_from_config_with_json_codec() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = ObjCacheConfig::with_root_base(temp_dir.path()).client_name("Json");

        let client = Client::from_config_with_codec(&config, JsonCodec::default())?;
        let cache = client.create_cache("A", CreateOptions::default())?;
        cache.save("k", &vec![1, 2], SaveOptions::default())?;

        assert_eq!(fs::read_to_string(cache.object_path("k"))?, "[1,2]");
        Ok(())
    }

    #[test]
    fn test_custom_codec_is_handed_to_caches() -> Result<()> {
        #[derive(Debug, Clone, Default)]
        struct Toml;

        impl Codec for Toml {
            type Error = std::io::Error;

            fn encode<T: Serialize + ?Sized>(&self, value: &T) -> std::io::Result<Vec<u8>> {
                toml::to_string(value)
                    .map(String::into_bytes)
                    .map_err(std::io::Error::other)
            }

            fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> std::io::Result<T> {
                let text = std::str::from_utf8(bytes).map_err(std::io::Error::other)?;
                toml::from_str(text).map_err(std::io::Error::other)
            }
        }

        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Settings {
            name: String,
            retries: u32,
        }

        let temp_dir = TempDir::new()?;
        let client = Client::with_codec("PyCache", temp_dir.path(), Toml)?;
        let cache = client.create_cache("settings", CreateOptions::default())?;

        let settings = Settings {
            name: "primary".to_string(),
            retries: 3,
        };
        cache.save("s", &settings, SaveOptions::default())?;

        let raw = fs::read_to_string(cache.object_path("s"))?;
        assert!(raw.contains("retries = 3"));
        assert_eq!(cache.load::<Settings>("s")?, settings);
        Ok(())
    }
}
