//! Subcommand implementations.

use anyhow::{Context, Result};
use objcache::{
    hash_identifier, Client, CreateOptions, DeleteOptions, JsonCodec, ObjCacheConfig,
    SaveOptions,
};
use serde_json::Value;
use tracing::info;

/// Values cross the command line as JSON, so they are stored as JSON too.
fn client(config: &ObjCacheConfig) -> objcache::Result<Client<JsonCodec>> {
    Client::from_config_with_codec(config, JsonCodec::default())
}

pub fn hash(identifier: &str) {
    println!("{}", hash_identifier(identifier));
}

pub fn create_cache(
    config: &ObjCacheConfig,
    name: &str,
    overwrite: bool,
    ignore_existing: bool,
) -> Result<()> {
    let client = client(config)?;
    let options = CreateOptions {
        overwrite_existent: overwrite,
        ignore_existent: ignore_existing,
    };
    let cache = client.create_cache(name, options)?;
    println!("{}", cache.path().display());
    Ok(())
}

pub fn delete_cache(config: &ObjCacheConfig, name: &str, ignore_missing: bool) -> Result<()> {
    let client = client(config)?;
    let options = DeleteOptions {
        ignore_inexistent: ignore_missing,
    };
    client.delete_cache(name, options)?;
    Ok(())
}

pub fn put(
    config: &ObjCacheConfig,
    cache: &str,
    key: &str,
    json: &str,
    overwrite: bool,
    create_cache: bool,
) -> Result<()> {
    let value: Value = serde_json::from_str(json).context("value is not valid JSON")?;

    let client = client(config)?;
    let options = SaveOptions {
        overwrite_existent: overwrite,
        create_cache,
    };
    client.save_obj(cache, key, &value, options)?;
    info!(cache, key, "stored value");
    Ok(())
}

pub fn get(config: &ObjCacheConfig, cache: &str, key: &str) -> Result<()> {
    let client = client(config)?;
    let value: Value = client.load_obj(cache, key)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn rm(config: &ObjCacheConfig, cache: &str, key: &str) -> Result<()> {
    let client = client(config)?;
    client.delete_obj(cache, key)?;
    Ok(())
}

/// Resolve paths without touching the filesystem.
pub fn path(config: &ObjCacheConfig, cache: &str, key: Option<&str>) -> Result<()> {
    let root = std::path::absolute(config.client_root())
        .context("failed to resolve client root")?;
    let mut path = root.join(hash_identifier(cache));
    if let Some(key) = key {
        path.push(hash_identifier(key));
    }
    println!("{}", path.display());
    Ok(())
}

pub fn show_config(config: &ObjCacheConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
