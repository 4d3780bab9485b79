//! Save an object, try to save it again, and read back what was kept.
//!
//! Run with: cargo run -p objcache --example basic

use objcache::{CacheError, Client, CreateOptions, SaveOptions};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = Client::in_current_dir("__ObjCache")?;
    let cache = client.create_cache("Tst", CreateOptions::ignore_existent())?;

    match cache.save("Receba", &1, SaveOptions::default()) {
        Ok(()) => println!("stored Receba"),
        Err(CacheError::ExistentObjectCreation { .. }) => {
            println!("Receba already cached: {}", cache.load::<i32>("Receba")?);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
