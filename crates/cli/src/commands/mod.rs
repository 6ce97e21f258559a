//! CLI command implementations.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use std::sync::Arc;

use pantry_client::store::FileTokenStore;
use pantry_client::{ClientConfig, Storefront};

/// Wire a storefront from the environment and restore any persisted session.
///
/// Every command goes through here, so a session signed in by `pantry auth
/// signin` is picked up by later invocations via the shared token file.
pub async fn storefront() -> Result<Storefront, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let store = Arc::new(FileTokenStore::new(&config.token_file));
    let shop = Storefront::new(&config, store)?;
    shop.bootstrap().await?;
    Ok(shop)
}
