//! Pantry Client - SDK for the Pantry ordering API.
//!
//! The SDK keeps a signed-in user's session and shopping cart in step with
//! the backend. The backend is the source of truth - cart totals are never
//! computed locally, and every cart mutation is followed by a full refetch.
//!
//! # Architecture
//!
//! - [`api::ApiClient`] - the single chokepoint for all outbound requests.
//!   Attaches the bearer token read from the [`store::TokenStore`] on every
//!   call and transparently performs one refresh-and-retry cycle on an
//!   authorization failure.
//! - [`session::SessionManager`] - owns the authentication lifecycle:
//!   bootstrap from persisted tokens, login, logout, profile replacement.
//! - [`cart::CartManager`] - mirrors the server-side cart; replaced
//!   wholesale after every mutation.
//! - [`Storefront`] - composition root wiring the three together. All state
//!   is constructor-injected; tests can instantiate isolated instances.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use pantry_client::{ClientConfig, Storefront, store::FileTokenStore};
//! use secrecy::SecretString;
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileTokenStore::new(&config.token_file));
//! let shop = Storefront::new(&config, store)?;
//!
//! shop.bootstrap().await?;
//! shop.sign_in("user@example.com", &SecretString::from("hunter2!")).await?;
//! shop.cart().add_item(pantry_core::ProductId::new(7), 2).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod storefront;
pub mod types;

pub use api::ApiClient;
pub use cart::{CartManager, CartState};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use session::{SessionManager, SessionSnapshot};
pub use storefront::Storefront;
