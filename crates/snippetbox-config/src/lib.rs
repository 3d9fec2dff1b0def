//! # Snippetbox Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`database`]: Postgres connection settings
//! - [`server`]: Listen address, TLS material, static assets and timeouts
//! - [`session`]: Session cookie lifetime and flags
//!
//! # Example
//!
//! ```ignore
//! use snippetbox_config::{DatabaseConfig, ServerConfig, SessionConfig};
//!
//! let server_config = ServerConfig::from_env();
//! let session_config = SessionConfig::from_env();
//! ```

pub mod database;
pub mod server;
pub mod session;

// Re-export commonly used types at crate root
pub use database::DatabaseConfig;
pub use server::ServerConfig;
pub use session::SessionConfig;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
