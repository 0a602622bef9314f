//! Configuration for the `favr` binary.
//!
//! Values are layered with [`figment`]: built-in defaults, then an optional
//! TOML, YAML or JSON file, then `FAVR_`-prefixed environment variables.
//!
//! ```toml
//! public_url = "https://icons.example.net"
//!
//! [fetch]
//! timeout_ms = 5000
//!
//! [cache]
//! path = "/var/cache/favr/metadata.sqlite"
//!
//! [storage]
//! type = "local"
//! path = "/var/cache/favr/blobs"
//! ```

pub mod error;
mod load;
mod models;

pub use crate::load::{ENV_PREFIX, default_config_file};
pub use crate::models::{CacheConfig, Config, FetchConfig, Secret, StorageConfig};
