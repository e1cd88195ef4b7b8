//! Configuration module for foundry-local
//!
//! Loads config from `$XDG_CONFIG_HOME/foundry-local/config.toml` or the platform config dir.
//! Falls back to defaults if the file doesn't exist.
//! Partial configs are merged with defaults using serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use foundry_local::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("Runtime CLI: {}", config.service.program);
//! println!("Load TTL: {}s", config.load.ttl_secs);
//! ```

pub mod schema;

pub use schema::Config;
