//! Configuration loading and persisted preferences.
//!
//! - `types.rs` - `Config` and its `[api]`, `[bridge]`, `[cache]` sections
//! - `loader.rs` - TOML loading and validation
//! - `preferences.rs` - Dark-mode persistence

mod loader;
mod preferences;
mod types;

pub use loader::ConfigError;
pub use preferences::{Preferences, PreferencesError, PreferencesStore};
pub use types::{ApiConfig, BridgeConfig, CacheConfig, Config};
