//! Client-side state and I/O layer for incident tracking.
//!
//! - `store` - Observable state container, actions, reducers, middleware
//! - `bridge` - Correlated request/response RPC over worker channels
//! - `executor` - Background HTTP executor with response cache
//! - `api` - Incident API facade on top of the bridge
//! - `client` - Wiring of all of the above for one process
//! - `config` - TOML configuration and persisted preferences

pub mod api;
pub mod bridge;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod executor;
pub mod logging;
pub mod model;
pub mod store;
