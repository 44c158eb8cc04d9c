//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_api;
pub mod mock_worker;

use std::path::PathBuf;

use incident_desk::config::Config;
use incident_desk::model::{Incident, IncidentStatus};
use tempfile::TempDir;

/// Write `content` to `config.toml` in a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Default config pointed at `base_url`.
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config
}

pub fn incident(id: u64, title: &str, status: IncidentStatus) -> Incident {
    Incident {
        title: title.to_string(),
        description: format!("{} description", title),
        ..Incident::new(id, status)
    }
}

pub fn incidents_json(incidents: &[Incident]) -> String {
    serde_json::to_string(incidents).unwrap()
}
