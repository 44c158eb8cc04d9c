mod common;

use std::sync::Arc;

use incident_desk::bridge::WorkerFactory;
use incident_desk::client::IncidentClient;
use incident_desk::config::{Preferences, PreferencesError, PreferencesStore};
use tempfile::TempDir;

use common::config_for;
use common::mock_worker::{ScriptedFactory, Startup};

fn store_in(dir: &TempDir) -> PreferencesStore {
    PreferencesStore::new(dir.path().join("nested").join("preferences.toml"))
}

#[test]
fn missing_file_means_light_mode() {
    let dir = TempDir::new().unwrap();
    assert_eq!(store_in(&dir).load().unwrap(), Preferences::default());
    assert!(!Preferences::default().dark_mode);
}

#[test]
fn save_creates_directories_and_load_reads_back() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);

    preferences.save(&Preferences { dark_mode: true }).unwrap();

    assert!(preferences.path().exists());
    assert!(preferences.load().unwrap().dark_mode);
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);
    std::fs::create_dir_all(preferences.path().parent().unwrap()).unwrap();
    std::fs::write(preferences.path(), "dark_mode = \"sometimes\"").unwrap();

    assert!(matches!(
        preferences.load(),
        Err(PreferencesError::Parse { .. })
    ));
}

async fn client(preferences: PreferencesStore) -> IncidentClient {
    let (factory, _workers) = ScriptedFactory::new(Startup::Announce);
    let factory: Arc<dyn WorkerFactory> = factory;
    IncidentClient::start_with_factory(&config_for("http://localhost:3000/api"), preferences, factory)
        .await
        .unwrap()
}

#[tokio::test]
async fn saved_dark_mode_is_restored_on_start() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);
    preferences.save(&Preferences { dark_mode: true }).unwrap();

    let client = client(preferences).await;

    assert!(client.store().get_state().ui.dark_mode);
}

#[tokio::test]
async fn toggling_dark_mode_is_persisted() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);
    let client = client(preferences.clone()).await;

    assert!(client.toggle_dark_mode().await.unwrap());
    assert!(preferences.load().unwrap().dark_mode);

    client.set_dark_mode(false).await.unwrap();
    assert!(!preferences.load().unwrap().dark_mode);
}

#[tokio::test]
async fn unrelated_actions_do_not_write_preferences() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);
    let client = client(preferences.clone()).await;

    client.set_dark_mode(false).await.unwrap();

    assert!(!preferences.path().exists());
}

#[tokio::test]
async fn shutdown_detaches_persistence() {
    let dir = TempDir::new().unwrap();
    let preferences = store_in(&dir);
    let mut client = client(preferences.clone()).await;

    client.shutdown();
    client.set_dark_mode(true).await.unwrap();

    assert!(!preferences.path().exists());
}
