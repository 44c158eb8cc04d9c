use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use incident_desk::api::IncidentQuery;
use incident_desk::cli::{CacheCommand, Cli, Command, DarkModeArg};
use incident_desk::client::IncidentClient;
use incident_desk::config::{Config, PreferencesStore};
use incident_desk::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration after overrides")?;

    let preferences = PreferencesStore::new(PreferencesStore::default_path());

    // Reading the preference needs no network.
    if let Command::DarkMode { mode: None } = cli.command {
        let saved = preferences.load()?;
        return print(&saved);
    }

    let mut client = IncidentClient::start(&config, preferences)
        .await
        .context("starting incident client")?;

    let outcome = run(&client, cli.command).await;
    client.shutdown();
    outcome
}

async fn run(client: &IncidentClient, command: Command) -> Result<()> {
    match command {
        Command::List { status } => {
            let incidents = client.load_incidents(&IncidentQuery { status }).await?;
            print(&incidents)
        }
        Command::Show { id } => print(&client.open_incident(id).await?),
        Command::Create(args) => print(&client.create(args.into()).await?),
        Command::Status { id, status } => print(&client.change_status(id, status).await?),
        Command::Delete { id } => {
            client.remove(id).await?;
            print(&serde_json::json!({ "deleted": id }))
        }
        Command::Cache {
            command: CacheCommand::Stats,
        } => print(&client.api().get_cache_stats().await?),
        Command::Cache { command } => {
            let options = command.purge_options().unwrap_or_default();
            let purged = client.api().purge_cache(options).await?;
            print(&serde_json::json!({ "purged": purged }))
        }
        Command::DarkMode { mode } => {
            let dark_mode = match mode {
                None => client.store().get_state().ui.dark_mode,
                Some(DarkModeArg::Toggle) => client.toggle_dark_mode().await?,
                Some(DarkModeArg::On) => {
                    client.set_dark_mode(true).await?;
                    true
                }
                Some(DarkModeArg::Off) => {
                    client.set_dark_mode(false).await?;
                    false
                }
            };
            print(&serde_json::json!({ "dark_mode": dark_mode }))
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
