//! Process-level wiring of the store, bridge, executor and API facade.
//!
//! ```text
//!                  ┌── LoggingMiddleware
//! IncidentClient ──┤── AutoDismissMiddleware
//!   │              └── dark-mode subscriber ──→ PreferencesStore
//!   │
//!   └── ApiService ──→ Bridge ──→ Executor ("api", ReqwestFetcher)
//! ```
//!
//! Controller methods call the facade, then fold the result into the store
//! and raise a notification describing the outcome.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::api::{ApiError, ApiService, ApiSettings, IncidentQuery, API_WORKER_NAME};
use crate::bridge::{Bridge, BridgeError, BridgeSettings, ExecutorFactory, WorkerFactory};
use crate::config::{Config, Preferences, PreferencesStore};
use crate::executor::fetch::{FetchTimeouts, ReqwestFetcher};
use crate::executor::API_WORKER_PATH;
use crate::model::{Incident, IncidentId, IncidentPatch, IncidentStatus, NewIncident};
use crate::store::{
    creators, Action, AppState, AutoDismissMiddleware, LoggingMiddleware, NotificationKind, Notifier,
    Store, StoreError, Subscriber, Subscription,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct IncidentClient {
    store: Store,
    bridge: Bridge,
    api: ApiService,
    notifier: Notifier,
    persistence: Option<Subscription>,
}

impl IncidentClient {
    /// Start with the reqwest-backed executor.
    pub async fn start(config: &Config, preferences: PreferencesStore) -> Result<Self, ClientError> {
        let fetcher = ReqwestFetcher::new(FetchTimeouts {
            connect: config.api.connect_timeout(),
            request: config.api.request_timeout(),
        })?;
        let factory = Arc::new(ExecutorFactory::new(Arc::new(fetcher)));
        Self::start_with_factory(config, preferences, factory).await
    }

    /// Start with a caller-provided worker factory.
    pub async fn start_with_factory(
        config: &Config,
        preferences: PreferencesStore,
        factory: Arc<dyn WorkerFactory>,
    ) -> Result<Self, ClientError> {
        let saved = preferences.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable preferences");
            Preferences::default()
        });

        let store = Store::new(AppState::with_dark_mode(saved.dark_mode));
        store.apply_middleware(Arc::new(LoggingMiddleware));
        store.apply_middleware(Arc::new(AutoDismissMiddleware));
        let persistence = store.subscribe(persist_dark_mode(preferences, saved.dark_mode));

        let bridge = Bridge::new(
            factory,
            BridgeSettings {
                response_timeout: config.bridge.response_timeout(),
                ready_timeout: config.bridge.ready_timeout(),
            },
        );
        bridge.init_worker(API_WORKER_NAME, API_WORKER_PATH).await?;

        let api = ApiService::new(
            store.clone(),
            bridge.clone(),
            ApiSettings {
                base_url: config.api.base_url.clone(),
                worker: API_WORKER_NAME.to_string(),
                use_cache: config.cache.enabled,
                cache_ttl_ms: config.cache.ttl_ms,
            },
        );

        Ok(Self {
            store,
            bridge,
            api,
            notifier: Notifier::new(),
            persistence: Some(persistence),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub async fn load_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>, ClientError> {
        let incidents = self.report(self.api.list_incidents(query).await).await?;
        self.apply(creators::set_incidents(incidents.clone())).await?;
        Ok(incidents)
    }

    pub async fn open_incident(&self, id: IncidentId) -> Result<Incident, ClientError> {
        let incident = self.report(self.api.get_incident_by_id(id).await).await?;
        self.apply(creators::set_current_incident(Some(incident.clone())))
            .await?;
        Ok(incident)
    }

    pub async fn create(&self, data: NewIncident) -> Result<Incident, ClientError> {
        let incident = self.report(self.api.create_incident(data).await).await?;
        self.apply(creators::add_incident(incident.clone())).await?;
        self.apply(self.notifier.notify_about(
            incident.id,
            format!("Incident #{} created", incident.id),
            NotificationKind::Success,
        ))
        .await?;
        Ok(incident)
    }

    pub async fn change_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, ClientError> {
        let updated = self
            .report(self.api.update_incident_status(id, status).await)
            .await?;
        self.apply(creators::update_incident(IncidentPatch::from_incident(&updated)))
            .await?;
        self.apply(self.notifier.notify_about(
            id,
            format!("Incident #{} is now {}", id, updated.status),
            NotificationKind::Info,
        ))
        .await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: IncidentId) -> Result<(), ClientError> {
        self.report(self.api.delete_incident(id).await).await?;
        self.apply(creators::delete_incident(id)).await?;
        self.apply(self.notifier.success(format!("Incident #{} deleted", id)))
            .await?;
        Ok(())
    }

    pub async fn set_dark_mode(&self, dark_mode: bool) -> Result<(), ClientError> {
        self.apply(creators::set_dark_mode(dark_mode)).await?;
        Ok(())
    }

    pub async fn toggle_dark_mode(&self) -> Result<bool, ClientError> {
        let state = self.apply(creators::toggle_dark_mode()).await?;
        Ok(state.ui.dark_mode)
    }

    /// Stop the executor and detach the persistence subscriber.
    pub fn shutdown(&mut self) {
        self.bridge.terminate_all();
        if let Some(subscription) = self.persistence.take() {
            subscription.unsubscribe();
        }
    }

    async fn apply(&self, action: Action) -> Result<Arc<AppState>, ClientError> {
        Ok(self.store.dispatch(action)?.await?)
    }

    /// Surface a facade failure as an error notification before returning it.
    async fn report<T>(&self, outcome: Result<T, ApiError>) -> Result<T, ClientError> {
        match outcome {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(e) = self.apply(self.notifier.error(err.to_string())).await {
                    tracing::warn!(error = %e, "Failed to raise error notification");
                }
                Err(err.into())
            }
        }
    }
}

impl Drop for IncidentClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Subscriber writing the dark-mode flag whenever it changes.
fn persist_dark_mode(preferences: PreferencesStore, initial: bool) -> Subscriber {
    let last = Mutex::new(initial);
    Arc::new(move |state: &Arc<AppState>| {
        let dark_mode = state.ui.dark_mode;
        {
            let mut last = last.lock();
            if *last == dark_mode {
                return;
            }
            *last = dark_mode;
        }
        if let Err(e) = preferences.save(&Preferences { dark_mode }) {
            tracing::warn!(error = %e, "Failed to persist dark mode");
        }
    })
}
