use std::sync::Arc;

use tracing::info;

use shared_config::AppConfig;
use shared_models::notification::NotificationSender;

use crate::memory::InMemoryStore;
use crate::postgrest::PostgrestStore;
use crate::store::{AppointmentStore, CatalogStore, ProfileStore, UserStore};

/// Shared router state: configuration, stores, and the notification sender.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub notifier: Arc<dyn NotificationSender>,
}

impl AppState {
    /// Wires every store to the same backing implementation.
    pub fn with_store<S>(config: AppConfig, store: Arc<S>, notifier: Arc<dyn NotificationSender>) -> Self
    where
        S: UserStore + ProfileStore + CatalogStore + AppointmentStore + 'static,
    {
        Self {
            config: Arc::new(config),
            users: store.clone(),
            profiles: store.clone(),
            catalog: store.clone(),
            appointments: store,
            notifier,
        }
    }

    pub fn in_memory(config: AppConfig, notifier: Arc<dyn NotificationSender>) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()), notifier)
    }

    /// PostgREST when Supabase is configured, otherwise the in-memory store.
    pub fn from_config(config: AppConfig, notifier: Arc<dyn NotificationSender>) -> Self {
        if config.is_database_configured() {
            info!("Using PostgREST store at {}", config.supabase_url);
            let store = Arc::new(PostgrestStore::new(&config));
            Self::with_store(config, store, notifier)
        } else {
            info!("Using in-memory store");
            Self::in_memory(config, notifier)
        }
    }
}
