use std::sync::Arc;

use shared_config::{AppConfig, StoreBackend};
use tracing::info;

use crate::locks::SlotLocks;
use crate::memory::InMemoryStore;
use crate::postgrest::SupabaseStore;
use crate::repository::HospitalStore;

/// Shared state handed to every router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn HospitalStore>,
    pub slot_locks: Arc<SlotLocks>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn HospitalStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            slot_locks: Arc::new(SlotLocks::new()),
        }
    }

    /// Builds the store selected by `STORE_BACKEND`.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn HospitalStore> = match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Arc::new(InMemoryStore::new())
            }
            StoreBackend::Supabase => {
                info!("Using Supabase store at {}", config.supabase_url);
                Arc::new(SupabaseStore::new(&config))
            }
        };
        Self::new(config, store)
    }
}
