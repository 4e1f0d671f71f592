use std::sync::Arc;

use shared_config::AppConfig;

use crate::supabase::StoreClient;

/// Process-wide shared state: configuration plus the single store client.
/// Constructed once in `main` and handed to every router, so the connection
/// pool lives for the whole process instead of hiding behind a module-level
/// singleton.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<StoreClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(&config));
        Self { config, store }
    }
}
