//! Shared application state.

use std::sync::Arc;

use chrono::Duration;

use shopdesk_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::images::ImageStore;

/// Immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, images: Arc<dyn ImageStore>) -> Self {
        let jwt = JwtManager::new(
            &config.secret_key,
            config.algorithm,
            Duration::minutes(config.access_token_expire_minutes),
        );

        Self {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            images,
        }
    }
}
