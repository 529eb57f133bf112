use axum::{extract::DefaultBodyLimit, Extension, Router};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::domains::access_control::policy_store::PolicyStore;
use crate::domains::auth::tokens::TokenKeys;
use crate::settings::DbTxIsolation;
use salesdesk_db::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub db_tx_isolation: DbTxIsolation,
    pub started_at: Instant,
    pub tokens: Arc<TokenKeys>,
    pub config: ServerConfig,
    pub policy_store: PolicyStore,
}

pub fn build_router(state: AppState) -> Router {
    let extension_state = state.clone();
    let max_body_bytes = state.config.server.max_body_bytes;
    crate::http::router()
        .with_state(state)
        .layer(Extension(extension_state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
