use crate::app::AppState;
use axum::{middleware, Router};

pub(crate) mod health;
pub mod v1;

pub fn router() -> Router<AppState> {
    let admin = Router::new()
        .merge(crate::domains::access_control::http_admin::router())
        .layer(middleware::from_fn(crate::domains::auth::auth_middleware));

    Router::new()
        .merge(health::router())
        .merge(admin)
        .merge(v1::router())
}
