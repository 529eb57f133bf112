use crate::app::AppState;
use axum::{middleware, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(crate::domains::groups::http::v1::router())
        .merge(crate::domains::users::http::v1::router())
        .merge(crate::domains::deals::http::v1::router())
        .layer(middleware::from_fn(crate::domains::auth::auth_middleware))
}
