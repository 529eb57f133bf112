use crate::app::AppState;
use axum::Router;

pub mod openapi;
pub mod routes;

pub fn router() -> Router<AppState> {
    routes::router()
}
