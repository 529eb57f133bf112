use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use salesdesk_core::api::users::{ListUsersQuery, UserListResponse};
use salesdesk_core::Identity;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::users::service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/:id", get(get_user))
}

#[tracing::instrument(skip(state, identity, query))]
async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListUsersQuery>,
) -> impl IntoResponse {
    match service::list_users(&state, &identity, query).await {
        Ok(users) => (StatusCode::OK, Json(UserListResponse { users })).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity), fields(user_id = %user_id))]
async fn get_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    match service::get_user(&state, &identity, user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}
