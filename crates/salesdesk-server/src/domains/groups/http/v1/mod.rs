use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use salesdesk_core::api::groups::{
    AddMemberRequest, CreateGroupRequest, GroupListResponse, ListGroupsQuery,
    ReplaceMembersRequest, UpdateGroupRequest,
};
use salesdesk_core::Identity;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::groups::service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/groups", get(list_groups).post(create_group))
        .route(
            "/v1/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route(
            "/v1/groups/:id/members",
            put(replace_members).post(add_member),
        )
        .route("/v1/groups/:id/members/:user_id", delete(remove_member))
}

#[tracing::instrument(skip(state, identity, query))]
async fn list_groups(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListGroupsQuery>,
) -> impl IntoResponse {
    match service::list_groups(&state, &identity, query).await {
        Ok(groups) => (StatusCode::OK, Json(GroupListResponse { groups })).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity, payload))]
async fn create_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    match service::create_group(&state, &identity, payload).await {
        Ok(group) => (StatusCode::CREATED, Json(group)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity), fields(group_id = %group_id))]
async fn get_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    match service::get_group(&state, &identity, group_id).await {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity, payload), fields(group_id = %group_id))]
async fn update_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> impl IntoResponse {
    match service::update_group(&state, &identity, group_id, payload).await {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity), fields(group_id = %group_id))]
async fn delete_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    match service::delete_group(&state, &identity, group_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity, payload), fields(group_id = %group_id))]
async fn replace_members(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ReplaceMembersRequest>,
) -> impl IntoResponse {
    match service::replace_members(&state, &identity, group_id, payload).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity, payload), fields(group_id = %group_id))]
async fn add_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> impl IntoResponse {
    match service::add_member(&state, &identity, group_id, payload.user_id).await {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity), fields(group_id = %group_id, user_id = %user_id))]
async fn remove_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    match service::remove_member(&state, &identity, group_id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
