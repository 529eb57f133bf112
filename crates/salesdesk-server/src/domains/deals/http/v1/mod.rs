use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use salesdesk_core::api::deals::MoveDealRequest;
use salesdesk_core::Identity;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::deals::service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/pipelines/:id/board", get(board))
        .route("/v1/deals/:id/stage", put(move_deal))
}

#[tracing::instrument(skip(state, identity), fields(pipeline_id = %pipeline_id))]
async fn board(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(pipeline_id): Path<Uuid>,
) -> impl IntoResponse {
    match service::board(&state, &identity, pipeline_id).await {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip(state, identity, payload), fields(deal_id = %deal_id))]
async fn move_deal(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(deal_id): Path<Uuid>,
    Json(payload): Json<MoveDealRequest>,
) -> impl IntoResponse {
    match service::move_deal(&state, &identity, deal_id, payload).await {
        Ok(deal) => (StatusCode::OK, Json(deal)).into_response(),
        Err(err) => err.into_response(),
    }
}
