use std::collections::HashMap;

use chrono::Utc;
use salesdesk_core::api::deals::{
    BoardResponse, DealResponse, MoveDealRequest, StageColumnResponse,
};
use salesdesk_core::{Identity, PipelineStage};
use salesdesk_db::repo::{DealRepo, PipelineRepo, StageRepo};
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::access_control::authorize;
use crate::domains::errors::ServiceError;
use crate::infra::metrics;

pub async fn board(
    state: &AppState,
    identity: &Identity,
    pipeline_id: Uuid,
) -> Result<BoardResponse, ServiceError> {
    authorize(state, identity, "read", &format!("pipelines/{pipeline_id}"))?;

    let db_err = |err: sqlx_core::Error| {
        tracing::error!(event = "board_load_failed", error = %err, "DB error");
        ServiceError::DbError
    };
    let pipeline = PipelineRepo::new(&state.db)
        .get_by_id(pipeline_id)
        .await
        .map_err(db_err)?
        .ok_or(ServiceError::NotFound)?;
    let stages = StageRepo::new(&state.db)
        .list_by_pipeline(pipeline_id)
        .await
        .map_err(db_err)?;
    let deals = DealRepo::new(&state.db)
        .list_by_pipeline(pipeline_id)
        .await
        .map_err(db_err)?;

    let mut by_stage: HashMap<Uuid, Vec<DealResponse>> = HashMap::new();
    for deal in deals {
        by_stage
            .entry(deal.stage_id)
            .or_default()
            .push(DealResponse::from(deal));
    }
    let stages: Vec<StageColumnResponse> = stages
        .into_iter()
        .map(|stage| StageColumnResponse {
            deals: by_stage.remove(&stage.id).unwrap_or_default(),
            stage_id: stage.id,
            name: stage.name,
            position: stage.position,
        })
        .collect();

    tracing::info!(
        event = "board_fetched",
        pipeline_id = %pipeline_id,
        stages = stages.len(),
        "Board fetched"
    );
    Ok(BoardResponse {
        pipeline_id: pipeline.id,
        name: pipeline.name,
        stages,
    })
}

/// Reassigns a deal to a stage of the same pipeline at `position`.
pub async fn move_deal(
    state: &AppState,
    identity: &Identity,
    deal_id: Uuid,
    payload: MoveDealRequest,
) -> Result<DealResponse, ServiceError> {
    authorize(state, identity, "write", &format!("deals/{deal_id}"))?;
    if payload.position < 0 {
        return Err(ServiceError::BadRequest("invalid_position"));
    }

    let result = apply_move(state, deal_id, payload).await;
    metrics::deal_moved(if result.is_ok() { "ok" } else { "error" });
    result
}

async fn apply_move(
    state: &AppState,
    deal_id: Uuid,
    payload: MoveDealRequest,
) -> Result<DealResponse, ServiceError> {
    let db_err = |err: sqlx_core::Error| {
        tracing::error!(event = "deal_move_failed", error = %err, "DB error");
        ServiceError::DbError
    };
    let deals = DealRepo::new(&state.db);
    let stages = StageRepo::new(&state.db);

    let deal = deals
        .get_by_id(deal_id)
        .await
        .map_err(db_err)?
        .ok_or(ServiceError::NotFound)?;
    let target = stages
        .get_by_id(payload.stage_id)
        .await
        .map_err(db_err)?
        .ok_or(ServiceError::BadRequest("unknown_stage"))?;
    let source: Option<PipelineStage> = stages.get_by_id(deal.stage_id).await.map_err(db_err)?;
    if source.is_some_and(|source| source.pipeline_id != target.pipeline_id) {
        tracing::warn!(
            event = "deal_move_rejected",
            deal_id = %deal_id,
            reason = "unknown_stage",
        );
        return Err(ServiceError::BadRequest("unknown_stage"));
    }

    let moved = deals
        .move_to_stage(deal_id, target.id, payload.position, Utc::now())
        .await
        .map_err(db_err)?
        .ok_or(ServiceError::NotFound)?;
    tracing::info!(
        event = "deal_moved",
        deal_id = %deal_id,
        from_stage = %deal.stage_id,
        to_stage = %moved.stage_id,
        position = moved.position,
        "Deal moved"
    );
    Ok(moved.into())
}
