use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Deal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DealResponse {
    pub id: Uuid,
    pub title: String,
    pub value_cents: i64,
    pub stage_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub position: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<Deal> for DealResponse {
    fn from(deal: Deal) -> Self {
        Self {
            id: deal.id,
            title: deal.title,
            value_cents: deal.value_cents,
            stage_id: deal.stage_id,
            owner_id: deal.owner_id,
            position: deal.position,
            updated_at: deal.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageColumnResponse {
    pub stage_id: Uuid,
    pub name: String,
    pub position: i32,
    pub deals: Vec<DealResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoardResponse {
    pub pipeline_id: Uuid,
    pub name: String,
    pub stages: Vec<StageColumnResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MoveDealRequest {
    pub stage_id: Uuid,
    pub position: i32,
}
