use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Extension, Json,
    Router,
};
use salesdesk_core::api::ErrorResponse;
use salesdesk_core::Identity;
use schemars::JsonSchema;
use serde::Serialize;

use crate::app::AppState;
use crate::domains::access_control::authorize;
use crate::domains::access_control::policies::{PolicyRule, PolicySet};

const RESOURCE: &str = "admin/policies";

#[derive(Serialize, JsonSchema)]
pub(crate) struct ReloadResponse {
    pub(crate) status: &'static str,
    pub(crate) rules: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/policies/reload", post(reload))
}

fn bad_request(code: &str) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(code))).into_response()
}

#[tracing::instrument(skip(state, identity))]
async fn reload(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> impl IntoResponse {
    if let Err(err) = authorize(&state, &identity, "write", RESOURCE) {
        return err.into_response();
    }

    let Some(path) = state.config.policy.file.as_deref() else {
        return bad_request("policy_file_not_configured");
    };
    let Ok(contents) = std::fs::read_to_string(path) else {
        tracing::error!(event = "policies_reload_failed", path, "Policy file unreadable");
        return bad_request("policy_file_read_failed");
    };
    let rules: Vec<PolicyRule> = match serde_yaml::from_str(&contents) {
        Ok(rules) => rules,
        Err(err) => {
            tracing::error!(event = "policies_reload_failed", path, error = %err);
            return bad_request("policy_file_invalid");
        }
    };

    let count = rules.len();
    state.policy_store.set(PolicySet::from_rules(rules));
    tracing::info!(event = "policies_reloaded", rules = count, "Policies reloaded");
    (
        StatusCode::OK,
        Json(ReloadResponse {
            status: "ok",
            rules: count,
        }),
    )
        .into_response()
}
