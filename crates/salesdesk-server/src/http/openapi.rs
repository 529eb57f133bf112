use aide::axum::{
    routing::{delete, get, post, put},
    ApiRouter,
};
use aide::openapi::{Info, OpenApi};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use salesdesk_core::api::deals::{BoardResponse, DealResponse, MoveDealRequest};
use salesdesk_core::api::groups::{
    AddMemberRequest, CreateGroupRequest, GroupListResponse, GroupMemberResponse, GroupResponse,
    ListGroupsQuery, ReplaceMembersRequest, ReplaceMembersResponse, UpdateGroupRequest,
};
use salesdesk_core::api::users::{ListUsersQuery, UserListResponse, UserResponse};
use salesdesk_core::{MemberRole, UserRole};
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::access_control::http_admin::ReloadResponse;
use crate::http::routes::health::HealthResponse;

pub fn build_openapi() -> OpenApi {
    let mut api = OpenApi {
        info: Info {
            title: "salesdesk-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let _ = doc_router().finish_api(&mut api);
    api
}

// Schema-only mirror of the live router; handlers here never run.
fn doc_router() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/health", get(health))
        .api_route("/admin/policies/reload", post(admin_reload))
        .api_route("/v1/groups", get(groups_list).post(groups_create))
        .api_route(
            "/v1/groups/:id",
            get(groups_get).put(groups_update).delete(groups_delete),
        )
        .api_route(
            "/v1/groups/:id/members",
            put(groups_replace_members).post(groups_add_member),
        )
        .api_route(
            "/v1/groups/:id/members/:user_id",
            delete(groups_remove_member),
        )
        .api_route("/v1/users", get(users_list))
        .api_route("/v1/users/:id", get(users_get))
        .api_route("/v1/pipelines/:id/board", get(pipelines_board))
        .api_route("/v1/deals/:id/stage", put(deals_move))
}

fn not_implemented<T>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::NOT_IMPLEMENTED, Json(body))
}

fn empty_group() -> GroupResponse {
    GroupResponse {
        id: Uuid::nil(),
        name: String::new(),
        leader_id: Uuid::nil(),
        leader: None,
        members: Vec::new(),
        created_at: Default::default(),
        updated_at: Default::default(),
    }
}

async fn health() -> (StatusCode, Json<HealthResponse>) {
    not_implemented(HealthResponse {
        status: "not_implemented",
        version: "0.0.0",
        build_commit: None,
        uptime_seconds: 0,
    })
}

async fn admin_reload() -> (StatusCode, Json<ReloadResponse>) {
    not_implemented(ReloadResponse {
        status: "not_implemented",
        rules: 0,
    })
}

async fn groups_list(
    Query(_query): Query<ListGroupsQuery>,
) -> (StatusCode, Json<GroupListResponse>) {
    not_implemented(GroupListResponse { groups: Vec::new() })
}

async fn groups_create(
    Json(_payload): Json<CreateGroupRequest>,
) -> (StatusCode, Json<GroupResponse>) {
    not_implemented(empty_group())
}

async fn groups_get(Path(_id): Path<Uuid>) -> (StatusCode, Json<GroupResponse>) {
    not_implemented(empty_group())
}

async fn groups_update(
    Path(_id): Path<Uuid>,
    Json(_payload): Json<UpdateGroupRequest>,
) -> (StatusCode, Json<GroupResponse>) {
    not_implemented(empty_group())
}

async fn groups_delete(Path(_id): Path<Uuid>) -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

async fn groups_replace_members(
    Path(_id): Path<Uuid>,
    Json(_payload): Json<ReplaceMembersRequest>,
) -> (StatusCode, Json<ReplaceMembersResponse>) {
    not_implemented(ReplaceMembersResponse {
        members: Vec::new(),
    })
}

async fn groups_add_member(
    Path(_id): Path<Uuid>,
    Json(_payload): Json<AddMemberRequest>,
) -> (StatusCode, Json<GroupMemberResponse>) {
    not_implemented(GroupMemberResponse {
        id: Uuid::nil(),
        group_id: Uuid::nil(),
        user_id: Uuid::nil(),
        role: MemberRole::Member,
        joined_at: Default::default(),
        user: None,
    })
}

async fn groups_remove_member(Path((_id, _user_id)): Path<(Uuid, Uuid)>) -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

async fn users_list(Query(_query): Query<ListUsersQuery>) -> (StatusCode, Json<UserListResponse>) {
    not_implemented(UserListResponse { users: Vec::new() })
}

async fn users_get(Path(_id): Path<Uuid>) -> (StatusCode, Json<UserResponse>) {
    not_implemented(UserResponse {
        id: Uuid::nil(),
        name: String::new(),
        email: String::new(),
        role: UserRole::Sales,
        created_at: Default::default(),
    })
}

async fn pipelines_board(Path(_id): Path<Uuid>) -> (StatusCode, Json<BoardResponse>) {
    not_implemented(BoardResponse {
        pipeline_id: Uuid::nil(),
        name: String::new(),
        stages: Vec::new(),
    })
}

async fn deals_move(
    Path(_id): Path<Uuid>,
    Json(_payload): Json<MoveDealRequest>,
) -> (StatusCode, Json<DealResponse>) {
    not_implemented(DealResponse {
        id: Uuid::nil(),
        title: String::new(),
        value_cents: 0,
        stage_id: Uuid::nil(),
        owner_id: None,
        position: 0,
        updated_at: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_membership_and_board_routes() {
        let api = build_openapi();
        let paths = api.paths.expect("paths");
        let keys: Vec<&String> = paths.paths.keys().collect();
        assert!(keys.iter().any(|key| key.as_str() == "/v1/groups"));
        for suffix in ["/members", "/board", "/stage"] {
            assert!(
                keys.iter().any(|key| key.ends_with(suffix)),
                "missing route ending in {suffix}"
            );
        }
    }
}
