use salesdesk_core::api::users::{ListUsersQuery, UserResponse};
use salesdesk_core::{Identity, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use salesdesk_db::repo::UserRepo;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::access_control::authorize;
use crate::domains::errors::ServiceError;

pub async fn list_users(
    state: &AppState,
    identity: &Identity,
    query: ListUsersQuery,
) -> Result<Vec<UserResponse>, ServiceError> {
    authorize(state, identity, "list", "users")?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = UserRepo::new(&state.db)
        .list(limit, offset)
        .await
        .map_err(|err| {
            tracing::error!(event = "users_list_failed", error = %err, "DB error");
            ServiceError::DbError
        })?;
    tracing::info!(event = "users_listed", count = users.len(), "Users listed");
    Ok(users.into_iter().map(UserResponse::from).collect())
}

pub async fn get_user(
    state: &AppState,
    identity: &Identity,
    user_id: Uuid,
) -> Result<UserResponse, ServiceError> {
    authorize(state, identity, "read", &format!("users/{user_id}"))?;
    match UserRepo::new(&state.db).get_by_id(user_id).await {
        Ok(Some(user)) => Ok(user.into()),
        Ok(None) => Err(ServiceError::NotFound),
        Err(err) => {
            tracing::error!(event = "users_get_failed", error = %err, "DB error");
            Err(ServiceError::DbError)
        }
    }
}
