use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use chrono::Utc;
use salesdesk_core::api::groups::{
    CreateGroupRequest, GroupMemberResponse, GroupResponse, ListGroupsQuery,
    ReplaceMembersRequest, ReplaceMembersResponse, UpdateGroupRequest,
};
use salesdesk_core::api::users::UserSummary;
use salesdesk_core::{
    Group, GroupMember, Identity, MemberRole, User, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use salesdesk_db::repo::{GroupMemberRepo, GroupRepo, UserRepo};
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::access_control::authorize;
use crate::domains::errors::ServiceError;
use crate::infra::{db::apply_tx_isolation, metrics};

pub type GroupError = ServiceError;

pub async fn list_groups(
    state: &AppState,
    identity: &Identity,
    query: ListGroupsQuery,
) -> Result<Vec<GroupResponse>, GroupError> {
    authorize(state, identity, "list", "groups")?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    let sort = query.sort.as_deref().unwrap_or("desc");

    let groups = GroupRepo::new(&state.db)
        .list(limit, offset, sort)
        .await
        .map_err(|err| {
            tracing::error!(event = "groups_list_failed", error = %err, "DB error");
            GroupError::DbError
        })?;

    let mut responses = Vec::with_capacity(groups.len());
    for group in groups {
        responses.push(group_response(state, group).await?);
    }
    tracing::info!(
        event = "groups_listed",
        count = responses.len(),
        "Groups listed"
    );
    Ok(responses)
}

pub async fn get_group(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
) -> Result<GroupResponse, GroupError> {
    authorize(state, identity, "read", &format!("groups/{group_id}"))?;
    let group = load_group(state, group_id).await?;
    let response = group_response(state, group).await?;
    tracing::info!(
        event = "group_fetched",
        group_id = %group_id,
        members = response.members.len(),
        "Group fetched"
    );
    Ok(response)
}

pub async fn create_group(
    state: &AppState,
    identity: &Identity,
    payload: CreateGroupRequest,
) -> Result<GroupResponse, GroupError> {
    authorize(state, identity, "write", "groups")?;

    let name = validated_name(&payload.name)?;
    let leader_id = payload
        .leader_id
        .ok_or(GroupError::BadRequest("leader_required"))?;
    ensure_leader_exists(state, leader_id).await?;

    let now = Utc::now();
    let group = Group {
        id: Uuid::now_v7(),
        name,
        leader_id,
        created_at: now,
        updated_at: now,
    };
    GroupRepo::new(&state.db).create(&group).await.map_err(|err| {
        tracing::error!(event = "group_create_failed", error = %err, "DB error");
        GroupError::DbError
    })?;

    tracing::info!(
        event = "group_created",
        group_id = %group.id,
        leader_id = %leader_id,
        "Group created"
    );
    group_response(state, group).await
}

pub async fn update_group(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
    payload: UpdateGroupRequest,
) -> Result<GroupResponse, GroupError> {
    authorize(state, identity, "write", &format!("groups/{group_id}"))?;
    if payload.is_empty() {
        return Err(GroupError::NoChanges);
    }

    let mut group = load_group(state, group_id).await?;
    let mut updated = false;
    if let Some(name) = payload.name.as_deref() {
        let name = validated_name(name)?;
        if name != group.name {
            group.name = name;
            updated = true;
        }
    }
    if let Some(leader_id) = payload.leader_id {
        if leader_id != group.leader_id {
            ensure_leader_exists(state, leader_id).await?;
            group.leader_id = leader_id;
            updated = true;
        }
    }
    if !updated {
        return Err(GroupError::NoChanges);
    }

    group.updated_at = Utc::now();
    let affected = GroupRepo::new(&state.db)
        .update(group.id, &group.name, group.leader_id, group.updated_at)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_update_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    if affected == 0 {
        return Err(GroupError::NotFound);
    }

    tracing::info!(
        event = "group_updated",
        group_id = %group.id,
        leader_id = %group.leader_id,
        "Group updated"
    );
    group_response(state, group).await
}

pub async fn delete_group(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
) -> Result<(), GroupError> {
    authorize(state, identity, "delete", &format!("groups/{group_id}"))?;
    let affected = GroupRepo::new(&state.db)
        .delete_by_id(group_id)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_delete_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    if affected == 0 {
        return Err(GroupError::NotFound);
    }
    tracing::info!(event = "group_deleted", group_id = %group_id, "Group deleted");
    Ok(())
}

/// Makes the group's membership exactly `payload.user_ids` (plus the
/// leader) in one transaction. Replaying the same target is a no-op.
pub async fn replace_members(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
    payload: ReplaceMembersRequest,
) -> Result<ReplaceMembersResponse, GroupError> {
    authorize(state, identity, "write", &format!("groups/{group_id}/members"))?;
    let started = Instant::now();
    let result = apply_replace(state, group_id, payload.user_ids).await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(GroupError::BadRequest(_) | GroupError::NotFound) => "rejected",
        Err(_) => "error",
    };
    metrics::member_reconcile(outcome, started.elapsed().as_secs_f64());
    result
}

async fn apply_replace(
    state: &AppState,
    group_id: Uuid,
    user_ids: Vec<Uuid>,
) -> Result<ReplaceMembersResponse, GroupError> {
    let group = load_group(state, group_id).await?;
    let target: Vec<Uuid> = user_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let missing = UserRepo::new(&state.db)
        .missing_ids(&target)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_members_replace_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    if !missing.is_empty() {
        tracing::warn!(
            event = "group_members_replace_rejected",
            group_id = %group_id,
            reason = "unknown_user",
            unknown = missing.len(),
        );
        return Err(GroupError::BadRequest("unknown_user"));
    }

    let db_err = |err: sqlx_core::Error| {
        tracing::error!(event = "group_members_replace_failed", error = %err, "DB error");
        GroupError::DbError
    };
    let mut tx = state.db.begin().await.map_err(db_err)?;
    apply_tx_isolation(&mut *tx, state.db_tx_isolation)
        .await
        .map_err(db_err)?;
    let Some(members) = GroupMemberRepo::replace_in(&mut *tx, group.id, &target, Utc::now())
        .await
        .map_err(db_err)?
    else {
        tx.rollback().await.map_err(db_err)?;
        return Err(GroupError::NotFound);
    };
    tx.commit().await.map_err(db_err)?;

    tracing::info!(
        event = "group_members_replaced",
        group_id = %group_id,
        requested = target.len(),
        members = members.len(),
        "Group membership replaced"
    );
    let users = user_summaries(state, members.iter().map(|member| member.user_id)).await?;
    Ok(ReplaceMembersResponse {
        members: members
            .into_iter()
            .map(|member| member_response(member, &users))
            .collect(),
    })
}

pub async fn add_member(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<GroupMemberResponse, GroupError> {
    authorize(state, identity, "write", &format!("groups/{group_id}/members"))?;
    let group = load_group(state, group_id).await?;
    let user = UserRepo::new(&state.db)
        .get_by_id(user_id)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_member_add_failed", error = %err, "DB error");
            GroupError::DbError
        })?
        .ok_or(GroupError::BadRequest("unknown_user"))?;

    let member = GroupMember {
        id: Uuid::now_v7(),
        group_id: group.id,
        user_id,
        role: MemberRole::Member,
        joined_at: Utc::now(),
    };
    let inserted = GroupMemberRepo::new(&state.db)
        .create(&member)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_member_add_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    if !inserted {
        return Err(GroupError::Conflict("already_member"));
    }

    tracing::info!(
        event = "group_member_added",
        group_id = %group_id,
        user_id = %user_id,
        "Group member added"
    );
    Ok(GroupMemberResponse::from_member(
        member,
        Some(UserSummary::from(&user)),
    ))
}

pub async fn remove_member(
    state: &AppState,
    identity: &Identity,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<(), GroupError> {
    authorize(state, identity, "write", &format!("groups/{group_id}/members"))?;
    let group = load_group(state, group_id).await?;
    if group.leader_id == user_id {
        return Err(GroupError::BadRequest("cannot_remove_leader"));
    }
    let affected = GroupMemberRepo::new(&state.db)
        .delete(group_id, user_id)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_member_remove_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    if affected == 0 {
        return Err(GroupError::NotFound);
    }
    tracing::info!(
        event = "group_member_removed",
        group_id = %group_id,
        user_id = %user_id,
        "Group member removed"
    );
    Ok(())
}

fn validated_name(raw: &str) -> Result<String, GroupError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(GroupError::BadRequest("invalid_name"));
    }
    Ok(name.to_string())
}

async fn load_group(state: &AppState, group_id: Uuid) -> Result<Group, GroupError> {
    match GroupRepo::new(&state.db).get_by_id(group_id).await {
        Ok(Some(group)) => Ok(group),
        Ok(None) => Err(GroupError::NotFound),
        Err(err) => {
            tracing::error!(event = "group_get_failed", error = %err, "DB error");
            Err(GroupError::DbError)
        }
    }
}

async fn ensure_leader_exists(state: &AppState, leader_id: Uuid) -> Result<(), GroupError> {
    match UserRepo::new(&state.db).get_by_id(leader_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(GroupError::BadRequest("unknown_leader")),
        Err(err) => {
            tracing::error!(event = "group_leader_lookup_failed", error = %err, "DB error");
            Err(GroupError::DbError)
        }
    }
}

async fn user_summaries(
    state: &AppState,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, GroupError> {
    let ids: Vec<Uuid> = ids.collect();
    let users = UserRepo::new(&state.db)
        .list_by_ids(&ids)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_users_lookup_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    Ok(users
        .iter()
        .map(|user: &User| (user.id, UserSummary::from(user)))
        .collect())
}

fn member_response(member: GroupMember, users: &HashMap<Uuid, UserSummary>) -> GroupMemberResponse {
    let user = users.get(&member.user_id).cloned();
    GroupMemberResponse::from_member(member, user)
}

async fn group_response(state: &AppState, group: Group) -> Result<GroupResponse, GroupError> {
    let members = GroupMemberRepo::new(&state.db)
        .list_by_group(group.id)
        .await
        .map_err(|err| {
            tracing::error!(event = "group_members_list_failed", error = %err, "DB error");
            GroupError::DbError
        })?;
    let users = user_summaries(
        state,
        members
            .iter()
            .map(|member| member.user_id)
            .chain(std::iter::once(group.leader_id)),
    )
    .await?;
    let leader = users.get(&group.leader_id).cloned();
    let members = members
        .into_iter()
        .map(|member| member_response(member, &users))
        .collect();
    Ok(GroupResponse::from_group(group, leader, members))
}
