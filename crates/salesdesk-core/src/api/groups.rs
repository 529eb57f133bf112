use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::UserSummary;
use crate::{Group, GroupMember, MemberRole};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListGroupsQuery {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<Uuid>,
}

impl UpdateGroupRequest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.leader_id.is_none()
    }
}

/// Full replacement of a group's membership.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplaceMembersRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplaceMembersResponse {
    pub members: Vec<GroupMemberResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupMemberResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl GroupMemberResponse {
    #[must_use]
    pub fn from_member(member: GroupMember, user: Option<UserSummary>) -> Self {
        Self {
            id: member.id,
            group_id: member.group_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Uuid,
    #[serde(default)]
    pub leader: Option<UserSummary>,
    #[serde(default)]
    pub members: Vec<GroupMemberResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupResponse {
    #[must_use]
    pub fn from_group(
        group: Group,
        leader: Option<UserSummary>,
        members: Vec<GroupMemberResponse>,
    ) -> Self {
        Self {
            id: group.id,
            name: group.name,
            leader_id: group.leader_id,
            leader,
            members,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupListResponse {
    pub groups: Vec<GroupResponse>,
}
