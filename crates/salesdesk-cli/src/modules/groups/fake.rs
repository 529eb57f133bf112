//! In-memory [`GroupsApi`] with a call log, injectable failures and a
//! record of what the client cache held while a batch was in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use salesdesk_core::api::groups::{
    CreateGroupRequest, GroupMemberResponse, GroupResponse, ReplaceMembersResponse,
    UpdateGroupRequest,
};
use salesdesk_core::api::users::UserSummary;
use salesdesk_core::{GroupView, MemberRole};
use uuid::Uuid;

use super::api::{ApiError, GroupListParams, GroupsApi};
use super::cache::QueryCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(String, Uuid),
    Update(Uuid),
    Replace(Uuid, Vec<Uuid>),
    FetchGroup(Uuid),
    FetchGroups,
    FetchUsers,
}

/// Detail and list entries as they stood when a batch reached the backend.
#[derive(Debug, Clone)]
pub(crate) struct InFlightView {
    pub detail: Option<GroupView>,
    pub list: Option<Vec<GroupView>>,
}

#[derive(Default)]
struct FakeState {
    groups: Vec<GroupResponse>,
    users: HashMap<Uuid, UserSummary>,
    calls: Vec<Call>,
    fail_update: Option<ApiError>,
    fail_replace: Option<ApiError>,
    observed: Option<Arc<QueryCache>>,
    in_flight: Vec<InFlightView>,
    next_id: u128,
}

#[derive(Clone, Default)]
pub(crate) struct FakeGroupsApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGroupsApi {
    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock")
    }

    pub(crate) fn add_user(&self, id: u128, name: &str) {
        let user = UserSummary {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        };
        self.lock().users.insert(user.id, user);
    }

    pub(crate) fn insert_group(&self, name: &str, leader_id: Uuid, members: &[Uuid]) -> Uuid {
        let mut state = self.lock();
        let group_id = state.new_id();
        let now = Utc::now();
        let mut group = GroupResponse {
            id: group_id,
            name: name.to_string(),
            leader_id,
            leader: state.users.get(&leader_id).cloned(),
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let rows: Vec<GroupMemberResponse> = std::iter::once(leader_id)
            .chain(members.iter().copied())
            .map(|user_id| state.member_row(&group, user_id))
            .collect();
        group.members = rows;
        state.groups.push(group);
        group_id
    }

    pub(crate) fn fail_update_with(&self, err: ApiError) {
        self.lock().fail_update = Some(err);
    }

    pub(crate) fn fail_replace_with(&self, err: ApiError) {
        self.lock().fail_replace = Some(err);
    }

    pub(crate) fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_update = None;
        state.fail_replace = None;
    }

    /// Cache whose group entries are recorded on every batch call.
    pub(crate) fn observe(&self, cache: Arc<QueryCache>) {
        self.lock().observed = Some(cache);
    }

    pub(crate) fn in_flight(&self) -> Vec<InFlightView> {
        self.lock().in_flight.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl FakeState {
    fn new_id(&mut self) -> Uuid {
        self.next_id += 1;
        Uuid::from_u128(0xC0DE_0000 + self.next_id)
    }

    fn member_row(&self, group: &GroupResponse, user_id: Uuid) -> GroupMemberResponse {
        GroupMemberResponse {
            id: Uuid::from_u128(0xBEEF_0000 + user_id.as_u128()),
            group_id: group.id,
            user_id,
            role: if user_id == group.leader_id {
                MemberRole::Leader
            } else {
                MemberRole::Member
            },
            joined_at: group.created_at,
            user: self.users.get(&user_id).cloned(),
        }
    }

    fn group_mut(&mut self, group_id: Uuid) -> Result<&mut GroupResponse, ApiError> {
        self.groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                code: "not_found".to_string(),
            })
    }
}

impl GroupsApi for FakeGroupsApi {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<GroupResponse, ApiError> {
        let leader_id = request.leader_id.ok_or_else(|| ApiError::Status {
            status: 400,
            code: "leader_required".to_string(),
        })?;
        self.lock()
            .calls
            .push(Call::Create(request.name.clone(), leader_id));
        let group_id = self.insert_group(&request.name, leader_id, &[]);
        let state = self.lock();
        state
            .groups
            .iter()
            .find(|group| group.id == group_id)
            .cloned()
            .ok_or(ApiError::Decode("created group vanished".to_string()))
    }

    async fn update_group(
        &self,
        group_id: Uuid,
        request: &UpdateGroupRequest,
    ) -> Result<GroupResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::Update(group_id));
        if let Some(err) = state.fail_update.clone() {
            return Err(err);
        }
        let group = state.group_mut(group_id)?;
        if let Some(name) = &request.name {
            group.name = name.clone();
        }
        if let Some(leader_id) = request.leader_id {
            group.leader_id = leader_id;
            for member in &mut group.members {
                member.role = if member.user_id == leader_id {
                    MemberRole::Leader
                } else {
                    MemberRole::Member
                };
            }
        }
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    async fn replace_group_members(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<ReplaceMembersResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::Replace(group_id, user_ids.to_vec()));
        if let Some(cache) = state.observed.clone() {
            state.in_flight.push(InFlightView {
                detail: cache.group(group_id),
                list: cache.groups(),
            });
        }
        if let Some(err) = state.fail_replace.clone() {
            return Err(err);
        }
        let snapshot = state.group_mut(group_id)?.clone();
        let mut members = Vec::new();
        for user_id in std::iter::once(snapshot.leader_id).chain(user_ids.iter().copied()) {
            if members
                .iter()
                .any(|row: &GroupMemberResponse| row.user_id == user_id)
            {
                continue;
            }
            let row = snapshot
                .members
                .iter()
                .find(|row| row.user_id == user_id)
                .cloned()
                .unwrap_or_else(|| state.member_row(&snapshot, user_id));
            members.push(row);
        }
        let group = state.group_mut(group_id)?;
        group.members = members.clone();
        group.updated_at = Utc::now();
        Ok(ReplaceMembersResponse { members })
    }

    async fn fetch_group(&self, group_id: Uuid) -> Result<GroupResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::FetchGroup(group_id));
        state.group_mut(group_id).map(|group| group.clone())
    }

    async fn fetch_groups(&self, _params: &GroupListParams) -> Result<Vec<GroupResponse>, ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::FetchGroups);
        Ok(state.groups.clone())
    }

    async fn fetch_users(&self) -> Result<Vec<UserSummary>, ApiError> {
        let mut state = self.lock();
        state.calls.push(Call::FetchUsers);
        let mut users: Vec<UserSummary> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}
