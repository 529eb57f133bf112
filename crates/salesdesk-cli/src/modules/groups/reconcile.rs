//! Save orchestration for one group form: field persistence, optimistic
//! membership update, batch replace, then commit or rollback.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Utc;
use salesdesk_core::api::groups::{CreateGroupRequest, GroupMemberResponse, UpdateGroupRequest};
use salesdesk_core::{GroupView, Member, PendingMembership};
use thiserror::Error;
use uuid::Uuid;

use super::api::{ApiError, GroupsApi};
use super::cache::{CacheKey, CacheValue};
use super::optimistic::{self, OptimisticSnapshot};
use super::queries::GroupQueries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveState {
    Idle,
    Validating,
    PersistingGroupFields,
    ApplyingOptimisticMembership,
    AwaitingBatchResponse,
    Committing,
    RollingBack,
}

/// Field-level problems found before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FieldErrors {
    pub name: Option<&'static str>,
    pub leader: Option<&'static str>,
}

impl FieldErrors {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.leader.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [("name", self.name), ("leader", self.leader)]
            .into_iter()
            .filter_map(|(field, code)| code.map(|code| format!("{field}: {code}")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SaveError {
    #[error("invalid group form ({0})")]
    Validation(FieldErrors),
    #[error("saving group fields failed: {0}")]
    Fields(#[source] ApiError),
    #[error("updating group members failed: {0}")]
    Members(#[source] ApiError),
}

impl SaveError {
    pub(crate) fn cause(&self) -> Option<&ApiError> {
        match self {
            Self::Validation(_) => None,
            Self::Fields(err) | Self::Members(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// What the user submitted alongside the queued member changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupForm {
    pub name: String,
    pub leader_id: Option<Uuid>,
}

pub(crate) struct GroupEditor<A> {
    queries: GroupQueries<A>,
    original: Option<GroupView>,
    pending: PendingMembership,
    state: SaveState,
    pending_member_ops: usize,
    notifications: Vec<Notification>,
    #[cfg(test)]
    trail: Vec<(SaveState, usize)>,
}

impl<A: GroupsApi> GroupEditor<A> {
    /// Editor for a group that does not exist yet.
    pub(crate) fn create(queries: GroupQueries<A>) -> Self {
        Self::with_original(queries, None)
    }

    pub(crate) fn edit(queries: GroupQueries<A>, group: GroupView) -> Self {
        Self::with_original(queries, Some(group))
    }

    fn with_original(queries: GroupQueries<A>, original: Option<GroupView>) -> Self {
        let leader = original.as_ref().map(|group| group.leader_id);
        Self {
            queries,
            original,
            pending: PendingMembership::new(leader),
            state: SaveState::Idle,
            pending_member_ops: 0,
            notifications: Vec::new(),
            #[cfg(test)]
            trail: Vec::new(),
        }
    }

    pub(crate) fn queries(&self) -> &GroupQueries<A> {
        &self.queries
    }

    pub(crate) fn group_id(&self) -> Option<Uuid> {
        self.original.as_ref().map(|group| group.id)
    }

    pub(crate) fn pending(&self) -> &PendingMembership {
        &self.pending
    }

    pub(crate) fn set_leader(&mut self, leader_id: Option<Uuid>) {
        self.pending.set_leader(leader_id);
    }

    pub(crate) fn queue_add(&mut self, user_id: Uuid) -> bool {
        self.pending.queue_add(user_id)
    }

    /// No-op for the leader.
    pub(crate) fn queue_remove(&mut self, user_id: Uuid) -> bool {
        self.pending.queue_remove(user_id)
    }

    /// Last known members, leader excluded.
    pub(crate) fn current_members(&self) -> BTreeSet<Uuid> {
        self.original
            .as_ref()
            .map(|group| {
                group
                    .member_ids()
                    .into_iter()
                    .filter(|id| *id != group.leader_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn has_unsaved_changes(&self, form: &GroupForm) -> bool {
        let name = form.name.trim();
        let fields_changed = match &self.original {
            Some(group) => name != group.name || form.leader_id != Some(group.leader_id),
            None => !name.is_empty() || form.leader_id.is_some(),
        };
        fields_changed || !self.pending.is_empty()
    }

    pub(crate) fn is_saving(&self) -> bool {
        !matches!(self.state, SaveState::Idle | SaveState::Validating)
    }

    pub(crate) fn pending_member_ops(&self) -> usize {
        self.pending_member_ops
    }

    pub(crate) fn state(&self) -> SaveState {
        self.state
    }

    pub(crate) fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Persists the form and the queued membership and returns the group id.
    ///
    /// Field changes are sent before the membership batch. Any failure
    /// restores the cache entries captured before the save and leaves the
    /// queued changes in place for a manual retry.
    pub(crate) async fn save(&mut self, form: &GroupForm) -> Result<Uuid, SaveError> {
        self.transition(SaveState::Validating);
        let (name, leader_id) = match validate(form) {
            Ok(valid) => valid,
            Err(errors) => {
                tracing::debug!(event = "group_save_invalid", errors = %errors);
                self.transition(SaveState::Idle);
                return Err(SaveError::Validation(errors));
            }
        };
        self.pending.set_leader(Some(leader_id));

        let before_fields = self
            .group_id()
            .map(|group_id| OptimisticSnapshot::capture(self.queries.cache(), group_id));
        self.transition(SaveState::PersistingGroupFields);
        let base = match self.persist_fields(&name, leader_id).await {
            Ok(base) => base,
            Err(err) => {
                tracing::warn!(
                    event = "group_fields_save_failed",
                    group_id = ?self.group_id(),
                    code = err.code().unwrap_or("none"),
                    error = %err,
                    "Saving group fields failed"
                );
                return Err(self.roll_back(before_fields, SaveError::Fields(err)));
            }
        };
        let group_id = base.id;

        let diff = self.pending.diff(self.current_members());
        if !diff.has_membership_changes() {
            self.commit(base, None);
            return Ok(group_id);
        }

        self.transition(SaveState::ApplyingOptimisticMembership);
        self.pending_member_ops = self.pending.op_count();
        let users = self.queries.cache().users().unwrap_or_default();
        let predicted = optimistic::predict_group(&base, diff.final_members(), &users, Utc::now());
        let snapshot = match before_fields {
            Some(snapshot) => {
                optimistic::apply_over(self.queries.cache(), &snapshot, &predicted);
                snapshot
            }
            None => optimistic::apply(self.queries.cache(), &predicted),
        };
        tracing::info!(
            event = "membership_optimistic_applied",
            group_id = %group_id,
            added = diff.added().len(),
            removed = diff.removed().len(),
        );

        self.transition(SaveState::AwaitingBatchResponse);
        let target = diff.target_list();
        match self
            .queries
            .api()
            .replace_group_members(group_id, &target)
            .await
        {
            Ok(response) => {
                self.commit(base, Some(response.members));
                Ok(group_id)
            }
            Err(err) => {
                tracing::warn!(
                    event = "group_members_batch_failed",
                    group_id = %group_id,
                    members = target.len(),
                    code = err.code().unwrap_or("none"),
                    error = %err,
                    "Membership batch failed"
                );
                Err(self.roll_back(Some(snapshot), SaveError::Members(err)))
            }
        }
    }

    async fn persist_fields(&mut self, name: &str, leader_id: Uuid) -> Result<GroupView, ApiError> {
        let Some(group) = self.original.clone() else {
            let request = CreateGroupRequest {
                name: name.to_string(),
                leader_id: Some(leader_id),
            };
            let created = GroupView::from(self.queries.api().create_group(&request).await?);
            tracing::info!(event = "group_created", group_id = %created.id, "Group created");
            // Retries after a failed batch must update, not create again.
            self.original = Some(created.clone());
            return Ok(created);
        };

        let request = UpdateGroupRequest {
            name: (name != group.name).then(|| name.to_string()),
            leader_id: (leader_id != group.leader_id).then_some(leader_id),
        };
        if request.is_empty() {
            return Ok(group);
        }
        let updated = GroupView::from(self.queries.api().update_group(group.id, &request).await?);
        tracing::info!(event = "group_fields_saved", group_id = %updated.id, "Group fields saved");
        self.original = Some(updated.clone());
        Ok(updated)
    }

    fn commit(&mut self, base: GroupView, members: Option<Vec<GroupMemberResponse>>) {
        self.transition(SaveState::Committing);
        let group_id = base.id;
        let cache = self.queries.cache();
        if let Some(members) = members {
            let confirmed = GroupView {
                members: members.into_iter().map(Member::Confirmed).collect(),
                ..base
            };
            cache.set(
                CacheKey::GroupDetail(group_id),
                CacheValue::Group(confirmed.clone()),
            );
            self.original = Some(confirmed);
        }
        cache.invalidate(CacheKey::GroupDetail(group_id));
        cache.invalidate(CacheKey::GroupList);

        let ops = self.pending.op_count();
        self.pending.clear();
        self.pending_member_ops = 0;
        self.notify(NotificationLevel::Success, "Group saved".to_string());
        tracing::info!(
            event = "membership_committed",
            group_id = %group_id,
            ops = ops,
            "Group save committed"
        );
        self.transition(SaveState::Idle);
    }

    fn roll_back(&mut self, snapshot: Option<OptimisticSnapshot>, error: SaveError) -> SaveError {
        self.transition(SaveState::RollingBack);
        if let Some(snapshot) = snapshot {
            let group_id = snapshot.group_id();
            let cache = self.queries.cache();
            snapshot.restore(cache);
            cache.invalidate(CacheKey::GroupDetail(group_id));
            cache.invalidate(CacheKey::GroupList);
            tracing::info!(event = "membership_rollback", group_id = %group_id, "Cache restored");
        }
        self.pending_member_ops = 0;
        let cause = error
            .cause()
            .map_or_else(|| error.to_string(), ToString::to_string);
        self.notify(
            NotificationLevel::Error,
            format!("Could not save group: {cause}"),
        );
        self.transition(SaveState::Idle);
        error
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        self.notifications.push(Notification { level, message });
    }

    fn transition(&mut self, next: SaveState) {
        tracing::debug!(event = "group_save_state", from = ?self.state, to = ?next);
        self.state = next;
        #[cfg(test)]
        self.trail.push((next, self.pending_member_ops));
    }
}

fn validate(form: &GroupForm) -> Result<(String, Uuid), FieldErrors> {
    let name = form.name.trim();
    let mut errors = FieldErrors::default();
    if name.is_empty() {
        errors.name = Some("name_required");
    }
    if form.leader_id.is_none() {
        errors.leader = Some("leader_required");
    }
    match form.leader_id {
        Some(leader_id) if errors.is_empty() => Ok((name.to_string(), leader_id)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::modules::groups::api::GroupListParams;
    use crate::modules::groups::cache::QueryCache;
    use crate::modules::groups::fake::{Call, FakeGroupsApi};

    const LEADER: u128 = 100;
    const U1: u128 = 1;
    const U2: u128 = 2;
    const U3: u128 = 3;

    fn id(raw: u128) -> Uuid {
        Uuid::from_u128(raw)
    }

    fn others(group: &GroupView) -> BTreeSet<Uuid> {
        group
            .member_ids()
            .into_iter()
            .filter(|member| *member != group.leader_id)
            .collect()
    }

    /// `g1` with members `[u1, u2]`, loaded through the cache with the
    /// group list and users already fetched.
    async fn g1_editor() -> (FakeGroupsApi, GroupEditor<FakeGroupsApi>, Uuid) {
        let api = FakeGroupsApi::default();
        api.add_user(LEADER, "Lead");
        api.add_user(U1, "Uma");
        api.add_user(U2, "Ugo");
        api.add_user(U3, "Ulla");
        let g1 = api.insert_group("g1", id(LEADER), &[id(U1), id(U2)]);

        let cache = Arc::new(QueryCache::new());
        api.observe(Arc::clone(&cache));
        let queries = GroupQueries::new(api.clone(), cache);
        let group = queries.group(g1).await.expect("group");
        queries
            .groups(&GroupListParams::default())
            .await
            .expect("groups");
        queries.users().await.expect("users");
        api.clear_calls();
        (api, GroupEditor::edit(queries, group), g1)
    }

    fn states<A>(editor: &GroupEditor<A>) -> Vec<SaveState> {
        editor.trail.iter().map(|(state, _)| *state).collect()
    }

    fn g1_form() -> GroupForm {
        GroupForm {
            name: "g1".to_string(),
            leader_id: Some(id(LEADER)),
        }
    }

    #[tokio::test]
    async fn successful_save_sends_target_and_clears_pending() {
        let (api, mut editor, g1) = g1_editor().await;
        assert!(editor.queue_add(id(U3)));
        assert!(editor.queue_remove(id(U1)));
        assert!(editor.has_unsaved_changes(&g1_form()));

        let saved = editor.save(&g1_form()).await.expect("save");

        assert_eq!(saved, g1);
        assert_eq!(api.calls(), vec![Call::Replace(g1, vec![id(U2), id(U3)])]);
        let cached = editor.queries().cache().group(g1).expect("cached detail");
        assert_eq!(others(&cached), [id(U2), id(U3)].into_iter().collect());
        assert!(!cached.has_pending_members());
        assert!(editor.pending().is_empty());
        assert_eq!(editor.pending_member_ops(), 0);
        assert_eq!(editor.state(), SaveState::Idle);
        assert!(!editor.is_saving());
        assert!(!editor.has_unsaved_changes(&g1_form()));

        let notes = editor.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(
            states(&editor),
            vec![
                SaveState::Validating,
                SaveState::PersistingGroupFields,
                SaveState::ApplyingOptimisticMembership,
                SaveState::AwaitingBatchResponse,
                SaveState::Committing,
                SaveState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn failed_batch_restores_cache_exactly() {
        let (api, mut editor, g1) = g1_editor().await;
        let cache = editor.queries().cache();
        let detail_before = cache.get(CacheKey::GroupDetail(g1));
        let list_before = cache.get(CacheKey::GroupList);
        api.fail_replace_with(ApiError::Status {
            status: 500,
            code: "db_error".to_string(),
        });

        editor.queue_add(id(U3));
        editor.queue_remove(id(U1));
        let err = editor.save(&g1_form()).await.expect_err("batch fails");

        assert!(matches!(err, SaveError::Members(_)));
        let cache = editor.queries().cache();
        assert_eq!(cache.get(CacheKey::GroupDetail(g1)), detail_before);
        assert_eq!(cache.get(CacheKey::GroupList), list_before);
        assert!(cache.is_stale(CacheKey::GroupDetail(g1)));
        let restored = cache.group(g1).expect("restored detail");
        assert_eq!(others(&restored), [id(U1), id(U2)].into_iter().collect());

        assert_eq!(editor.pending_member_ops(), 0);
        assert_eq!(editor.state(), SaveState::Idle);
        assert_eq!(editor.pending().op_count(), 2);
        let notes = editor.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(notes[0].message.contains("500"));
        assert!(states(&editor).contains(&SaveState::RollingBack));
        assert!(!states(&editor).contains(&SaveState::Committing));
        let seen = api.in_flight();
        assert_eq!(seen.len(), 1);
        let during = seen[0].detail.as_ref().expect("detail during batch");
        assert_eq!(others(during), [id(U2), id(U3)].into_iter().collect());
    }

    #[tokio::test]
    async fn batch_runs_against_predicted_detail_and_list() {
        let (api, mut editor, g1) = g1_editor().await;
        editor.queue_add(id(U3));
        editor.queue_remove(id(U1));

        editor.save(&g1_form()).await.expect("save");

        let seen = api.in_flight();
        assert_eq!(seen.len(), 1);
        let detail = seen[0].detail.as_ref().expect("detail during batch");
        let listed = seen[0]
            .list
            .as_ref()
            .expect("list during batch")
            .iter()
            .find(|group| group.id == g1)
            .expect("g1 listed");
        for view in [detail, listed] {
            assert_eq!(others(view), [id(U2), id(U3)].into_iter().collect());
            let newcomer = view
                .members
                .iter()
                .find(|member| member.user_id() == id(U3))
                .expect("newcomer row");
            let Member::Pending(pending) = newcomer else {
                panic!("expected a pending row for the newcomer");
            };
            assert!(pending
                .temp_id
                .starts_with(salesdesk_core::OPTIMISTIC_ID_PREFIX));
            assert_eq!(pending.user.name, "Ulla");
            assert!(view
                .members
                .iter()
                .any(|member| member.user_id() == id(U2) && !member.is_pending()));
        }

        let ops_during_batch = editor
            .trail
            .iter()
            .find(|(state, _)| *state == SaveState::AwaitingBatchResponse)
            .map(|(_, ops)| *ops);
        assert_eq!(ops_during_batch, Some(2));
        assert_eq!(editor.pending_member_ops(), 0);
    }

    #[tokio::test]
    async fn creating_a_group_creates_then_replaces_members() {
        let api = FakeGroupsApi::default();
        api.add_user(LEADER, "Admin");
        api.add_user(U1, "One");
        let queries = GroupQueries::new(api.clone(), Arc::new(QueryCache::new()));
        let mut editor = GroupEditor::create(queries);
        let form = GroupForm {
            name: "Team Alpha".to_string(),
            leader_id: Some(id(LEADER)),
        };
        editor.set_leader(form.leader_id);
        editor.queue_add(id(U1));

        let group_id = editor.save(&form).await.expect("save");

        assert_eq!(
            api.calls(),
            vec![
                Call::Create("Team Alpha".to_string(), id(LEADER)),
                Call::Replace(group_id, vec![id(U1)]),
            ]
        );
        let fetched = editor.queries().group(group_id).await.expect("refetch");
        assert_eq!(fetched.name, "Team Alpha");
        assert_eq!(others(&fetched), [id(U1)].into_iter().collect());
    }

    #[tokio::test]
    async fn committed_state_matches_authoritative_refetch() {
        let (api, mut editor, g1) = g1_editor().await;
        editor.queue_add(id(U3));
        editor.queue_remove(id(U2));
        let expected = editor.pending().diff(editor.current_members());

        editor.save(&g1_form()).await.expect("save");

        let refetched = editor.queries().group(g1).await.expect("refetch");
        assert_eq!(&others(&refetched), expected.final_members());
        assert!(api.calls().contains(&Call::FetchGroup(g1)));
    }

    #[tokio::test]
    async fn leader_cannot_be_queued_for_removal() {
        let (_api, mut editor, _) = g1_editor().await;
        assert!(!editor.queue_remove(id(LEADER)));
        assert!(editor.pending().to_remove().is_empty());
        assert!(!editor.has_unsaved_changes(&g1_form()));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_network() {
        let (api, mut editor, _) = g1_editor().await;
        editor.queue_add(id(U3));
        let form = GroupForm {
            name: "   ".to_string(),
            leader_id: None,
        };

        let err = editor.save(&form).await.expect_err("invalid");

        assert_eq!(
            err,
            SaveError::Validation(FieldErrors {
                name: Some("name_required"),
                leader: Some("leader_required"),
            })
        );
        assert!(api.calls().is_empty());
        assert_eq!(editor.state(), SaveState::Idle);
        assert!(editor.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn failed_field_update_skips_batch_and_rolls_back() {
        let (api, mut editor, g1) = g1_editor().await;
        let detail_before = editor.queries().cache().get(CacheKey::GroupDetail(g1));
        api.fail_update_with(ApiError::Timeout);
        editor.queue_add(id(U3));
        let form = GroupForm {
            name: "g1 renamed".to_string(),
            leader_id: Some(id(LEADER)),
        };

        let err = editor.save(&form).await.expect_err("update fails");

        assert_eq!(err, SaveError::Fields(ApiError::Timeout));
        assert_eq!(api.calls(), vec![Call::Update(g1)]);
        assert_eq!(
            editor.queries().cache().get(CacheKey::GroupDetail(g1)),
            detail_before
        );
        let notes = editor.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds_with_same_target() {
        let (api, mut editor, g1) = g1_editor().await;
        api.fail_replace_with(ApiError::Transport("connection reset".to_string()));
        editor.queue_add(id(U3));
        editor.save(&g1_form()).await.expect_err("first attempt");

        api.clear_failures();
        editor.save(&g1_form()).await.expect("retry");

        let target = vec![id(U1), id(U2), id(U3)];
        assert_eq!(
            api.calls(),
            vec![Call::Replace(g1, target.clone()), Call::Replace(g1, target)]
        );
        assert!(editor.pending().is_empty());
    }

    #[tokio::test]
    async fn rename_only_skips_the_batch() {
        let (api, mut editor, g1) = g1_editor().await;
        let form = GroupForm {
            name: "  Ops  ".to_string(),
            leader_id: Some(id(LEADER)),
        };

        editor.save(&form).await.expect("save");

        assert_eq!(api.calls(), vec![Call::Update(g1)]);
        assert!(editor.queries().cache().is_stale(CacheKey::GroupList));
        let refetched = editor.queries().group(g1).await.expect("refetch");
        assert_eq!(refetched.name, "Ops");
    }
}
