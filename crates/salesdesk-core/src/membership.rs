//! Group membership reconciliation primitives.
//!
//! [`MembershipDiff`] turns the last authoritative member set plus the pending
//! add/remove intents into the exact target set sent to the backend.
//! [`PendingMembership`] holds those intents while the user edits a group.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::groups::{GroupMemberResponse, GroupResponse};
use crate::api::users::UserSummary;
use crate::{MemberRole, OPTIMISTIC_ID_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDiff {
    final_members: BTreeSet<Uuid>,
    added: BTreeSet<Uuid>,
    removed: BTreeSet<Uuid>,
}

impl MembershipDiff {
    /// `final = (current \ pending_remove) ∪ pending_add`.
    ///
    /// Every input is collapsed into a set first, so duplicated ids coming
    /// from upstream never produce duplicated members.
    pub fn compute<C, A, R>(current: C, pending_add: A, pending_remove: R) -> Self
    where
        C: IntoIterator<Item = Uuid>,
        A: IntoIterator<Item = Uuid>,
        R: IntoIterator<Item = Uuid>,
    {
        let current: BTreeSet<Uuid> = current.into_iter().collect();
        let pending_add: BTreeSet<Uuid> = pending_add.into_iter().collect();
        let pending_remove: BTreeSet<Uuid> = pending_remove.into_iter().collect();

        let mut final_members: BTreeSet<Uuid> =
            current.difference(&pending_remove).copied().collect();
        final_members.extend(pending_add);

        let added = final_members.difference(&current).copied().collect();
        let removed = current.difference(&final_members).copied().collect();

        Self {
            final_members,
            added,
            removed,
        }
    }

    #[must_use]
    pub fn final_members(&self) -> &BTreeSet<Uuid> {
        &self.final_members
    }

    /// Target membership in the order it goes over the wire.
    #[must_use]
    pub fn target_list(&self) -> Vec<Uuid> {
        self.final_members.iter().copied().collect()
    }

    #[must_use]
    pub fn added(&self) -> &BTreeSet<Uuid> {
        &self.added
    }

    #[must_use]
    pub fn removed(&self) -> &BTreeSet<Uuid> {
        &self.removed
    }

    #[must_use]
    pub fn has_membership_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Uncommitted add/remove intents for one group.
///
/// An id is never queued in both directions: queueing the opposite action
/// cancels the earlier one. The group leader can never be queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingMembership {
    to_add: BTreeSet<Uuid>,
    to_remove: BTreeSet<Uuid>,
    leader_id: Option<Uuid>,
}

impl PendingMembership {
    #[must_use]
    pub fn new(leader_id: Option<Uuid>) -> Self {
        Self {
            leader_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn leader_id(&self) -> Option<Uuid> {
        self.leader_id
    }

    /// A new leader loses any intent queued for it.
    pub fn set_leader(&mut self, leader_id: Option<Uuid>) {
        if let Some(leader) = leader_id {
            self.unqueue(leader);
        }
        self.leader_id = leader_id;
    }

    /// Returns `false` when the call left the pending state untouched.
    pub fn queue_add(&mut self, user_id: Uuid) -> bool {
        if self.is_leader(user_id) {
            return false;
        }
        if self.to_remove.remove(&user_id) {
            return true;
        }
        self.to_add.insert(user_id)
    }

    pub fn queue_remove(&mut self, user_id: Uuid) -> bool {
        if self.is_leader(user_id) {
            return false;
        }
        if self.to_add.remove(&user_id) {
            return true;
        }
        self.to_remove.insert(user_id)
    }

    /// Drops whichever intent is queued for `user_id`.
    pub fn unqueue(&mut self, user_id: Uuid) -> bool {
        let added = self.to_add.remove(&user_id);
        let removed = self.to_remove.remove(&user_id);
        added || removed
    }

    pub fn clear(&mut self) {
        self.to_add.clear();
        self.to_remove.clear();
    }

    #[must_use]
    pub fn to_add(&self) -> &BTreeSet<Uuid> {
        &self.to_add
    }

    #[must_use]
    pub fn to_remove(&self) -> &BTreeSet<Uuid> {
        &self.to_remove
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of member operations a save of this state would carry.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }

    #[must_use]
    pub fn diff<C>(&self, current: C) -> MembershipDiff
    where
        C: IntoIterator<Item = Uuid>,
    {
        MembershipDiff::compute(
            current,
            self.to_add.iter().copied(),
            self.to_remove.iter().copied(),
        )
    }

    /// Users that may still be offered in an "add member" picker.
    #[must_use]
    pub fn addable_candidates<'a>(
        &self,
        users: &'a [UserSummary],
        current: &BTreeSet<Uuid>,
    ) -> Vec<&'a UserSummary> {
        users
            .iter()
            .filter(|user| !self.is_leader(user.id))
            .filter(|user| !self.to_add.contains(&user.id))
            .filter(|user| !current.contains(&user.id) || self.to_remove.contains(&user.id))
            .collect()
    }

    fn is_leader(&self, user_id: Uuid) -> bool {
        self.leader_id == Some(user_id)
    }
}

/// A member row as held by a client-side cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Member {
    Confirmed(GroupMemberResponse),
    Pending(PendingMember),
}

/// A member predicted by an in-flight save and not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMember {
    pub temp_id: String,
    pub user: UserSummary,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl PendingMember {
    #[must_use]
    pub fn new(user: UserSummary, joined_at: DateTime<Utc>) -> Self {
        Self {
            temp_id: format!("{OPTIMISTIC_ID_PREFIX}{}", user.id),
            user,
            role: MemberRole::Member,
            joined_at,
        }
    }
}

impl Member {
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Confirmed(member) => member.user_id,
            Self::Pending(member) => member.user.id,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    #[must_use]
    pub fn confirmed(&self) -> Option<&GroupMemberResponse> {
        match self {
            Self::Confirmed(member) => Some(member),
            Self::Pending(_) => None,
        }
    }
}

/// Group detail as held by a client-side cache, where members may be
/// predicted rather than persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Uuid,
    pub leader: Option<UserSummary>,
    pub members: Vec<Member>,
    pub updated_at: DateTime<Utc>,
}

impl GroupView {
    /// User ids of every member row, leader row included.
    #[must_use]
    pub fn member_ids(&self) -> BTreeSet<Uuid> {
        self.members.iter().map(Member::user_id).collect()
    }

    #[must_use]
    pub fn has_pending_members(&self) -> bool {
        self.members.iter().any(Member::is_pending)
    }
}

impl From<GroupResponse> for GroupView {
    fn from(group: GroupResponse) -> Self {
        Self {
            id: group.id,
            name: group.name,
            leader_id: group.leader_id,
            leader: group.leader,
            members: group.members.into_iter().map(Member::Confirmed).collect(),
            updated_at: group.updated_at,
        }
    }
}
