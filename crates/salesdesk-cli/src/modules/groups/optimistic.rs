//! Predicted cache state for an in-flight membership save, with the
//! snapshot needed to undo it.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use salesdesk_core::api::users::UserSummary;
use salesdesk_core::{GroupView, Member, PendingMember};
use uuid::Uuid;

use super::cache::{CacheEntry, CacheKey, CacheValue, QueryCache};

/// Detail and list entries exactly as they were before a save touched them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptimisticSnapshot {
    group_id: Uuid,
    detail: Option<CacheEntry>,
    list: Option<CacheEntry>,
}

impl OptimisticSnapshot {
    pub(crate) fn capture(cache: &QueryCache, group_id: Uuid) -> Self {
        Self {
            group_id,
            detail: cache.entry(CacheKey::GroupDetail(group_id)),
            list: cache.entry(CacheKey::GroupList),
        }
    }

    pub(crate) fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Puts both entries back, absence included, under one lock.
    pub(crate) fn restore(self, cache: &QueryCache) {
        cache.write_many([
            (CacheKey::GroupDetail(self.group_id), self.detail),
            (CacheKey::GroupList, self.list),
        ]);
    }
}

/// Builds the group as it should look once `final_members` is persisted.
///
/// Rows of users who stay keep their confirmed data and the leader row is
/// kept as is. Newcomers become [`Member::Pending`] rendered from `users`
/// or from a placeholder.
pub(crate) fn predict_group(
    base: &GroupView,
    final_members: &BTreeSet<Uuid>,
    users: &[UserSummary],
    now: DateTime<Utc>,
) -> GroupView {
    let known: HashMap<Uuid, &UserSummary> = users.iter().map(|user| (user.id, user)).collect();
    let existing: HashMap<Uuid, &Member> = base
        .members
        .iter()
        .map(|member| (member.user_id(), member))
        .collect();

    let mut members: Vec<Member> = base
        .members
        .iter()
        .filter(|member| member.user_id() == base.leader_id)
        .cloned()
        .collect();
    for user_id in final_members {
        if *user_id == base.leader_id {
            continue;
        }
        let member = match existing.get(user_id) {
            Some(member) => (*member).clone(),
            None => {
                let user = known
                    .get(user_id)
                    .map_or_else(|| UserSummary::placeholder(*user_id), |user| (*user).clone());
                Member::Pending(PendingMember::new(user, now))
            }
        };
        members.push(member);
    }

    GroupView {
        members,
        updated_at: now,
        ..base.clone()
    }
}

/// Snapshots the detail and list entries, then overwrites both with
/// `predicted` in a single cache write.
pub(crate) fn apply(cache: &QueryCache, predicted: &GroupView) -> OptimisticSnapshot {
    let snapshot = OptimisticSnapshot::capture(cache, predicted.id);
    apply_over(cache, &snapshot, predicted);
    snapshot
}

/// Writes `predicted` on top of an already captured snapshot.
pub(crate) fn apply_over(cache: &QueryCache, snapshot: &OptimisticSnapshot, predicted: &GroupView) {
    let list = snapshot.list.as_ref().and_then(|entry| match &entry.value {
        CacheValue::Groups(groups) => {
            let mut groups = groups.clone();
            match groups.iter_mut().find(|group| group.id == predicted.id) {
                Some(slot) => *slot = predicted.clone(),
                None => groups.insert(0, predicted.clone()),
            }
            Some(CacheEntry {
                value: CacheValue::Groups(groups),
                stale: entry.stale,
            })
        }
        _ => None,
    });

    let mut writes = vec![(
        CacheKey::GroupDetail(predicted.id),
        Some(CacheEntry::fresh(CacheValue::Group(predicted.clone()))),
    )];
    if list.is_some() {
        writes.push((CacheKey::GroupList, list));
    }
    cache.write_many(writes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_core::api::groups::GroupMemberResponse;
    use salesdesk_core::{MemberRole, OPTIMISTIC_ID_PREFIX, PLACEHOLDER_USER_NAME};

    fn summary(id: u128, name: &str) -> UserSummary {
        UserSummary {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            email: format!("{name}@example.com"),
        }
    }

    fn confirmed(group: Uuid, user: u128, role: MemberRole) -> Member {
        Member::Confirmed(GroupMemberResponse {
            id: Uuid::from_u128(1000 + user),
            group_id: group,
            user_id: Uuid::from_u128(user),
            role,
            joined_at: DateTime::<Utc>::default(),
            user: None,
        })
    }

    fn group() -> GroupView {
        let id = Uuid::from_u128(500);
        GroupView {
            id,
            name: "g1".to_string(),
            leader_id: Uuid::from_u128(10),
            leader: None,
            members: vec![
                confirmed(id, 10, MemberRole::Leader),
                confirmed(id, 1, MemberRole::Member),
                confirmed(id, 2, MemberRole::Member),
            ],
            updated_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn prediction_keeps_stayers_and_marks_newcomers_pending() {
        let base = group();
        let target: BTreeSet<Uuid> = [2, 3, 4].into_iter().map(Uuid::from_u128).collect();
        let users = vec![summary(3, "carol")];

        let predicted = predict_group(&base, &target, &users, Utc::now());

        let ids: Vec<u128> = predicted
            .members
            .iter()
            .map(|member| member.user_id().as_u128())
            .collect();
        assert_eq!(ids, vec![10, 2, 3, 4]);
        assert_eq!(predicted.members[1], base.members[2]);

        let Member::Pending(carol) = &predicted.members[2] else {
            panic!("expected pending member");
        };
        assert_eq!(carol.user.name, "carol");
        assert_eq!(carol.role, MemberRole::Member);
        assert!(carol.temp_id.starts_with(OPTIMISTIC_ID_PREFIX));

        let Member::Pending(unknown) = &predicted.members[3] else {
            panic!("expected pending member");
        };
        assert_eq!(unknown.user.name, PLACEHOLDER_USER_NAME);
        assert_eq!(unknown.user.email, "");
    }

    #[test]
    fn apply_updates_detail_and_list_then_restore_undoes_both() {
        let cache = QueryCache::new();
        let base = group();
        let other = GroupView {
            id: Uuid::from_u128(501),
            ..group()
        };
        cache.set(
            CacheKey::GroupList,
            CacheValue::Groups(vec![other.clone(), base.clone()]),
        );
        let list_before = cache.entry(CacheKey::GroupList);

        let target: BTreeSet<Uuid> = [Uuid::from_u128(1)].into_iter().collect();
        let predicted = predict_group(&base, &target, &[], Utc::now());
        let snapshot = apply(&cache, &predicted);

        assert_eq!(cache.group(base.id), Some(predicted.clone()));
        let groups = cache.groups().expect("list cached");
        assert_eq!(groups[0], other);
        assert_eq!(groups[1], predicted);

        snapshot.restore(&cache);
        assert_eq!(cache.entry(CacheKey::GroupDetail(base.id)), None);
        assert_eq!(cache.entry(CacheKey::GroupList), list_before);
    }

    #[test]
    fn uncached_list_stays_uncached() {
        let cache = QueryCache::new();
        let predicted = predict_group(&group(), &BTreeSet::new(), &[], Utc::now());
        let snapshot = apply(&cache, &predicted);
        assert!(cache.groups().is_none());
        assert_eq!(snapshot.group_id(), predicted.id);
    }
}
