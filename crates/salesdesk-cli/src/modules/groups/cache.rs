//! Client-side read cache for group views.
//!
//! Entries carry a stale flag instead of being dropped on invalidation, so
//! readers can still show the last value while a refetch is pending.

use std::collections::HashMap;
use std::sync::RwLock;

use salesdesk_core::api::users::UserSummary;
use salesdesk_core::GroupView;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    GroupDetail(Uuid),
    GroupList,
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CacheValue {
    Group(GroupView),
    Groups(Vec<GroupView>),
    Users(Vec<UserSummary>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CacheEntry {
    pub value: CacheValue,
    pub stale: bool,
}

impl CacheEntry {
    pub(crate) fn fresh(value: CacheValue) -> Self {
        Self {
            value,
            stale: false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl QueryCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: CacheKey) -> Option<CacheValue> {
        self.entry(key).map(|entry| entry.value)
    }

    /// Entry with its stale flag, as captured for a snapshot.
    pub(crate) fn entry(&self, key: CacheKey) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(&key)
            .cloned()
    }

    pub(crate) fn set(&self, key: CacheKey, value: CacheValue) {
        self.entries
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .insert(key, CacheEntry::fresh(value));
    }

    /// Marks an entry stale so the next query refetches it. Returns `false`
    /// when nothing was cached under `key`.
    pub(crate) fn invalidate(&self, key: CacheKey) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());
        match entries.get_mut(&key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// A missing entry counts as stale.
    pub(crate) fn is_stale(&self, key: CacheKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(&key)
            .map_or(true, |entry| entry.stale)
    }

    /// Applies every write under one lock; `None` removes the key.
    pub(crate) fn write_many<I>(&self, writes: I)
    where
        I: IntoIterator<Item = (CacheKey, Option<CacheEntry>)>,
    {
        let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());
        for (key, entry) in writes {
            match entry {
                Some(entry) => {
                    entries.insert(key, entry);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
    }

    pub(crate) fn group(&self, group_id: Uuid) -> Option<GroupView> {
        match self.get(CacheKey::GroupDetail(group_id)) {
            Some(CacheValue::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn groups(&self) -> Option<Vec<GroupView>> {
        match self.get(CacheKey::GroupList) {
            Some(CacheValue::Groups(groups)) => Some(groups),
            _ => None,
        }
    }

    pub(crate) fn users(&self) -> Option<Vec<UserSummary>> {
        match self.get(CacheKey::Users) {
            Some(CacheValue::Users(users)) => Some(users),
            _ => None,
        }
    }
}
