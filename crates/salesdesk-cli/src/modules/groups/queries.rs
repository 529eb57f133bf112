use std::sync::Arc;

use salesdesk_core::api::users::UserSummary;
use salesdesk_core::GroupView;
use uuid::Uuid;

use super::api::{ApiError, GroupListParams, GroupsApi};
use super::cache::{CacheKey, CacheValue, QueryCache};

/// Read-through access to groups and users. Missing or stale entries are
/// refetched; fresh ones are served from the cache.
pub(crate) struct GroupQueries<A> {
    api: A,
    cache: Arc<QueryCache>,
}

impl<A: GroupsApi> GroupQueries<A> {
    pub(crate) fn new(api: A, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub(crate) async fn group(&self, group_id: Uuid) -> Result<GroupView, ApiError> {
        let key = CacheKey::GroupDetail(group_id);
        if !self.cache.is_stale(key) {
            if let Some(group) = self.cache.group(group_id) {
                return Ok(group);
            }
        }
        let group = GroupView::from(self.api.fetch_group(group_id).await?);
        self.cache.set(key, CacheValue::Group(group.clone()));
        tracing::debug!(event = "group_refetched", group_id = %group_id);
        Ok(group)
    }

    /// The cached list holds whichever page was fetched last.
    pub(crate) async fn groups(&self, params: &GroupListParams) -> Result<Vec<GroupView>, ApiError> {
        if !self.cache.is_stale(CacheKey::GroupList) {
            if let Some(groups) = self.cache.groups() {
                return Ok(groups);
            }
        }
        let groups: Vec<GroupView> = self
            .api
            .fetch_groups(params)
            .await?
            .into_iter()
            .map(GroupView::from)
            .collect();
        self.cache
            .set(CacheKey::GroupList, CacheValue::Groups(groups.clone()));
        Ok(groups)
    }

    pub(crate) async fn users(&self) -> Result<Vec<UserSummary>, ApiError> {
        if !self.cache.is_stale(CacheKey::Users) {
            if let Some(users) = self.cache.users() {
                return Ok(users);
            }
        }
        let users = self.api.fetch_users().await?;
        self.cache.set(CacheKey::Users, CacheValue::Users(users.clone()));
        Ok(users)
    }
}
