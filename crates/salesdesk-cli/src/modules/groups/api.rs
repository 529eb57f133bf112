use salesdesk_core::api::groups::{
    CreateGroupRequest, GroupResponse, ReplaceMembersResponse, UpdateGroupRequest,
};
use salesdesk_core::api::users::UserSummary;
use thiserror::Error;
use uuid::Uuid;

/// Why a call to the group backend did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ApiError {
    #[error("server answered {status} ({code})")]
    Status { status: u16, code: String },
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Error code from the server body, when the server sent one.
    pub(crate) fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

/// Paging and order for the group list. Unset fields use the server's
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GroupListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort: Option<String>,
}

/// Backend operations the membership editor depends on.
pub(crate) trait GroupsApi {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<GroupResponse, ApiError>;

    async fn update_group(
        &self,
        group_id: Uuid,
        request: &UpdateGroupRequest,
    ) -> Result<GroupResponse, ApiError>;

    /// Full replace of the membership; sending the same list twice is safe.
    async fn replace_group_members(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<ReplaceMembersResponse, ApiError>;

    async fn fetch_group(&self, group_id: Uuid) -> Result<GroupResponse, ApiError>;

    async fn fetch_groups(&self, params: &GroupListParams) -> Result<Vec<GroupResponse>, ApiError>;

    async fn fetch_users(&self) -> Result<Vec<UserSummary>, ApiError>;
}
