use reqwest::Method;
use salesdesk_core::api::groups::{
    CreateGroupRequest, GroupListResponse, GroupResponse, ReplaceMembersRequest,
    ReplaceMembersResponse, UpdateGroupRequest,
};
use salesdesk_core::api::users::{UserListResponse, UserSummary};
use salesdesk_core::api::ErrorResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::api::{ApiError, GroupListParams, GroupsApi};
use crate::modules::system::http::{append_params, auth_headers, build_params, opt_param};
use crate::modules::system::CommandContext;

/// Upper bound on users pulled in to render member names.
const USER_PAGE_LIMIT: i64 = 200;

/// [`GroupsApi`] over the REST endpoints. The request timeout comes from
/// the shared `reqwest::Client`.
#[derive(Clone)]
pub(crate) struct HttpGroupsApi {
    client: reqwest::Client,
    addr: String,
    token: String,
}

impl HttpGroupsApi {
    pub(crate) fn new(client: reqwest::Client, addr: &str, token: &str) -> Self {
        Self {
            client,
            addr: addr.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub(crate) fn from_context(ctx: &CommandContext<'_>) -> Self {
        Self::new(ctx.client.clone(), ctx.addr, &ctx.access_token)
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.addr, path);
        let headers =
            auth_headers(&self.token).map_err(|err| ApiError::Transport(err.to_string()))?;
        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(method = %method, url = %url, status = %status, "groups api response");
        if !status.is_success() {
            let code = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown")
                        .to_ascii_lowercase()
                        .replace(' ', "_")
                });
            return Err(ApiError::Status {
                status: status.as_u16(),
                code,
            });
        }
        response.json::<T>().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Decode(err.to_string())
            }
        })
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

impl GroupsApi for HttpGroupsApi {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<GroupResponse, ApiError> {
        self.call(Method::POST, "/v1/groups", Some(request)).await
    }

    async fn update_group(
        &self,
        group_id: Uuid,
        request: &UpdateGroupRequest,
    ) -> Result<GroupResponse, ApiError> {
        self.call(Method::PUT, &format!("/v1/groups/{group_id}"), Some(request))
            .await
    }

    async fn replace_group_members(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<ReplaceMembersResponse, ApiError> {
        let request = ReplaceMembersRequest {
            user_ids: user_ids.to_vec(),
        };
        self.call(
            Method::PUT,
            &format!("/v1/groups/{group_id}/members"),
            Some(&request),
        )
        .await
    }

    async fn fetch_group(&self, group_id: Uuid) -> Result<GroupResponse, ApiError> {
        self.call::<(), _>(Method::GET, &format!("/v1/groups/{group_id}"), None)
            .await
    }

    async fn fetch_groups(&self, params: &GroupListParams) -> Result<Vec<GroupResponse>, ApiError> {
        let mut path = "/v1/groups".to_string();
        append_params(
            &mut path,
            build_params([
                opt_param("limit", params.limit.map(|value| value.to_string())),
                opt_param("offset", params.offset.map(|value| value.to_string())),
                opt_param("sort", params.sort.clone()),
            ]),
        );
        let list: GroupListResponse = self.call::<(), _>(Method::GET, &path, None).await?;
        Ok(list.groups)
    }

    async fn fetch_users(&self) -> Result<Vec<UserSummary>, ApiError> {
        let list: UserListResponse = self
            .call::<(), _>(
                Method::GET,
                &format!("/v1/users?limit={USER_PAGE_LIMIT}"),
                None,
            )
            .await?;
        Ok(list.users.iter().map(|user| user.summary()).collect())
    }
}
