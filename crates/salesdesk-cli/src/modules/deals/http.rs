use reqwest::Method;
use salesdesk_core::api::deals::{BoardResponse, MoveDealRequest};
use uuid::Uuid;

use crate::modules::system::http::send_request;
use crate::modules::system::CommandContext;

pub(crate) async fn fetch_board(
    ctx: &CommandContext<'_>,
    pipeline_id: Uuid,
) -> anyhow::Result<BoardResponse> {
    let url = format!(
        "{}/v1/pipelines/{}/board",
        ctx.addr.trim_end_matches('/'),
        pipeline_id
    );
    let response = send_request(ctx, Method::GET, url, None).await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Request failed: {status} {body}");
    }
    Ok(response.json().await?)
}

pub(crate) async fn move_deal(
    ctx: &CommandContext<'_>,
    deal_id: Uuid,
    payload: MoveDealRequest,
) -> anyhow::Result<reqwest::Response> {
    let url = format!(
        "{}/v1/deals/{}/stage",
        ctx.addr.trim_end_matches('/'),
        deal_id
    );
    send_request(ctx, Method::PUT, url, Some(serde_json::to_value(&payload)?)).await
}
