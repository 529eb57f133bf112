use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::app::AppState;
use crate::infra::metrics;

pub async fn auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let state = request
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => {
            metrics::auth_rejected("missing");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let identity = match state.tokens.verify(token) {
        Ok(identity) => identity,
        Err(err) => {
            metrics::auth_rejected(err.reason());
            tracing::warn!(event = "auth_failed", reason = %err, "Bearer token rejected");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    tracing::Span::current().record("user_id", identity.user_id.to_string());
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
