use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use salesdesk_core::api::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("forbidden_no_body")]
    ForbiddenNoBody,
    #[error("bad_request: {0}")]
    BadRequest(&'static str),
    #[error("not_found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("no_changes")]
    NoChanges,
    #[error("db_error")]
    DbError,
}

impl ServiceError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ForbiddenNoBody => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::NoChanges => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DbError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the JSON body, if any.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ForbiddenNoBody | Self::NotFound => None,
            Self::BadRequest(code) | Self::Conflict(code) => Some(code),
            Self::NoChanges => Some("no_changes"),
            Self::DbError => Some("db_error"),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.code() {
            Some(code) => (status, Json(ErrorResponse::new(code))).into_response(),
            None => status.into_response(),
        }
    }
}
