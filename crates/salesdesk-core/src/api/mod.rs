//! Request and response bodies shared by the HTTP server and its clients.

pub mod deals;
pub mod groups;
pub mod users;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self {
            error: code.to_string(),
        }
    }
}
