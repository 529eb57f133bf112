use salesdesk_core::Identity;

use crate::app::AppState;
use crate::domains::errors::ServiceError;
use crate::infra::metrics;

pub mod http_admin;
pub mod policies;
pub mod policy_store;

/// Checks `action` on `resource` against the live policy set, recording
/// denials.
pub fn authorize(
    state: &AppState,
    identity: &Identity,
    action: &str,
    resource: &str,
) -> Result<(), ServiceError> {
    let policies = state.policy_store.get();
    if policies.is_allowed(identity, action, resource) {
        return Ok(());
    }
    metrics::forbidden_access(resource);
    tracing::warn!(
        event = "forbidden",
        action,
        resource,
        role = identity.role.as_str(),
        "Access denied"
    );
    Err(ServiceError::ForbiddenNoBody)
}
