/// Prefix of the temporary identifier given to members that exist only in
/// the client cache until the backend confirms them.
pub const OPTIMISTIC_ID_PREFIX: &str = "optimistic-";

/// Display name used for a user that is not yet known to the client.
pub const PLACEHOLDER_USER_NAME: &str = "…";

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;
