pub(crate) mod deals;
pub(crate) mod groups;
pub(crate) mod system;
pub(crate) mod users;
