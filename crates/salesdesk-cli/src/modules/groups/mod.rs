mod actions;
pub(crate) mod api;
pub(crate) mod args;
pub(crate) mod cache;
#[cfg(test)]
pub(crate) mod fake;
pub(crate) mod http;
pub(crate) mod optimistic;
pub(crate) mod queries;
pub(crate) mod reconcile;

pub(crate) use actions::handle_group;
