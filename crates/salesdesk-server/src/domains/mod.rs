pub mod access_control;
pub mod auth;
pub mod deals;
pub mod errors;
pub mod groups;
pub mod users;
