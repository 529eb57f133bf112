#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod board;
pub mod constants;
pub mod membership;
pub mod models;

pub use crate::auth::*;
pub use crate::board::*;
pub use crate::constants::*;
pub use crate::membership::*;
pub use crate::models::*;
