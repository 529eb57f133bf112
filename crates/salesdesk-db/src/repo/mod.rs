macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<sqlx_postgres::Postgres>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

macro_rules! query_as {
    ($ty:ty, $sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query_as::query_as::<sqlx_postgres::Postgres, $ty>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

pub(crate) mod prelude {
    pub(crate) use crate::PgPool;
    pub(crate) use chrono::{DateTime, Utc};
    pub(crate) use salesdesk_core::{
        Deal, Group, GroupMember, MemberRole, Pipeline, PipelineStage, User,
    };
    pub(crate) use sqlx_postgres::PgConnection;
    pub(crate) use uuid::Uuid;
}

mod groups;
mod pipelines;
mod users;

pub use groups::{GroupMemberRepo, GroupRepo};
pub use pipelines::{DealRepo, PipelineRepo, StageRepo};
pub use users::UserRepo;
