#[cfg(feature = "postgres")]
use sqlx_core::from_row::FromRow;
#[cfg(feature = "postgres")]
use sqlx_core::row::Row;
#[cfg(feature = "postgres")]
use sqlx_postgres::PgRow;

#[cfg(feature = "postgres")]
use super::*;

#[cfg(feature = "postgres")]
fn parse_enum<T: TryFrom<i32, Error = EnumParseError>>(value: i16) -> Result<T, sqlx_core::Error> {
    T::try_from(i32::from(value)).map_err(|err| sqlx_core::Error::Decode(Box::new(err)))
}

macro_rules! impl_from_row {
    ($ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "postgres")]
        impl FromRow<'_, PgRow> for $ty {
            fn from_row($row: &PgRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
}

impl_from_row!(User, row => {
        let role: i16 = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: parse_enum(role)?,
            created_at: row.try_get("created_at")?,
        })
    }
);

impl_from_row!(Group, row => {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            leader_id: row.try_get("leader_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);

impl_from_row!(GroupMember, row => {
        let role: i16 = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            group_id: row.try_get("group_id")?,
            user_id: row.try_get("user_id")?,
            role: parse_enum(role)?,
            joined_at: row.try_get("joined_at")?,
        })
    }
);

impl_from_row!(Pipeline, row => {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
);

impl_from_row!(PipelineStage, row => {
        Ok(Self {
            id: row.try_get("id")?,
            pipeline_id: row.try_get("pipeline_id")?,
            name: row.try_get("name")?,
            position: row.try_get("position")?,
        })
    }
);

impl_from_row!(Deal, row => {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            value_cents: row.try_get("value_cents")?,
            stage_id: row.try_get("stage_id")?,
            owner_id: row.try_get("owner_id")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);
