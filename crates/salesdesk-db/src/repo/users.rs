use super::prelude::*;

const USER_COLUMNS: &str = "id, name, email, role, created_at";

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO users (id, name, email, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            user.id,
            user.name.as_str(),
            user.email.as_str(),
            user.role.as_i32(),
            user.created_at
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx_core::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        query_as!(User, &query, id).fetch_optional(self.pool).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx_core::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        query_as!(User, &query, email)
            .fetch_optional(self.pool)
            .await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, sqlx_core::Error> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY name ASC, id ASC
            LIMIT $1 OFFSET $2
            "#
        );
        query_as!(User, &query, limit, offset)
            .fetch_all(self.pool)
            .await
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, sqlx_core::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        query_as!(User, &query, ids).fetch_all(self.pool).await
    }

    /// Ids from `ids` that have no user row.
    pub async fn missing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx_core::Error> {
        let found: Vec<Uuid> = self.list_by_ids(ids).await?.into_iter().map(|u| u.id).collect();
        let mut missing: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        missing.sort();
        missing.dedup();
        Ok(missing)
    }
}
