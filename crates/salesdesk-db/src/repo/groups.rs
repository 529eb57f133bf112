use super::prelude::*;

pub struct GroupRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the group together with its leader's membership row.
    pub async fn create(&self, group: &Group) -> Result<(), sqlx_core::Error> {
        let mut tx = self.pool.begin().await?;
        query!(
            r#"
            INSERT INTO groups (id, name, leader_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            group.id,
            group.name.as_str(),
            group.leader_id,
            group.created_at,
            group.updated_at
        )
        .execute(&mut *tx)
        .await?;
        query!(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            Uuid::now_v7(),
            group.id,
            group.leader_id,
            MemberRole::Leader.as_i32(),
            group.created_at
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Group>, sqlx_core::Error> {
        query_as!(
            Group,
            r#"
            SELECT id, name, leader_id, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        sort: &str,
    ) -> Result<Vec<Group>, sqlx_core::Error> {
        let order_by = if sort.eq_ignore_ascii_case("asc") {
            "ASC"
        } else {
            "DESC"
        };
        let query = format!(
            r#"
            SELECT id, name, leader_id, created_at, updated_at
            FROM groups
            ORDER BY created_at {}
            LIMIT $1 OFFSET $2
            "#,
            order_by
        );
        query_as!(Group, &query, limit, offset)
            .fetch_all(self.pool)
            .await
    }

    /// Updates name and leader. A new leader gets a `LEADER` row and the
    /// previous leader is demoted to `MEMBER`.
    pub async fn update(
        &self,
        group_id: Uuid,
        name: &str,
        leader_id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, sqlx_core::Error> {
        let mut tx = self.pool.begin().await?;
        let affected = query!(
            r#"
            UPDATE groups
            SET name = $2, leader_id = $3, updated_at = $4
            WHERE id = $1
            "#,
            group_id,
            name,
            leader_id,
            updated_at
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            tx.rollback().await?;
            return Ok(0);
        }
        query!(
            r#"
            UPDATE group_members
            SET role = $3
            WHERE group_id = $1 AND user_id <> $2 AND role = $4
            "#,
            group_id,
            leader_id,
            MemberRole::Member.as_i32(),
            MemberRole::Leader.as_i32()
        )
        .execute(&mut *tx)
        .await?;
        query!(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id) DO UPDATE SET role = excluded.role
            "#,
            Uuid::now_v7(),
            group_id,
            leader_id,
            MemberRole::Leader.as_i32(),
            updated_at
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(affected)
    }

    /// Reads the leader on a caller-owned transaction and locks the group
    /// row until it ends, so a concurrent leader change waits for it.
    pub async fn leader_for_update(
        conn: &mut PgConnection,
        group_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx_core::Error> {
        let row: Option<(Uuid,)> = query_as!(
            (Uuid,),
            r#"
            SELECT leader_id
            FROM groups
            WHERE id = $1
            FOR UPDATE
            "#,
            group_id
        )
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(|(leader_id,)| leader_id))
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            DELETE FROM groups
            WHERE id = $1
            "#,
            id
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }
}

pub struct GroupMemberRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupMemberRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns `false` when the user already belonged to the group.
    pub async fn create(&self, member: &GroupMember) -> Result<bool, sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO group_members (id, group_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
            member.id,
            member.group_id,
            member.user_id,
            member.role.as_i32(),
            member.joined_at
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected() > 0)
    }

    pub async fn list_by_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMember>, sqlx_core::Error> {
        query_as!(
            GroupMember,
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1
            ORDER BY role ASC, joined_at ASC, user_id ASC
            "#,
            group_id
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn get(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, sqlx_core::Error> {
        query_as!(
            GroupMember,
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
            group_id,
            user_id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn delete(&self, group_id: Uuid, user_id: Uuid) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            DELETE FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
            group_id,
            user_id
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    /// Makes the member rows of `group_id` exactly `user_ids` plus the
    /// current leader, in one transaction. `None` when the group is gone.
    pub async fn replace_for_group(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Vec<GroupMember>>, sqlx_core::Error> {
        let mut tx = self.pool.begin().await?;
        let members = Self::replace_in(&mut tx, group_id, user_ids, joined_at).await?;
        tx.commit().await?;
        Ok(members)
    }

    /// Replacement on a caller-owned transaction. The leader is read under a
    /// row lock on `groups`. Rows already present keep their id and join
    /// time, so replaying the same target changes nothing.
    pub async fn replace_in(
        conn: &mut PgConnection,
        group_id: Uuid,
        user_ids: &[Uuid],
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Vec<GroupMember>>, sqlx_core::Error> {
        let Some(leader_id) = GroupRepo::leader_for_update(&mut *conn, group_id).await? else {
            return Ok(None);
        };
        let mut target: Vec<Uuid> = user_ids.to_vec();
        target.push(leader_id);
        target.sort();
        target.dedup();

        query!(
            r#"
            DELETE FROM group_members
            WHERE group_id = $1 AND NOT (user_id = ANY($2))
            "#,
            group_id,
            &target
        )
        .execute(&mut *conn)
        .await?;

        for user_id in &target {
            let role = if *user_id == leader_id {
                MemberRole::Leader
            } else {
                MemberRole::Member
            };
            query!(
                r#"
                INSERT INTO group_members (id, group_id, user_id, role, joined_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (group_id, user_id) DO UPDATE SET role = excluded.role
                "#,
                Uuid::now_v7(),
                group_id,
                *user_id,
                role.as_i32(),
                joined_at
            )
            .execute(&mut *conn)
            .await?;
        }

        let members = query_as!(
            GroupMember,
            r#"
            SELECT id, group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1
            ORDER BY role ASC, joined_at ASC, user_id ASC
            "#,
            group_id
        )
        .fetch_all(&mut *conn)
        .await?;

        tracing::debug!(
            event = "group_members_replace_applied",
            group_id = %group_id,
            leader_id = %leader_id,
            members = members.len(),
        );
        Ok(Some(members))
    }
}
