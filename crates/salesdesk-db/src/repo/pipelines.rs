use super::prelude::*;

pub struct PipelineRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PipelineRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, pipeline: &Pipeline) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO pipelines (id, name, created_at)
            VALUES ($1, $2, $3)
            "#,
            pipeline.id,
            pipeline.name.as_str(),
            pipeline.created_at
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Pipeline>, sqlx_core::Error> {
        query_as!(
            Pipeline,
            r#"
            SELECT id, name, created_at
            FROM pipelines
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await
    }
}

pub struct StageRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StageRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, stage: &PipelineStage) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO pipeline_stages (id, pipeline_id, name, position)
            VALUES ($1, $2, $3, $4)
            "#,
            stage.id,
            stage.pipeline_id,
            stage.name.as_str(),
            stage.position
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<PipelineStage>, sqlx_core::Error> {
        query_as!(
            PipelineStage,
            r#"
            SELECT id, pipeline_id, name, position
            FROM pipeline_stages
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn list_by_pipeline(
        &self,
        pipeline_id: Uuid,
    ) -> Result<Vec<PipelineStage>, sqlx_core::Error> {
        query_as!(
            PipelineStage,
            r#"
            SELECT id, pipeline_id, name, position
            FROM pipeline_stages
            WHERE pipeline_id = $1
            ORDER BY position ASC
            "#,
            pipeline_id
        )
        .fetch_all(self.pool)
        .await
    }
}

pub struct DealRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DealRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, deal: &Deal) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO deals (
                id, title, value_cents, stage_id, owner_id, position, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            deal.id,
            deal.title.as_str(),
            deal.value_cents,
            deal.stage_id,
            deal.owner_id,
            deal.position,
            deal.created_at,
            deal.updated_at
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Deal>, sqlx_core::Error> {
        query_as!(
            Deal,
            r#"
            SELECT id, title, value_cents, stage_id, owner_id, position, created_at, updated_at
            FROM deals
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn list_by_pipeline(&self, pipeline_id: Uuid) -> Result<Vec<Deal>, sqlx_core::Error> {
        query_as!(
            Deal,
            r#"
            SELECT d.id, d.title, d.value_cents, d.stage_id, d.owner_id, d.position,
                   d.created_at, d.updated_at
            FROM deals d
            JOIN pipeline_stages s ON s.id = d.stage_id
            WHERE s.pipeline_id = $1
            ORDER BY s.position ASC, d.position ASC
            "#,
            pipeline_id
        )
        .fetch_all(self.pool)
        .await
    }

    /// Moves a deal into `stage_id` at `position`, closing the gap it left
    /// and shifting later cards in the target stage down by one.
    pub async fn move_to_stage(
        &self,
        deal_id: Uuid,
        stage_id: Uuid,
        position: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Deal>, sqlx_core::Error> {
        let mut tx = self.pool.begin().await?;
        let current = query_as!(
            Deal,
            r#"
            SELECT id, title, value_cents, stage_id, owner_id, position, created_at, updated_at
            FROM deals
            WHERE id = $1
            FOR UPDATE
            "#,
            deal_id
        )
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        query!(
            r#"
            UPDATE deals
            SET position = position - 1
            WHERE stage_id = $1 AND position > $2 AND id <> $3
            "#,
            current.stage_id,
            current.position,
            deal_id
        )
        .execute(&mut *tx)
        .await?;

        let (max_position,) = query_as!(
            (Option<i32>,),
            r#"
            SELECT MAX(position)
            FROM deals
            WHERE stage_id = $1 AND id <> $2
            "#,
            stage_id,
            deal_id
        )
        .fetch_one(&mut *tx)
        .await?;
        let position = position.clamp(0, max_position.map_or(0, |max| max + 1));

        query!(
            r#"
            UPDATE deals
            SET position = position + 1
            WHERE stage_id = $1 AND position >= $2 AND id <> $3
            "#,
            stage_id,
            position,
            deal_id
        )
        .execute(&mut *tx)
        .await?;

        let moved = query_as!(
            Deal,
            r#"
            UPDATE deals
            SET stage_id = $2, position = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, title, value_cents, stage_id, owner_id, position, created_at, updated_at
            "#,
            deal_id,
            stage_id,
            position,
            updated_at
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(moved))
    }
}
