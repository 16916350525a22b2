use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{AnnotationStore, StoreError, StoreResult};
use crate::annotations::model::{now_utc, Annotation, AnnotationPatch, NewAnnotation};

const COLUMNS: &str = "id, owner_id, name, x, y, width, height, fill, stroke, stroke_width, \
                       created_at, updated_at";

#[derive(Debug, FromRow)]
struct AnnotationRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: String,
    stroke: String,
    stroke_width: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AnnotationRow> for Annotation {
    fn from(r: AnnotationRow) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            fill: r.fill,
            stroke: r.stroke,
            stroke_width: r.stroke_width,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgAnnotationStore {
    db: PgPool,
}

impl PgAnnotationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AnnotationStore for PgAnnotationStore {
    async fn create(&self, owner_id: Uuid, new: NewAnnotation) -> StoreResult<Annotation> {
        new.validate()?;
        let annotation = new.into_annotation(owner_id, now_utc());
        let row = sqlx::query_as::<_, AnnotationRow>(&format!(
            r#"
            INSERT INTO annotations ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(annotation.id)
        .bind(annotation.owner_id)
        .bind(&annotation.name)
        .bind(annotation.x)
        .bind(annotation.y)
        .bind(annotation.width)
        .bind(annotation.height)
        .bind(&annotation.fill)
        .bind(&annotation.stroke)
        .bind(annotation.stroke_width)
        .bind(annotation.created_at)
        .bind(annotation.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Annotation> {
        sqlx::query_as::<_, AnnotationRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM annotations
            WHERE id = $1 AND owner_id = $2
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .map(Annotation::from)
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Annotation>> {
        let rows = sqlx::query_as::<_, AnnotationRow>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM annotations
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Annotation::from).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: AnnotationPatch,
    ) -> StoreResult<Annotation> {
        patch.validate()?;
        // Single statement: absent fields keep their column value and updated_at
        // always moves forward, even on a clock tie.
        sqlx::query_as::<_, AnnotationRow>(&format!(
            r#"
            UPDATE annotations SET
                name = COALESCE($3, name),
                x = COALESCE($4, x),
                y = COALESCE($5, y),
                width = COALESCE($6, width),
                height = COALESCE($7, height),
                fill = COALESCE($8, fill),
                stroke = COALESCE($9, stroke),
                stroke_width = COALESCE($10, stroke_width),
                updated_at = GREATEST($11, updated_at + interval '1 microsecond')
            WHERE id = $1 AND owner_id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.name)
        .bind(patch.x)
        .bind(patch.y)
        .bind(patch.width)
        .bind(patch.height)
        .bind(patch.fill)
        .bind(patch.stroke)
        .bind(patch.stroke_width)
        .bind(now_utc())
        .fetch_optional(&self.db)
        .await?
        .map(Annotation::from)
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
