use crate::db::store::{ClaimOutcome, VideoDetails, VideoRecordStore};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;
use vidvault_core::{AppError, Video, VideoPrivacy};

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, duration_secs, size_bytes, \
     view_count, download_count, privacy, created_at, updated_at";

/// Repository for video rows
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `RETURNING (xmax = 0)` is true for a freshly inserted row and false for a row that
/// went through the `DO UPDATE` branch. No returned row means the `WHERE` of the
/// conflict branch filtered it out: the row belongs to another owner.
fn claim_outcome(row: Option<PgRow>) -> Result<ClaimOutcome, AppError> {
    match row {
        None => Ok(ClaimOutcome::OwnedByOther),
        Some(row) => {
            let inserted: bool = row.try_get("inserted")?;
            Ok(if inserted {
                ClaimOutcome::Created
            } else {
                ClaimOutcome::AlreadyOwned
            })
        }
    }
}

#[async_trait]
impl VideoRecordStore for VideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn owned_by(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(owned)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "upsert", db.record_id = %id))]
    async fn claim(&self, id: Uuid, owner_id: Uuid) -> Result<ClaimOutcome, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO videos (id, owner_id, privacy)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET updated_at = videos.updated_at
                WHERE videos.owner_id = EXCLUDED.owner_id
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(VideoPrivacy::Processing.as_i16())
        .fetch_optional(&self.pool)
        .await?;

        let outcome = claim_outcome(row)?;
        if outcome == ClaimOutcome::Created {
            tracing::info!(video_id = %id, owner_id = %owner_id, "Video row created in processing state");
        }
        Ok(outcome)
    }

    #[tracing::instrument(skip(self, details), fields(db.table = "videos", db.operation = "upsert", db.record_id = %id))]
    async fn apply_metadata(
        &self,
        id: Uuid,
        owner_id: Uuid,
        details: &VideoDetails,
    ) -> Result<ClaimOutcome, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO videos (id, owner_id, title, description, duration_secs, privacy)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
                SET title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    duration_secs = EXCLUDED.duration_secs,
                    updated_at = NOW()
                WHERE videos.owner_id = EXCLUDED.owner_id
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.duration_secs)
        .bind(VideoPrivacy::Processing.as_i16())
        .fetch_optional(&self.pool)
        .await?;

        claim_outcome(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_privacy(
        &self,
        id: Uuid,
        owner_id: Uuid,
        privacy: VideoPrivacy,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET privacy = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(privacy.as_i16())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET size_bytes = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(size_bytes)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn increment_views(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE videos SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn increment_downloads(&self, id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE videos SET download_count = download_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

struct VideoRow(Video);

impl<'r> sqlx::FromRow<'r, PgRow> for VideoRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let privacy: i16 = row.try_get("privacy")?;
        let privacy = VideoPrivacy::try_from(privacy).map_err(|e| sqlx::Error::ColumnDecode {
            index: "privacy".to_string(),
            source: e.into(),
        })?;

        Ok(VideoRow(Video {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            duration_secs: row.try_get("duration_secs")?,
            size_bytes: row.try_get("size_bytes")?,
            view_count: row.try_get("view_count")?,
            download_count: row.try_get("download_count")?,
            privacy,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}
