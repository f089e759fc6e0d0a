use crate::gateway::MetadataGateway;
use anyhow::Context;
use async_trait::async_trait;
use clipvault_core::{AppError, Video};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

/// Open a connection pool against `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    Ok(())
}

/// Video records stored in PostgreSQL.
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, video: &Video) -> Result<Video, AppError> {
        let row: Video = sqlx::query_as::<Postgres, Video>(
            r#"
            INSERT INTO videos (id, user_id, title, description, video_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(video_id = %row.id, user_id = %row.user_id, "Video record created");

        Ok(row)
    }
}

#[async_trait]
impl MetadataGateway for PgVideoRepository {
    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row = sqlx::query_as::<Postgres, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update(&self, record: &Video) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, description = $3, video_url = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.video_url)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", record.id)));
        }

        tracing::debug!(video_id = %record.id, "Video record updated");

        Ok(())
    }
}
