//! PostgreSQL round trips. Skipped unless `TEST_DATABASE_URL` points at a disposable database.

use clipvault_core::{AppError, Video};
use clipvault_db::{connect, run_migrations, MetadataGateway, PgVideoRepository};
use uuid::Uuid;

async fn setup() -> Option<PgVideoRepository> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = connect(&url).await.expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(PgVideoRepository::new(pool))
}

#[tokio::test]
async fn test_update_persists_video_url() {
    let Some(repo) = setup().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let owner = Uuid::new_v4();
    let mut video = repo.create(&Video::new(owner, "harbour timelapse")).await.unwrap();
    assert!(video.video_url.is_none());

    video.set_video_url("https://clips.s3.us-east-1.amazonaws.com/landscape/ab.mp4".to_string());
    repo.update(&video).await.unwrap();

    let stored = repo.fetch(video.id).await.unwrap().unwrap();
    assert_eq!(stored.video_url, video.video_url);
    assert!(repo.is_owned_by(&stored, owner));
}

#[tokio::test]
async fn test_fetch_and_update_unknown_video() {
    let Some(repo) = setup().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    assert!(repo.fetch(Uuid::new_v4()).await.unwrap().is_none());

    let ghost = Video::new(Uuid::new_v4(), "ghost");
    assert!(matches!(repo.update(&ghost).await, Err(AppError::NotFound(_))));
}
