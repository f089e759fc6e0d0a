use crate::gateway::MetadataGateway;
use async_trait::async_trait;
use clipvault_core::{AppError, Video};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local video records, for tests and storage-only local runs.
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }

    pub async fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl MetadataGateway for InMemoryVideoRepository {
    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.get(id).await)
    }

    async fn update(&self, record: &Video) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", record.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_returns_none_for_unknown_id() {
        let repo = InMemoryVideoRepository::new();
        assert!(repo.fetch(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_stored_record() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let mut video = Video::new(owner, "boots");
        repo.insert(video.clone()).await;

        video.set_video_url("https://clips.s3.us-east-1.amazonaws.com/other/a.mp4".to_string());
        repo.update(&video).await.unwrap();

        let stored = repo.fetch(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, video.video_url);
        assert!(repo.is_owned_by(&stored, owner));
        assert!(!repo.is_owned_by(&stored, Uuid::new_v4()));
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let repo = InMemoryVideoRepository::new();
        let video = Video::new(Uuid::new_v4(), "ghost");
        assert!(matches!(repo.update(&video).await, Err(AppError::NotFound(_))));
    }
}
