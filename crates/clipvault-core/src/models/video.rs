use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The record that owns an uploaded video.
///
/// `video_url` is the public location of the stored asset. It is only ever written after the
/// object store has accepted the bytes; a failed upload leaves the previous value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Point the record at a newly stored asset.
    pub fn set_video_url(&mut self, url: String) {
        self.video_url = Some(url);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_video_has_no_url() {
        let video = Video::new(Uuid::new_v4(), "clip");
        assert!(video.video_url.is_none());
        assert_eq!(video.created_at, video.updated_at);
    }

    #[test]
    fn ownership_compares_user_ids() {
        let owner = Uuid::new_v4();
        let video = Video::new(owner, "clip");
        assert!(video.is_owned_by(owner));
        assert!(!video.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn set_video_url_bumps_updated_at() {
        let mut video = Video::new(Uuid::new_v4(), "clip");
        let before = video.updated_at;
        video.set_video_url("https://bucket.s3.us-east-1.amazonaws.com/k.mp4".to_string());
        assert_eq!(
            video.video_url.as_deref(),
            Some("https://bucket.s3.us-east-1.amazonaws.com/k.mp4")
        );
        assert!(video.updated_at >= before);
    }
}
