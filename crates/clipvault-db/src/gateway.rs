use async_trait::async_trait;
use clipvault_core::{AppError, Video};
use uuid::Uuid;

/// Read/update access to the record that owns an upload.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// Look up a record by id. `Ok(None)` when it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    fn is_owned_by(&self, record: &Video, user_id: Uuid) -> bool {
        record.is_owned_by(user_id)
    }

    /// Persist the record's mutable fields. Fails with `NotFound` if the row is gone.
    async fn update(&self, record: &Video) -> Result<(), AppError>;
}
