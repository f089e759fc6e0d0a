//! Persistence adapters for the records that own uploaded videos.
//!
//! The upload pipeline only ever talks to [`MetadataGateway`]; `PgVideoRepository` backs it with
//! PostgreSQL and `InMemoryVideoRepository` with a process-local map for tests and local runs.

pub mod gateway;
pub mod memory;
pub mod video;

pub use gateway::MetadataGateway;
pub use memory::InMemoryVideoRepository;
pub use video::{connect, run_migrations, PgVideoRepository};
