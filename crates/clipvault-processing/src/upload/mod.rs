//! Upload pipeline: validate → spool → classify → remux → key → store → commit.

pub mod error;
pub mod pipeline;
pub mod types;

pub use error::{ErrorKind, PipelineError, PipelineStage};
pub use pipeline::{media_type_essence, UploadPipeline};
pub use types::{PipelineSettings, UploadBody, UploadRequest};
