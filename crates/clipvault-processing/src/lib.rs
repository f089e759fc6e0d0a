//! Clipvault Processing Library
//!
//! Video inspection and container rewriting built on the external `ffprobe` and `ffmpeg`
//! binaries, and the upload pipeline that ties them to key derivation, the object store and
//! the owning record.

pub mod aspect;
pub mod probe;
pub mod remux;
pub mod upload;

pub use aspect::{classify_dimensions, AspectClassifier};
pub use probe::{ClassifyError, FfprobeProbe, StreamGeometry, StreamProbe};
pub use remux::{processing_path, FastStartTranscoder, FfmpegRemuxer, Remuxer, TranscodeError};
pub use upload::{
    media_type_essence, ErrorKind, PipelineError, PipelineSettings, PipelineStage,
    UploadBody, UploadPipeline, UploadRequest,
};
