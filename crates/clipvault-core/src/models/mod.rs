//! Domain models shared across Clipvault crates.

pub mod aspect;
pub mod video;

pub use aspect::AspectCategory;
pub use video::Video;
