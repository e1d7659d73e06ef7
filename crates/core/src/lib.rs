//! Interruptible, frame-sampling object segmentation for videos.
//!
//! A run extracts the frames of a source video, sends every N-th frame
//! through detection, segmentation, mask propagation and rendering, writes
//! the rest unchanged, and encodes the result. Runs can be stopped or told
//! to stop detecting between frames through the [`control`] channels.

pub mod control;
pub mod detection;
pub mod pipeline;
pub mod segmentation;
pub mod shared;
pub mod video;
