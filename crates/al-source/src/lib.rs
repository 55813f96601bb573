//! Frame sources and frame sampling for asciiloop.
//!
//! `resize` scales captured frames down to the character grid; `video`
//! drives ffmpeg/ffprobe to scrub a clip and capture frames on demand.

pub mod resize;
pub mod video;
