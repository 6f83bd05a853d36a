//! Decoded inputs for the frame synthesizer and the audio timeline: images, fonts and PCM.

pub mod decode;
pub mod media;
pub mod text;

pub use decode::PreparedImage;
pub use text::{FontBook, TextRun};
