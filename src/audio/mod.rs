//! PCM buffers and the crossfaded playlist timeline.

pub mod pcm;
pub mod timeline;

pub use pcm::AudioBuffer;
pub use timeline::{AudioTimeline, SilencePad, TimecodeEntry};
