//! CPU rasterization: the drawing surface and the blur kernel.

pub mod blur;
pub mod canvas;

pub use canvas::{FrameRGBA, RasterCanvas};
