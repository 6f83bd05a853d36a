//! Frame synthesizer: one deterministic raster frame per positional state.
//!
//! A [`Scene`] owns everything that stays fixed across frames (style, decoded images, fonts,
//! precomposed backgrounds). [`Scene::render`] maps a [`FrameState`] to exactly one
//! `width x height` frame and has no other inputs, so identical calls give identical bytes.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::render::canvas::FrameRGBA;

pub mod background;
pub mod still;
pub mod timebar;
pub mod tracklist;

pub use still::StillScene;
pub use timebar::TimebarScene;
pub use tracklist::TracklistScene;

/// Positional input of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// Whole seconds elapsed out of `total`.
    Progress { elapsed: u64, total: u64 },
    /// Zero-based index of the highlighted row.
    Tracklist { current: usize },
    Still,
}

pub enum Scene {
    Timebar(TimebarScene),
    Tracklist(TracklistScene),
    Still(StillScene),
}

impl Scene {
    pub fn render(&mut self, state: FrameState) -> ReelResult<FrameRGBA> {
        match (self, state) {
            (Scene::Timebar(s), FrameState::Progress { elapsed, total }) => s.render(elapsed, total),
            (Scene::Tracklist(s), FrameState::Tracklist { current }) => s.render(current),
            (Scene::Still(s), FrameState::Still) => Ok(s.render()),
            (scene, state) => Err(ReelError::render(format!(
                "{} scene cannot render {state:?}",
                scene.kind()
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scene::Timebar(_) => "timebar",
            Scene::Tracklist(_) => "tracklist",
            Scene::Still(_) => "still",
        }
    }
}

/// Write `frame` as a baseline JPEG at quality 100.
pub fn save_jpeg(frame: &FrameRGBA, path: &Path) -> ReelResult<()> {
    use image::ImageEncoder as _;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    let rgb = frame.to_rgb8()?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("create '{}'", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, 100)
        .write_image(&rgb, frame.width, frame.height, image::ExtendedColorType::Rgb8)
        .map_err(|e| ReelError::render(format!("encode jpeg '{}': {e}", path.display())))?;
    std::io::Write::flush(&mut writer).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/synth/mod.rs"]
mod tests;
