use std::collections::HashMap;
use std::path::PathBuf;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::style::TextStyle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// One shaped line of text plus everything needed to rasterize it.
pub struct TextRun {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
    pub(crate) stroke_color: Rgba8,
    pub(crate) stroke_width: u32,
}

impl TextRun {
    /// Advance width of the laid-out line, in pixels.
    pub fn width(&self) -> f32 {
        self.layout.width()
    }

    pub fn height(&self) -> f32 {
        self.layout.height()
    }
}

struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Fonts loaded by file name from one directory, each registered with Parley exactly once.
pub struct FontBook {
    fonts_dir: PathBuf,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    loaded: HashMap<String, LoadedFont>,
}

impl FontBook {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            loaded: HashMap::new(),
        }
    }

    fn ensure_font(&mut self, font_name: &str) -> ReelResult<()> {
        if self.loaded.contains_key(font_name) {
            return Ok(());
        }
        let path = self.fonts_dir.join(font_name);
        let bytes = std::fs::read(&path).map_err(|e| {
            ReelError::render(format!("failed to read font '{}': {e}", path.display()))
        })?;

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::render(format!("no font families found in '{}'", path.display()))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();

        tracing::debug!(font = font_name, %family, "registered font");
        self.loaded.insert(
            font_name.to_string(),
            LoadedFont {
                family,
                data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
            },
        );
        Ok(())
    }

    /// Shape `text` as a single unwrapped line in `style`.
    pub fn layout(&mut self, text: &str, style: &TextStyle) -> ReelResult<TextRun> {
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(ReelError::render("font_size must be finite and > 0"));
        }
        self.ensure_font(&style.font_name)?;
        let font = self
            .loaded
            .get(&style.font_name)
            .ok_or_else(|| ReelError::render("font vanished after registration"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            style.color,
        )));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(TextRun {
            layout,
            font: font.data.clone(),
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
