use crate::foundation::error::{ReelError, ReelResult};

/// Output canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::config("canvas width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(ReelError::config("canvas width/height must fit in u16"));
        }
        Ok(Self { width, height })
    }

    pub fn rect(self) -> PixelRect {
        PixelRect::new(0, 0, i64::from(self.width), i64::from(self.height))
    }
}

/// Axis-aligned integer rectangle, `x1`/`y1` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(self) -> i64 {
        self.y1 - self.y0
    }

    pub fn is_empty(self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersection with `other`; empty rectangles collapse to zero size at `self`'s origin.
    pub fn intersect(self, other: PixelRect) -> PixelRect {
        let r = PixelRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if r.is_empty() {
            PixelRect::new(self.x0, self.y0, self.x0, self.y0)
        } else {
            r
        }
    }
}

/// Straight (non-premultiplied) RGBA8 color as written in style documents.
///
/// Accepted forms: `"#rgb"`, `"#rrggbb"`, `"#rrggbbaa"`, a handful of CSS color names,
/// `[r, g, b]` and `[r, g, b, a]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn parse(s: &str) -> ReelResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ReelError::config(format!("invalid color '{s}'")));
        }
        named_color(&s.to_ascii_lowercase())
            .ok_or_else(|| ReelError::config(format!("unknown color name '{s}'")))
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    let nibble = |c: u8| -> Option<u8> { (c as char).to_digit(16).map(|v| v as u8) };
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Rgba8::opaque(r * 17, g * 17, b * 17))
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for (i, pair) in bytes.chunks_exact(2).enumerate() {
                out[i] = nibble(pair[0])? * 16 + nibble(pair[1])?;
            }
            Some(Rgba8 {
                r: out[0],
                g: out[1],
                b: out[2],
                a: out[3],
            })
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgba8> {
    let c = match name {
        "black" => Rgba8::BLACK,
        "white" => Rgba8::WHITE,
        "red" => Rgba8::opaque(255, 0, 0),
        "green" => Rgba8::opaque(0, 128, 0),
        "blue" => Rgba8::opaque(0, 0, 255),
        "yellow" => Rgba8::opaque(255, 255, 0),
        "orange" => Rgba8::opaque(255, 165, 0),
        "gray" | "grey" => Rgba8::opaque(128, 128, 128),
        "transparent" => Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
        _ => return None,
    };
    Some(c)
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum ColorDef {
            Text(String),
            Rgb([u8; 3]),
            Rgba([u8; 4]),
        }

        match ColorDef::deserialize(deserializer)? {
            ColorDef::Text(s) => Rgba8::parse(&s).map_err(serde::de::Error::custom),
            ColorDef::Rgb([r, g, b]) => Ok(Rgba8::opaque(r, g, b)),
            ColorDef::Rgba([r, g, b, a]) => Ok(Rgba8 { r, g, b, a }),
        }
    }
}

/// Format whole seconds as `MM:SS`; minutes are not wrapped at one hour.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
