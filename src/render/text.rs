use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};

use super::canvas::{Canvas, Rgba};

/// Common locations of a sans font on Linux, macOS and Windows.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextOverlay {
    font: Font,
    font_size: f32,
}

impl TextOverlay {
    pub fn from_bytes(bytes: &[u8], font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;
        Ok(Self { font, font_size })
    }

    pub fn from_path(path: &Path, font_size: f32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        Self::from_bytes(&bytes, font_size)
    }

    /// Explicit path first, then well-known system fonts. `None` means
    /// labels are laid out but not rasterized.
    pub fn discover(explicit: Option<&Path>, font_size: f32) -> Option<Self> {
        if let Some(path) = explicit {
            match Self::from_path(path, font_size) {
                Ok(overlay) => return Some(overlay),
                Err(err) => log::warn!("{:#}", err),
            }
        }
        let found = SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.exists())?;
        log::debug!("Using system font {}", found.display());
        Self::from_path(&found, font_size).ok()
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Composite text with its top-left corner at (x, y).
    pub fn composite(&self, canvas: &mut Canvas, text: &str, x: i64, y: i64, color: Rgba) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            let glyph_y = y + self.font_size as i64 - metrics.height as i64 - metrics.ymin as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }
                    let a = alpha as f64 / 255.0 * (color.0[3] as f64 / 255.0);
                    canvas.blend(
                        cursor_x + metrics.xmin as i64 + gx as i64,
                        glyph_y + gy as i64,
                        color.with_alpha(a),
                    );
                }
            }

            cursor_x += metrics.advance_width.round() as i64;
        }
    }

    /// Composite text horizontally centered on `cx`.
    pub fn composite_centered(&self, canvas: &mut Canvas, text: &str, cx: f64, y: i64, color: Rgba) {
        let x = (cx - self.measure_width(text) as f64 / 2.0).round() as i64;
        self.composite(canvas, text, x, y, color);
    }

    pub fn measure_width(&self, text: &str) -> u32 {
        let mut width = 0.0f32;
        for ch in text.chars() {
            let (metrics, _) = self.font.rasterize(ch, self.font_size);
            width += metrics.advance_width;
        }
        width.ceil() as u32
    }
}
