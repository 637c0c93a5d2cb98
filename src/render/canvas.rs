/// Largest width or height accepted for a frame.
pub const MAX_DIMENSION: u32 = 8192;

/// Reject frame sizes that are empty or too large to allocate sensibly.
pub fn validate_size(width: u32, height: u32) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("Canvas size {}x{} is empty", width, height);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        anyhow::bail!(
            "Canvas size {}x{} exceeds the {}px limit",
            width,
            height,
            MAX_DIMENSION
        );
    }
    Ok(())
}

/// Straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Rgba([channel(r), channel(g), channel(b), 255])
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
    }
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Software RGBA8 frame, row-major, top-left origin.
#[derive(Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = self.index(x, y);
        Rgba([
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ])
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Source-over blend of one pixel; out-of-bounds writes are ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        let a = color.0[3] as f32 / 255.0;
        let inv_a = 1.0 - a;
        for c in 0..3 {
            self.pixels[idx + c] =
                (color.0[c] as f32 * a + self.pixels[idx + c] as f32 * inv_a).round() as u8;
        }
        self.pixels[idx + 3] = 255;
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba) {
        for py in y..y + h as i64 {
            for px in x..x + w as i64 {
                self.blend(px, py, color);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba) {
        self.ring(cx, cy, 0.0, radius.max(0.0), color);
    }

    /// Stroke centered on `radius`, like a 2D-canvas `arc` + `stroke`.
    pub fn stroke_circle(&mut self, cx: f64, cy: f64, radius: f64, line_width: f64, color: Rgba) {
        let half = line_width / 2.0;
        self.ring(cx, cy, (radius - half).max(0.0), radius + half, color);
    }

    fn ring(&mut self, cx: f64, cy: f64, inner: f64, outer: f64, color: Rgba) {
        let x0 = (cx - outer).floor() as i64;
        let x1 = (cx + outer).ceil() as i64;
        let y0 = (cy - outer).floor() as i64;
        let y1 = (cy + outer).ceil() as i64;
        let (inner2, outer2) = (inner * inner, outer * outer);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let d2 = dx * dx + dy * dy;
                if d2 <= outer2 && d2 >= inner2 {
                    self.blend(x, y, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_circle_covers_center_not_corner() {
        let mut c = Canvas::new(40, 40);
        c.clear(Rgba::BLACK);
        c.fill_circle(20.0, 20.0, 10.0, Rgba::rgb(0.0, 255.0, 0.0));
        assert_eq!(c.pixel(20, 20), Rgba([0, 255, 0, 255]));
        assert_eq!(c.pixel(0, 0), Rgba::BLACK);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut c = Canvas::new(60, 60);
        c.clear(Rgba::BLACK);
        c.stroke_circle(30.0, 30.0, 20.0, 3.0, Rgba::WHITE);
        assert_eq!(c.pixel(30, 30), Rgba::BLACK);
        assert_eq!(c.pixel(50, 30), Rgba::WHITE);
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        assert!(validate_size(1000, 500).is_ok());
        assert!(validate_size(MAX_DIMENSION, MAX_DIMENSION).is_ok());
        assert!(validate_size(40_000, 30_000).is_err());
        assert!(validate_size(0, 500).is_err());
    }

    #[test]
    fn wide_canvas_indexes_last_pixel() {
        let mut c = Canvas::new(MAX_DIMENSION, 2);
        c.blend(MAX_DIMENSION as i64 - 1, 1, Rgba::WHITE);
        assert_eq!(c.pixel(MAX_DIMENSION - 1, 1), Rgba::WHITE);
        assert_eq!(c.pixels().len(), MAX_DIMENSION as usize * 2 * 4);
    }

    #[test]
    fn blend_mixes_and_clips() {
        let mut c = Canvas::new(2, 2);
        c.clear(Rgba::BLACK);
        c.blend(0, 0, Rgba::WHITE.with_alpha(0.2));
        assert_eq!(c.pixel(0, 0).0[0], 51);
        c.blend(-1, 5, Rgba::WHITE);
        c.fill_rect(1, 1, 5, 5, Rgba::WHITE);
        assert_eq!(c.pixel(1, 1), Rgba::WHITE);
    }
}
