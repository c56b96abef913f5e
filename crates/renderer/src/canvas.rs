//! RGBA raster with source-over blending and simple line drawing.

use crate::colormap::Color;

/// An RGBA8 pixel buffer, row 0 at the top.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some(Color::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Source-over composite of `color` onto one pixel. Out of bounds is a no-op.
    pub fn blend(&mut self, x: i64, y: i64, color: Color) {
        if color.a == 0 || x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let src_a = color.a as f64 / 255.0;
        let dst_a = self.pixels[i + 3] as f64 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }

        let channel = |src: u8, dst: u8| {
            let v = (src as f64 * src_a + dst as f64 * dst_a * (1.0 - src_a)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        self.pixels[i] = channel(color.r, self.pixels[i]);
        self.pixels[i + 1] = channel(color.g, self.pixels[i + 1]);
        self.pixels[i + 2] = channel(color.b, self.pixels[i + 2]);
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Blend a filled rectangle `[x0, x1) x [y0, y1)`.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, color: Color) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.blend(x as i64, y as i64, color);
            }
        }
    }

    /// One pixel wide line (DDA).
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        self.draw_pattern_line(x0, y0, x1, y1, color, None);
    }

    /// Line drawn as `(on, off)` pixel runs.
    pub fn draw_dashed_line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Color,
        dash: (usize, usize),
    ) {
        self.draw_pattern_line(x0, y0, x1, y1, color, Some(dash));
    }

    /// Shaft from `(x, y)` by `(dx, dy)` with a two-stroke head.
    pub fn draw_arrow(&mut self, x: f64, y: f64, dx: f64, dy: f64, color: Color) {
        let length = (dx * dx + dy * dy).sqrt();
        if length < 1.0 {
            self.blend(x.round() as i64, y.round() as i64, color);
            return;
        }
        let (tip_x, tip_y) = (x + dx, y + dy);
        self.draw_line(x, y, tip_x, tip_y, color);

        let head = (length * 0.35).max(2.0);
        let angle = dy.atan2(dx);
        for side in [-1.0, 1.0] {
            let a = angle + std::f64::consts::PI + side * 0.45;
            self.draw_line(tip_x, tip_y, tip_x + head * a.cos(), tip_y + head * a.sin(), color);
        }
    }

    fn draw_pattern_line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Color,
        dash: Option<(usize, usize)>,
    ) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize;
        if steps == 0 {
            self.blend(x0.round() as i64, y0.round() as i64, color);
            return;
        }
        let (sx, sy) = ((x1 - x0) / steps as f64, (y1 - y0) / steps as f64);
        for i in 0..=steps {
            if let Some((on, off)) = dash {
                if on + off > 0 && i % (on + off) >= on {
                    continue;
                }
            }
            let px = x0 + sx * i as f64;
            let py = y0 + sy * i as f64;
            self.blend(px.round() as i64, py.round() as i64, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_background() {
        let canvas = Canvas::new(2, 2, Color::rgb(10, 20, 30));
        assert_eq!(canvas.pixels().len(), 16);
        assert_eq!(canvas.get(1, 1), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_blend_opaque_replaces() {
        let mut canvas = Canvas::new(1, 1, Color::WHITE);
        canvas.blend(0, 0, Color::rgb(200, 0, 0));
        assert_eq!(canvas.get(0, 0), Some(Color::rgb(200, 0, 0)));
    }

    #[test]
    fn test_blend_half_alpha_over_white() {
        let mut canvas = Canvas::new(1, 1, Color::WHITE);
        canvas.blend(0, 0, Color::new(0, 0, 0, 128));
        let px = canvas.get(0, 0).unwrap();
        assert_eq!(px.a, 255);
        assert!((px.r as i32 - 127).abs() <= 1);
    }

    #[test]
    fn test_blend_out_of_bounds() {
        let mut canvas = Canvas::new(2, 2, Color::WHITE);
        canvas.blend(-1, 0, Color::BLACK);
        canvas.blend(0, 5, Color::BLACK);
        assert!(canvas.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_dashed_line_skips_pixels() {
        let mut canvas = Canvas::new(10, 1, Color::WHITE);
        canvas.draw_dashed_line(0.0, 0.0, 9.0, 0.0, Color::BLACK, (2, 2));
        assert_eq!(canvas.get(0, 0), Some(Color::BLACK));
        assert_eq!(canvas.get(1, 0), Some(Color::BLACK));
        assert_eq!(canvas.get(2, 0), Some(Color::WHITE));
        assert_eq!(canvas.get(4, 0), Some(Color::BLACK));
    }
}
