//! Color scales for field layers.
//!
//! The scales follow the ColorBrewer sequential and diverging ramps used by
//! most meteorological plotting tools. Values are normalized to 0..1 before
//! lookup and interpolated linearly between stops.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with alpha scaled by `opacity` (0..1).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

/// Linear interpolation between two colors.
pub fn interpolate_color(c1: Color, c2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color::new(
        mix(c1.r, c2.r),
        mix(c1.g, c2.g),
        mix(c1.b, c2.b),
        mix(c1.a, c2.a),
    )
}

/// A named ramp of evenly spaced color stops.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    pub name: &'static str,
    stops: &'static [[u8; 3]],
    reversed: bool,
}

const BLUES_STOPS: [[u8; 3]; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

const REDS_STOPS: [[u8; 3]; 9] = [
    [255, 245, 240],
    [254, 224, 210],
    [252, 187, 161],
    [252, 146, 114],
    [251, 106, 74],
    [239, 59, 44],
    [203, 24, 29],
    [165, 15, 21],
    [103, 0, 13],
];

const RDYLBU_STOPS: [[u8; 3]; 11] = [
    [165, 0, 38],
    [215, 48, 39],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 144],
    [255, 255, 191],
    [224, 243, 248],
    [171, 217, 233],
    [116, 173, 209],
    [69, 117, 180],
    [49, 54, 149],
];

const YLGNBU_STOPS: [[u8; 3]; 9] = [
    [255, 255, 217],
    [237, 248, 177],
    [199, 233, 180],
    [127, 205, 187],
    [65, 182, 196],
    [29, 145, 192],
    [34, 94, 168],
    [37, 52, 148],
    [8, 29, 88],
];

impl Colormap {
    /// White to dark blue. Precipitation.
    pub const BLUES: Colormap = Colormap {
        name: "Blues",
        stops: &BLUES_STOPS,
        reversed: false,
    };

    /// White to dark red. Drought index.
    pub const REDS: Colormap = Colormap {
        name: "Reds",
        stops: &REDS_STOPS,
        reversed: false,
    };

    /// Blue (cold) through yellow to red (warm). Temperature.
    pub const RDYLBU_R: Colormap = Colormap {
        name: "RdYlBu_r",
        stops: &RDYLBU_STOPS,
        reversed: true,
    };

    /// Dark blue to pale yellow. Aerosol optical depth.
    pub const YLGNBU_R: Colormap = Colormap {
        name: "YlGnBu_r",
        stops: &YLGNBU_STOPS,
        reversed: true,
    };

    /// Color at normalized position `t`. NaN maps to transparent.
    pub fn sample(&self, t: f64) -> Color {
        if t.is_nan() {
            return Color::TRANSPARENT;
        }
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };

        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let [r1, g1, b1] = self.stops[i];
        let [r2, g2, b2] = self.stops[j];
        interpolate_color(
            Color::rgb(r1, g1, b1),
            Color::rgb(r2, g2, b2),
            pos - i as f64,
        )
    }

    /// Color for `value` scaled into `min..max`.
    ///
    /// A degenerate range maps every finite value to the low end.
    pub fn sample_range(&self, value: f64, min: f64, max: f64) -> Color {
        if !value.is_finite() {
            return Color::TRANSPARENT;
        }
        let range = max - min;
        if range.is_nan() || range.abs() <= f64::EPSILON {
            return self.sample(0.0);
        }
        self.sample((value - min) / range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(Colormap::BLUES.sample(0.0), Color::rgb(247, 251, 255));
        assert_eq!(Colormap::BLUES.sample(1.0), Color::rgb(8, 48, 107));
    }

    #[test]
    fn test_reversed_endpoints() {
        // Reversed RdYlBu: cold is blue, warm is red
        assert_eq!(Colormap::RDYLBU_R.sample(0.0), Color::rgb(49, 54, 149));
        assert_eq!(Colormap::RDYLBU_R.sample(1.0), Color::rgb(165, 0, 38));
    }

    #[test]
    fn test_nan_is_transparent() {
        assert_eq!(Colormap::REDS.sample(f64::NAN), Color::TRANSPARENT);
        assert_eq!(Colormap::REDS.sample_range(f64::NAN, 0.0, 1.0), Color::TRANSPARENT);
    }

    #[test]
    fn test_midpoint_interpolation() {
        let mid = interpolate_color(Color::rgb(0, 0, 0), Color::rgb(200, 100, 50), 0.5);
        assert_eq!(mid, Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(
            Colormap::REDS.sample_range(0.5, 0.5, 0.5),
            Colormap::REDS.sample(0.0)
        );
    }

    #[test]
    fn test_with_opacity() {
        assert_eq!(Color::BLACK.with_opacity(0.5).a, 128);
    }
}
