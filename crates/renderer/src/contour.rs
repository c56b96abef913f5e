//! Isolines via marching squares.
//!
//! Segments come out in grid units: `x` is the column index and `y` the row
//! index of the grid as passed in (row 0 at the top of the image).

use ndarray::Array2;

/// A point in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// `count` levels evenly spaced strictly inside `min..max`.
///
/// Returns nothing for a flat or non-finite range.
pub fn evenly_spaced_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max - min <= f64::EPSILON || count == 0 {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f64;
    (1..=count).map(|i| min + step * i as f64).collect()
}

/// Extract segments of one contour level.
///
/// Cells touching a NaN corner are skipped.
pub fn march_squares(grid: &Array2<f64>, level: f64) -> Vec<Segment> {
    let (height, width) = grid.dim();
    if width < 2 || height < 2 {
        return vec![];
    }

    let mut segments = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let tl = grid[[y, x]];
            let tr = grid[[y, x + 1]];
            let bl = grid[[y + 1, x]];
            let br = grid[[y + 1, x + 1]];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }

            cell_segments(case, x as f64, y as f64, [tl, tr, br, bl], level, &mut segments);
        }
    }
    segments
}

fn cell_segments(
    case: u8,
    x: f64,
    y: f64,
    [tl, tr, br, bl]: [f64; 4],
    level: f64,
    out: &mut Vec<Segment>,
) {
    let top = || interpolate_edge(Point::new(x, y), Point::new(x + 1.0, y), tl, tr, level);
    let right = || interpolate_edge(Point::new(x + 1.0, y), Point::new(x + 1.0, y + 1.0), tr, br, level);
    let bottom = || interpolate_edge(Point::new(x, y + 1.0), Point::new(x + 1.0, y + 1.0), bl, br, level);
    let left = || interpolate_edge(Point::new(x, y), Point::new(x, y + 1.0), tl, bl, level);
    let mut push = |start: Point, end: Point| out.push(Segment { start, end });

    match case {
        1 | 14 => push(left(), top()),
        2 | 13 => push(top(), right()),
        3 | 12 => push(left(), right()),
        4 | 11 => push(right(), bottom()),
        6 | 9 => push(top(), bottom()),
        7 | 8 => push(left(), bottom()),
        // Saddles: two separate segments
        5 => {
            push(left(), top());
            push(right(), bottom());
        }
        10 => {
            push(top(), right());
            push(left(), bottom());
        }
        _ => {}
    }
}

fn interpolate_edge(p1: Point, p2: Point, v1: f64, v2: f64, level: f64) -> Point {
    if (v2 - v1).abs() < 1e-12 {
        return Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(p1.x + t * (p2.x - p1.x), p1.y + t * (p2.y - p1.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_levels_strictly_inside() {
        let levels = evenly_spaced_levels(0.0, 11.0, 10);
        assert_eq!(levels.len(), 10);
        assert!((levels[0] - 1.0).abs() < 1e-12);
        assert!((levels[9] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_levels_flat_range() {
        assert!(evenly_spaced_levels(5.0, 5.0, 10).is_empty());
        assert!(evenly_spaced_levels(f64::NAN, 5.0, 10).is_empty());
    }

    #[test]
    fn test_vertical_gradient_crossing() {
        // Left column 0, right column 10: level 5 crosses the middle
        let grid = array![[0.0, 10.0], [0.0, 10.0]];
        let segments = march_squares(&grid, 5.0);
        assert_eq!(segments.len(), 1);
        let seg = segments[0];
        assert!((seg.start.x - 0.5).abs() < 1e-12);
        assert!((seg.end.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_cell_skipped() {
        let grid = array![[0.0, f64::NAN], [0.0, 10.0]];
        assert!(march_squares(&grid, 5.0).is_empty());
    }

    #[test]
    fn test_saddle_produces_two_segments() {
        let grid = array![[10.0, 0.0], [0.0, 10.0]];
        assert_eq!(march_squares(&grid, 5.0).len(), 2);
    }
}
