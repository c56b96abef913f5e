//! Test data generators for creating synthetic reanalysis-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major with
//! row 0 at the first latitude.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a 2 m temperature grid in Kelvin.
///
/// Values range from 280K to 310K, warming towards the last row and column.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            let y_factor = row as f64 / height.max(1) as f64;
            data.push(280.0 + x_factor * 15.0 + y_factor * 15.0);
        }
    }
    data
}

/// Creates a U-component (west-east) wind grid in m/s, varying by row.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for _col in 0..width {
            let lat_factor = (row as f64 / height.max(1) as f64 - 0.5) * 2.0;
            data.push(lat_factor * 10.0);
        }
    }
    data
}

/// Creates a V-component (south-north) wind grid in m/s, varying by column.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f64 / width.max(1) as f64 - 0.5) * 2.0;
            data.push(lon_factor * 8.0);
        }
    }
    data
}

/// Creates a root-zone soil wetness grid (fraction 0..1), drier to the east.
pub fn create_soil_moisture_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            data.push(0.6 - 0.4 * x_factor);
        }
    }
    data
}

/// Creates a deterministic precipitation rate grid in kg m⁻² s⁻¹.
///
/// Most cells are dry; wet cells reach about 5e-5 (≈ 4.3 mm/day).
pub fn create_precipitation_rate_grid(width: usize, height: usize, seed: u32) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let rate = if hash % 3 == 0 {
                (hash % 5000) as f64 * 1e-8
            } else {
                0.0
            };
            data.push(rate);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at the given `(col, row)` positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f64> {
    let mut data = vec![0.0f64; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f64::NAN;
        }
    }
    data
}

/// Creates RGBA pixel data for a simple gradient pattern.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[11], 1001.0);
    }

    #[test]
    fn test_temperature_range() {
        let grid = create_temperature_grid(50, 50);
        assert!(grid.iter().all(|&t| (280.0..=310.0).contains(&t)));
    }

    #[test]
    fn test_soil_moisture_range() {
        let grid = create_soil_moisture_grid(20, 4);
        assert!(grid.iter().all(|&s| s > 0.0 && s <= 0.6));
        assert!(grid[0] > grid[19]);
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan());
        assert!(grid[55].is_nan());
        assert!(!grid[1].is_nan());
    }

    #[test]
    fn test_precipitation_deterministic() {
        let grid1 = create_precipitation_rate_grid(40, 40, 42);
        let grid2 = create_precipitation_rate_grid(40, 40, 42);
        assert_eq!(grid1, grid2, "Same seed should produce same data");
        assert!(grid1.iter().any(|&p| p > 0.0));
    }
}
