//! Geographic bounding box in longitude/latitude degrees.

use serde::{Deserialize, Serialize};

/// A lon/lat analysis window.
///
/// Serialized as `[lon_min, lat_min, lon_max, lat_max]` so that it appears
/// verbatim in summary records and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Türkiye and surroundings.
    pub const DEFAULT: BoundingBox = BoundingBox {
        lon_min: 26.0,
        lat_min: 36.0,
        lon_max: 45.0,
        lat_max: 42.0,
    };

    /// Create a new bounding box from corner coordinates.
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// Parse a comma separated string: "lon_min,lat_min,lon_max,lat_max".
    ///
    /// The result is validated.
    pub fn parse(s: &str) -> Result<Self, BboxError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxError::InvalidNumber(part.to_string()))?;
        }

        let bbox = Self::from(values);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check ordering and coordinate ranges.
    pub fn validate(&self) -> Result<(), BboxError> {
        let coords = [self.lon_min, self.lat_min, self.lon_max, self.lat_max];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(BboxError::NonFinite(*self));
        }
        if self.lon_min >= self.lon_max {
            return Err(BboxError::LongitudeOrder {
                min: self.lon_min,
                max: self.lon_max,
            });
        }
        if self.lat_min >= self.lat_max {
            return Err(BboxError::LatitudeOrder {
                min: self.lat_min,
                max: self.lat_max,
            });
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(BboxError::LatitudeRange {
                min: self.lat_min,
                max: self.lat_max,
            });
        }
        Ok(())
    }

    /// Longitudinal extent in degrees.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Inclusive containment check.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    /// CMR `bounding_box` query value (west,south,east,north).
    pub fn to_query_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.lon_min, b.lat_min, b.lon_max, b.lat_max]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lon {}..{}, lat {}..{}",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("Invalid bounding box format: {0}. Expected 'lon_min,lat_min,lon_max,lat_max'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),

    #[error("Bounding box has non-finite coordinates: {0}")]
    NonFinite(BoundingBox),

    #[error("lon_min ({min}) must be less than lon_max ({max})")]
    LongitudeOrder { min: f64, max: f64 },

    #[error("lat_min ({min}) must be less than lat_max ({max})")]
    LatitudeOrder { min: f64, max: f64 },

    #[error("Latitudes {min}..{max} fall outside -90..90")]
    LatitudeRange { min: f64, max: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::parse("26, 36, 45, 42").unwrap();
        assert_eq!(bbox, BoundingBox::DEFAULT);
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&BoundingBox::DEFAULT).unwrap();
        assert_eq!(json, "[26.0,36.0,45.0,42.0]");

        let back: BoundingBox = serde_json::from_str("[26,36,45,42]").unwrap();
        assert_eq!(back, BoundingBox::DEFAULT);
    }

    #[test]
    fn test_validate_rejects_inverted() {
        let bbox = BoundingBox::new(45.0, 36.0, 26.0, 42.0);
        assert!(matches!(
            bbox.validate(),
            Err(BboxError::LongitudeOrder { .. })
        ));
    }
}
