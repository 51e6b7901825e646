use serde::{Deserialize, Serialize};

use super::Point3;

/// Quantized position used to decide whether two points share a location.
///
/// Each coordinate is divided by the grid spacing and rounded to the nearest
/// integer, so float noise below half a grid step collapses onto one key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LocationKey([i64; 3]);

impl LocationKey {
    /// Quantizes `point` onto a grid with spacing `precision`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(point: &Point3, precision: f64) -> Self {
        let quantize = |v: f64| (v / precision).round() as i64;
        Self([quantize(point.x), quantize(point.y), quantize(point.z)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_below_precision_collapses() {
        let a = LocationKey::new(&Point3::new(1.0, 2.0, 3.0), 1e-6);
        let b = LocationKey::new(&Point3::new(1.0 + 1e-9, 2.0 - 1e-9, 3.0), 1e-6);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_locations_differ() {
        let a = LocationKey::new(&Point3::new(0.0, 0.0, 0.0), 1e-6);
        let b = LocationKey::new(&Point3::new(0.0, 0.0, 1e-3), 1e-6);
        assert_ne!(a, b);
    }

    #[test]
    fn negative_zero_matches_zero() {
        let a = LocationKey::new(&Point3::new(-0.0, 0.0, -0.0), 1e-6);
        let b = LocationKey::new(&Point3::origin(), 1e-6);
        assert_eq!(a, b);
    }
}
