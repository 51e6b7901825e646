use std::f64::consts::PI;

use nalgebra::{Unit, UnitQuaternion};

use super::{Point2, Point3, Vector3, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Maps points of a plane into 2D by rotating the plane normal onto `-Z`.
///
/// The rotation is rigid, so distances, angles and areas survive the
/// projection unchanged.
#[derive(Debug, Clone, Copy)]
pub struct PlaneProjection {
    rotation: UnitQuaternion<f64>,
}

impl PlaneProjection {
    /// Creates a projection for a plane with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(normal: &Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let from = normal / len;
        let to = -Vector3::z();

        let rotation = UnitQuaternion::rotation_between(&from, &to).unwrap_or_else(|| {
            // Anti-parallel: half turn about any axis perpendicular to the normal
            let reference = if from.x.abs() < 0.9 {
                Vector3::x()
            } else {
                Vector3::y()
            };
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(reference.cross(&from)), PI)
        });

        Ok(Self { rotation })
    }

    /// Projects a 3D point into the plane's 2D frame.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point2 {
        let rotated = self.rotation * point;
        Point2::new(rotated.x, rotated.y)
    }

    /// Rotates a direction into the projection frame.
    #[must_use]
    pub fn rotate(&self, vector: &Vector3) -> Vector3 {
        self.rotation * vector
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_maps_to_negative_z() {
        for normal in [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-1.0, 0.0, 0.0),
        ] {
            let projection = PlaneProjection::new(&normal).unwrap();
            let mapped = projection.rotate(&normal.normalize());
            assert_relative_eq!(mapped, -Vector3::z(), epsilon = 1e-9);
        }
    }

    #[test]
    fn projection_preserves_distance() {
        let projection = PlaneProjection::new(&Vector3::new(0.0, 1.0, 1.0)).unwrap();
        let a = Point3::new(0.0, 1.0, -1.0);
        let b = Point3::new(2.0, 2.0, -2.0);
        let da = projection.project(&a);
        let db = projection.project(&b);
        assert_relative_eq!((db - da).norm(), (b - a).norm(), epsilon = 1e-9);
    }

    #[test]
    fn zero_normal_rejected() {
        assert!(PlaneProjection::new(&Vector3::zeros()).is_err());
    }
}
