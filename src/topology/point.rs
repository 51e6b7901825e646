use serde::{Deserialize, Serialize};

use crate::math::{Point2, Point3, Vector3, Vector4};

slotmap::new_key_type! {
    /// Unique identifier for a point in the registry.
    pub struct PointId;
}

/// A mesh vertex: position plus per-vertex shading attributes.
///
/// Identity lives in the [`PointId`] key; the position may change over the
/// point's lifetime (see `Data::relocate_point`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    /// The 3D position of the point.
    pub position: Point3,
    /// Texture coordinate.
    pub uv: Point2,
    /// Shading normal.
    pub normal: Vector3,
    /// Tangent, with handedness in `w`.
    pub tangent: Vector4,
}

impl PointData {
    /// Creates a point at `position` with zeroed attributes.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            uv: Point2::origin(),
            normal: Vector3::zeros(),
            tangent: Vector4::zeros(),
        }
    }

    /// Sets the texture coordinate.
    #[must_use]
    pub fn with_uv(mut self, uv: Point2) -> Self {
        self.uv = uv;
        self
    }

    /// Sets the shading normal.
    #[must_use]
    pub fn with_normal(mut self, normal: Vector3) -> Self {
        self.normal = normal;
        self
    }

    /// Sets the tangent.
    #[must_use]
    pub fn with_tangent(mut self, tangent: Vector4) -> Self {
        self.tangent = tangent;
        self
    }

    /// Returns `true` if the shading attributes (everything but the position)
    /// are identical.
    #[must_use]
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.uv == other.uv && self.normal == other.normal && self.tangent == other.tangent
    }
}
