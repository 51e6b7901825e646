use serde::{Deserialize, Serialize};

use crate::math::{LocationKey, Point3, Vector3};

use super::edge::EdgeId;
use super::point::PointId;
use super::Data;

slotmap::new_key_type! {
    /// Unique identifier for a triangle in the registry.
    pub struct TriangleId;
}

/// Data associated with a triangle.
///
/// The corners are stored in winding order `a -> b -> c`; `flipped` reverses
/// the effective winding without touching the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleData {
    pub a: PointId,
    pub b: PointId,
    pub c: PointId,
    pub ab: EdgeId,
    pub bc: EdgeId,
    pub ca: EdgeId,
    /// If `true`, the normal points opposite to `(b - a) x (c - a)`.
    pub flipped: bool,
}

impl TriangleData {
    /// Returns the corner points in winding order.
    #[must_use]
    pub fn points(&self) -> [PointId; 3] {
        [self.a, self.b, self.c]
    }

    /// Returns the edges `ab`, `bc`, `ca`.
    #[must_use]
    pub fn edges(&self) -> [EdgeId; 3] {
        [self.ab, self.bc, self.ca]
    }

    #[must_use]
    pub fn contains_point(&self, point: PointId) -> bool {
        self.points().contains(&point)
    }

    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges().contains(&edge)
    }

    /// Toggles the winding.
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Resolves the corner positions.
    #[must_use]
    pub fn corners(&self, data: &Data) -> Option<[Point3; 3]> {
        let a = data.point(self.a)?.position;
        let b = data.point(self.b)?.position;
        let c = data.point(self.c)?.position;
        Some([a, b, c])
    }

    /// Unit normal, `None` for collinear corners.
    #[must_use]
    pub fn normal(&self, data: &Data) -> Option<Vector3> {
        let [a, b, c] = self.corners(data)?;
        let normal = (b - a).cross(&(c - a)).try_normalize(0.0)?;
        Some(if self.flipped { -normal } else { normal })
    }

    /// Returns `true` if the triangles share an edge or a point, comparing
    /// locations rather than IDs.
    #[must_use]
    pub fn is_contiguous(&self, other: &TriangleData, data: &Data) -> bool {
        let (Some(mine), Some(theirs)) = (self.edge_locations(data), other.edge_locations(data))
        else {
            return false;
        };
        if mine.iter().any(|edge| theirs.contains(edge)) {
            return true;
        }

        let (Some(mine), Some(theirs)) = (self.point_locations(data), other.point_locations(data))
        else {
            return false;
        };
        mine.iter().any(|key| theirs.contains(key))
    }

    /// Returns `true` if both triangles have the same unit normal.
    ///
    /// Compares exactly unless `MorphParams::normal_tolerance` is positive.
    #[must_use]
    pub fn is_conormal(&self, other: &TriangleData, data: &Data) -> bool {
        let (Some(mine), Some(theirs)) = (self.normal(data), other.normal(data)) else {
            return false;
        };
        let tolerance = data.params().normal_tolerance;
        if tolerance > 0.0 {
            mine.angle(&theirs) <= tolerance
        } else {
            mine == theirs
        }
    }

    /// Conormal and contiguous: both triangles belong on one planar face.
    #[must_use]
    pub fn is_same_face(&self, other: &TriangleData, data: &Data) -> bool {
        self.is_conormal(other, data) && self.is_contiguous(other, data)
    }

    /// Location keys of the corners, in winding order.
    #[must_use]
    pub fn point_locations(&self, data: &Data) -> Option<[LocationKey; 3]> {
        let [a, b, c] = self.corners(data)?;
        Some([
            data.location_key(&a),
            data.location_key(&b),
            data.location_key(&c),
        ])
    }

    /// Location-key pairs of the edges, each pair sorted so that edge identity
    /// is symmetric.
    fn edge_locations(&self, data: &Data) -> Option<[(LocationKey, LocationKey); 3]> {
        let [a, b, c] = self.point_locations(data)?;
        let sorted = |p: LocationKey, q: LocationKey| if p <= q { (p, q) } else { (q, p) };
        Some([sorted(a, b), sorted(b, c), sorted(c, a)])
    }
}
