use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::math::Vector3;

use super::triangle::TriangleId;
use super::Data;

slotmap::new_key_type! {
    /// Unique identifier for a face in the registry.
    pub struct FaceId;
}

/// Data associated with a face.
///
/// A face is a planar patch: a set of triangles that are pairwise reachable
/// through shared edges or points and that all share one normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceData {
    /// Member triangles.
    pub triangles: BTreeSet<TriangleId>,
}

impl FaceData {
    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[must_use]
    pub fn contains(&self, triangle: TriangleId) -> bool {
        self.triangles.contains(&triangle)
    }

    /// Returns `true` if `triangle` is not yet a member and lies on the same
    /// face as at least one member.
    #[must_use]
    pub fn accepts(&self, triangle: TriangleId, data: &Data) -> bool {
        if self.contains(triangle) {
            return false;
        }
        let Some(candidate) = data.triangle(triangle) else {
            return false;
        };
        self.triangles
            .iter()
            .filter_map(|&member| data.triangle(member))
            .any(|member| candidate.is_same_face(member, data))
    }

    /// Returns `true` if `triangle` is a member that still lies on the same
    /// face as some other member.
    #[must_use]
    pub fn keeps(&self, triangle: TriangleId, data: &Data) -> bool {
        let Some(candidate) = data.triangle(triangle) else {
            return false;
        };
        self.triangles
            .iter()
            .filter(|&&member| member != triangle)
            .filter_map(|&member| data.triangle(member))
            .any(|member| candidate.is_same_face(member, data))
    }

    /// The face normal, taken from the first member with a defined normal.
    #[must_use]
    pub fn normal(&self, data: &Data) -> Option<Vector3> {
        self.triangles
            .iter()
            .filter_map(|&id| data.triangle(id))
            .find_map(|triangle| triangle.normal(data))
    }
}
