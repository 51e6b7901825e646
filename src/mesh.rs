use crate::math::{Point2, Point3, Vector3, Vector4};

/// Indexed triangle buffers exchanged with a rendering host.
///
/// On input, attribute arrays may be shorter than `vertices`; missing entries
/// read as zero. On output every array has one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// UV coordinates.
    pub uvs: Vec<Point2>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Vertex tangents, handedness in `w`.
    pub tangents: Vec<Vector4>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// The index buffer as a flat list, three entries per triangle.
    #[must_use]
    pub fn flat_indices(&self) -> Vec<u32> {
        self.indices.iter().flatten().copied().collect()
    }

    /// Builds a mesh from a flat index buffer. Trailing indices that do not
    /// form a full triangle are ignored.
    #[must_use]
    pub fn from_flat_indices(vertices: Vec<Point3>, indices: &[u32]) -> Self {
        Self {
            vertices,
            indices: indices
                .chunks_exact(3)
                .map(|chunk| [chunk[0], chunk[1], chunk[2]])
                .collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_indices_round_trip() {
        let mesh = TriangleMesh::from_flat_indices(
            vec![Point3::origin(); 4],
            &[0, 1, 2, 0, 2, 3, 9],
        );
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.flat_indices(), vec![0, 1, 2, 0, 2, 3]);
    }
}
