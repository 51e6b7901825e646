use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::{GeometryError, OperationError, Result, TopologyError};
use crate::math::{LocationKey, Matrix4, Point2, Point3, Vector3, Vector4};
use crate::mesh::TriangleMesh;
use crate::operations::{FaceArea, FacePerimeter, RetriangulateFace};
use crate::topology::snapshot::{self, Snapshot};
use crate::topology::{
    Data, EdgeData, EdgeId, FaceData, FaceId, MorphParams, PointData, PointId, TriangleData,
    TriangleId,
};

/// A triangle corner handed to [`Morph::add_triangle`] or
/// [`Morph::add_edge`].
#[derive(Debug, Clone)]
pub enum Corner {
    /// An existing point.
    Existing(PointId),
    /// A location; reuses the point already there, or adds a plain one.
    Position(Point3),
    /// A new point, colocated with whatever already shares its location.
    Point(PointData),
}

impl From<PointId> for Corner {
    fn from(id: PointId) -> Self {
        Self::Existing(id)
    }
}

impl From<Point3> for Corner {
    fn from(position: Point3) -> Self {
        Self::Position(position)
    }
}

impl From<PointData> for Corner {
    fn from(point: PointData) -> Self {
        Self::Point(point)
    }
}

/// Editable triangle mesh with planar face tracking.
///
/// `Morph` owns its [`Data`] registry; every mutation goes through it, so the
/// registry's invariants hold between calls.
#[derive(Debug, Clone, Default)]
pub struct Morph {
    data: Data,
}

impl Morph {
    /// Creates an empty morph with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty morph with custom parameters.
    #[must_use]
    pub fn with_params(params: MorphParams) -> Self {
        Self {
            data: Data::with_params(params),
        }
    }

    /// Builds a morph from a mesh placed by `matrix`.
    ///
    /// # Errors
    ///
    /// See [`Morph::add_mesh`].
    pub fn from_mesh(mesh: &TriangleMesh, matrix: &Matrix4) -> Result<Self> {
        let mut morph = Self::new();
        morph.add_mesh(mesh, matrix)?;
        Ok(morph)
    }

    /// Rebuilds a morph from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is inconsistent.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        Ok(Self {
            data: snapshot::deserialize(snapshot)?,
        })
    }

    /// Captures the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        snapshot::serialize(&self.data)
    }

    /// The underlying registry.
    #[must_use]
    pub fn data(&self) -> &Data {
        &self.data
    }

    // --- Mesh exchange ---

    /// Adds every triangle of `mesh`, transformed by `matrix`.
    ///
    /// Positions are transformed as points, normals by the inverse-transpose
    /// of the linear part, tangents by the linear part (keeping `w`). A vertex
    /// reuses the existing point at its location; with
    /// `MorphParams::split_attributes` the attributes must match as well.
    ///
    /// # Errors
    ///
    /// Returns an error if an index is out of range or a triangle has two
    /// corners at one location. The morph is unchanged in that case.
    pub fn add_mesh(&mut self, mesh: &TriangleMesh, matrix: &Matrix4) -> Result<Vec<TriangleId>> {
        let vertex_count = mesh.vertices.len();
        if let Some(index) = mesh
            .indices
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(OperationError::InvalidInput(format!(
                "triangle index {index} out of range for {vertex_count} vertices"
            ))
            .into());
        }

        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map_or(linear, |inverse| inverse.transpose());
        let points: Vec<PointData> = (0..vertex_count)
            .map(|i| {
                let normal = mesh.normals.get(i).copied().unwrap_or_else(Vector3::zeros);
                let normal = normal_matrix * normal;
                let tangent = mesh.tangents.get(i).copied().unwrap_or_else(Vector4::zeros);
                let direction = matrix.transform_vector(&tangent.xyz());
                let direction = direction.try_normalize(0.0).unwrap_or(direction);
                PointData::new(matrix.transform_point(&mesh.vertices[i]))
                    .with_uv(mesh.uvs.get(i).copied().unwrap_or_else(Point2::origin))
                    .with_normal(normal.try_normalize(0.0).unwrap_or(normal))
                    .with_tangent(Vector4::new(direction.x, direction.y, direction.z, tangent.w))
            })
            .collect();

        for (n, triangle) in mesh.indices.iter().enumerate() {
            let [a, b, c] = triangle.map(|i| self.data.location_key(&points[i as usize].position));
            if a == b || b == c || c == a {
                return Err(GeometryError::Degenerate(format!(
                    "mesh triangle {n} has two corners at one location"
                ))
                .into());
            }
        }

        let split_attributes = self.data.params().split_attributes;
        let mut resolved: Vec<Option<PointId>> = vec![None; vertex_count];
        let mut created = Vec::with_capacity(mesh.indices.len());
        for triangle in &mesh.indices {
            let mut corners = [PointId::default(); 3];
            for (corner, &index) in corners.iter_mut().zip(triangle) {
                let i = index as usize;
                *corner = if let Some(id) = resolved[i] {
                    id
                } else {
                    let point = &points[i];
                    let existing = if split_attributes {
                        self.data.existing_point_matching(point)
                    } else {
                        self.data.existing_point_in_same_location(&point.position)
                    };
                    let id = existing.unwrap_or_else(|| self.data.add_point(point.clone()));
                    resolved[i] = Some(id);
                    id
                };
            }
            let [a, b, c] = corners;
            created.push(self.data.add_triangle(a, b, c)?);
        }

        debug!(
            triangles = created.len(),
            points = self.data.point_count(),
            faces = self.data.face_count(),
            "added mesh"
        );
        Ok(created)
    }

    /// Exports one vertex per point and one index triple per triangle.
    ///
    /// Flipped triangles are emitted with reversed winding.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        let mut vertex_index: SecondaryMap<PointId, u32> = SecondaryMap::new();
        for (id, point) in self.data.points() {
            vertex_index.insert(id, mesh.vertices.len() as u32);
            mesh.vertices.push(point.position);
            mesh.uvs.push(point.uv);
            mesh.normals.push(point.normal);
            mesh.tangents.push(point.tangent);
        }

        for (_, triangle) in self.data.triangles() {
            let [a, b, c] = triangle.points().map(|id| vertex_index.get(id).copied());
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue;
            };
            mesh.indices
                .push(if triangle.flipped { [a, c, b] } else { [a, b, c] });
        }
        mesh
    }

    // --- Authoring ---

    /// Adds a standalone point.
    pub fn add_point(&mut self, point: PointData) -> PointId {
        self.data.add_point(point)
    }

    /// Adds a triangle over three corners, creating points as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing corner is unknown or two corners share
    /// a location. No points are created in that case.
    pub fn add_triangle(
        &mut self,
        a: impl Into<Corner>,
        b: impl Into<Corner>,
        c: impl Into<Corner>,
    ) -> Result<TriangleId> {
        let corners = [a.into(), b.into(), c.into()];
        let [ka, kb, kc] = self.corner_locations(&corners)?;
        if ka == kb || kb == kc || kc == ka {
            return Err(
                GeometryError::Degenerate("triangle corners share a location".into()).into(),
            );
        }
        let [a, b, c] = corners.map(|corner| self.resolve(corner));
        self.data.add_triangle(a, b, c)
    }

    /// Adds an edge between two corners, creating points as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing corner is unknown or both corners
    /// share a location.
    pub fn add_edge(&mut self, a: impl Into<Corner>, b: impl Into<Corner>) -> Result<EdgeId> {
        let corners = [a.into(), b.into()];
        let [ka, kb] = self.corner_locations(&corners)?;
        if ka == kb {
            return Err(GeometryError::Degenerate("edge endpoints share a location".into()).into());
        }
        let [a, b] = corners.map(|corner| self.resolve(corner));
        self.data.add_edge(a, b)
    }

    fn corner_locations<const N: usize>(
        &self,
        corners: &[Corner; N],
    ) -> Result<[LocationKey; N]> {
        let mut keys = [LocationKey::default(); N];
        for (key, corner) in keys.iter_mut().zip(corners) {
            let position = match corner {
                Corner::Existing(id) => {
                    self.data
                        .point(*id)
                        .ok_or_else(|| TopologyError::EntityNotFound("point".into()))?
                        .position
                }
                Corner::Position(position) => *position,
                Corner::Point(point) => point.position,
            };
            *key = self.data.location_key(&position);
        }
        Ok(keys)
    }

    fn resolve(&mut self, corner: Corner) -> PointId {
        match corner {
            Corner::Existing(id) => id,
            Corner::Position(position) => self
                .data
                .existing_point_in_same_location(&position)
                .unwrap_or_else(|| self.data.add_point(PointData::new(position))),
            Corner::Point(point) => self.data.add_point(point),
        }
    }

    /// Returns the point with the given ID, if it exists.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&PointData> {
        self.data.point(id)
    }

    /// Returns the edge with the given ID, if it exists.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.data.edge(id)
    }

    /// Returns the triangle with the given ID, if it exists.
    #[must_use]
    pub fn triangle(&self, id: TriangleId) -> Option<&TriangleData> {
        self.data.triangle(id)
    }

    /// Returns the face with the given ID, if it exists.
    #[must_use]
    pub fn face(&self, id: FaceId) -> Option<&FaceData> {
        self.data.face(id)
    }

    /// Moves a point, together with its colocated peers, and re-partitions
    /// the affected faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is unknown or the move would collapse an
    /// edge.
    pub fn set_point(&mut self, id: PointId, position: Point3) -> Result<()> {
        self.data.relocate_point(id, position)
    }

    /// Replaces the shading attributes of a point, leaving its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is unknown.
    pub fn set_point_attributes(
        &mut self,
        id: PointId,
        uv: Point2,
        normal: Vector3,
        tangent: Vector4,
    ) -> Result<()> {
        let Some(position) = self.data.point(id).map(|point| point.position) else {
            return Err(TopologyError::EntityNotFound("point".into()).into());
        };
        let attributes = PointData::new(position)
            .with_uv(uv)
            .with_normal(normal)
            .with_tangent(tangent);
        self.data.set_point_attributes(id, &attributes);
        Ok(())
    }

    /// Removes a point with its edges and triangles.
    ///
    /// Returns `false` if the point does not exist.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        self.data.remove_point(id)
    }

    /// Removes a triangle, pruning edges and points it leaves unused.
    ///
    /// Returns `false` if the triangle does not exist.
    pub fn remove_triangle(&mut self, id: TriangleId) -> bool {
        self.data.remove_triangle(id)
    }

    /// Removes a face and all of its triangles.
    ///
    /// Returns `false` if the face does not exist.
    pub fn remove_face(&mut self, id: FaceId) -> bool {
        self.data.remove_face(id)
    }

    /// Reverses a triangle's winding and re-evaluates its face.
    ///
    /// Returns `false` if the triangle does not exist.
    pub fn flip_triangle(&mut self, id: TriangleId) -> bool {
        self.data.flip_triangle(id)
    }

    /// The ordered outer boundary of a face.
    ///
    /// # Errors
    ///
    /// See [`FacePerimeter::execute`].
    pub fn face_perimeter(&self, id: FaceId) -> Result<Vec<PointId>> {
        FacePerimeter::new(id).execute(&self.data)
    }

    /// The area enclosed by a face's perimeter.
    ///
    /// # Errors
    ///
    /// See [`FaceArea::execute`].
    pub fn face_area(&self, id: FaceId) -> Result<f64> {
        FaceArea::new(id).execute(&self.data)
    }

    /// Replaces a face's triangles with a smaller triangulation of its
    /// perimeter, if one exists. Returns `true` if the face changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the perimeter cannot be extracted or
    /// triangulated.
    pub fn try_retriangulate_face(&mut self, id: FaceId) -> Result<bool> {
        let Some(triples) = RetriangulateFace::new(id).execute(&self.data)? else {
            return Ok(false);
        };
        self.data.replace_face_triangles(id, &triples)?;
        Ok(true)
    }
}

impl TryFrom<&TriangleMesh> for Morph {
    type Error = crate::MorphError;

    fn try_from(mesh: &TriangleMesh) -> Result<Self> {
        Self::from_mesh(mesh, &Matrix4::identity())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square() -> Morph {
        let mut morph = Morph::new();
        morph
            .add_triangle(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0))
            .unwrap();
        morph
            .add_triangle(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0))
            .unwrap();
        morph
    }

    fn only_face(morph: &Morph) -> FaceId {
        assert_eq!(morph.data().face_count(), 1);
        morph.data().faces().next().map(|(id, _)| id).unwrap()
    }

    fn cube() -> TriangleMesh {
        let vertices = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ];
        let indices = [
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            1, 2, 6, 1, 6, 5, // right
            0, 4, 7, 0, 7, 3, // left
        ];
        TriangleMesh::from_flat_indices(vertices, &indices)
    }

    #[test]
    fn unit_square_example() {
        init_tracing();
        let mut morph = unit_square();
        let data = morph.data();
        assert_eq!(data.point_count(), 4);
        assert_eq!(data.edge_count(), 5);
        assert_eq!(data.triangle_count(), 2);
        assert_eq!(data.face_count(), 1);

        let face = only_face(&morph);
        assert_eq!(morph.face_perimeter(face).unwrap().len(), 4);
        assert!(!morph.try_retriangulate_face(face).unwrap());
        assert_eq!(morph.data().triangle_count(), 2);
    }

    #[test]
    fn removing_one_square_triangle() {
        let mut morph = unit_square();
        let corner = morph
            .data()
            .existing_point_in_same_location(&p(0.0, 1.0, 0.0))
            .unwrap();
        let triangle = morph.data().point_triangles(corner).next().unwrap();
        assert!(morph.remove_triangle(triangle));

        assert_eq!(morph.data().face_count(), 1);
        assert_eq!(morph.data().point_count(), 3);
        assert!(morph.point(corner).is_none());
    }

    #[test]
    fn moving_point_out_of_plane_splits_quad() {
        init_tracing();
        let mut morph = unit_square();
        let corner = morph
            .data()
            .existing_point_in_same_location(&p(1.0, 0.0, 0.0))
            .unwrap();
        morph.set_point(corner, p(1.0, 0.0, 0.5)).unwrap();

        assert_eq!(morph.data().face_count(), 2);
        for (_, face) in morph.data().faces() {
            assert_eq!(face.len(), 1);
        }
        assert_eq!(morph.point(corner).unwrap().position, p(1.0, 0.0, 0.5));
    }

    #[test]
    fn set_point_rejects_unknown_ids() {
        let mut morph = Morph::new();
        assert!(morph.set_point(PointId::default(), p(0.0, 0.0, 0.0)).is_err());
        assert!(!morph.remove_point(PointId::default()));
        assert!(morph.point(PointId::default()).is_none());
        assert!(morph.face(FaceId::default()).is_none());
    }

    #[test]
    fn corners_by_id_and_data() {
        let mut morph = Morph::new();
        let a = morph.add_point(PointData::new(p(0.0, 0.0, 0.0)));
        let twin = PointData::new(p(0.0, 0.0, 0.0)).with_uv(Point2::new(0.5, 0.5));
        let t0 = morph
            .add_triangle(a, p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0))
            .unwrap();
        let t1 = morph
            .add_triangle(twin, p(0.0, 1.0, 0.0), p(-1.0, 0.0, 0.0))
            .unwrap();

        // The data corner adds a colocated point instead of reusing `a`
        assert_eq!(morph.data().point_count(), 5);
        let second = morph.triangle(t1).unwrap().a;
        assert_ne!(second, a);
        assert!(morph.data().is_colocated(a, second));
        assert_eq!(morph.data().triangle_face(t0), morph.data().triangle_face(t1));
    }

    #[test]
    fn degenerate_authoring_creates_nothing() {
        let mut morph = Morph::new();
        let result = morph.add_triangle(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0));
        assert!(result.is_err());
        assert_eq!(morph.data().point_count(), 0);
        assert!(morph.add_edge(p(2.0, 0.0, 0.0), p(2.0, 0.0, 0.0)).is_err());
        assert_eq!(morph.data().point_count(), 0);
    }

    #[test]
    fn cube_round_trip() {
        init_tracing();
        let mesh = cube();
        let morph = Morph::try_from(&mesh).unwrap();
        assert_eq!(morph.data().point_count(), 8);
        assert_eq!(morph.data().triangle_count(), 12);
        assert_eq!(morph.data().face_count(), 6);

        let exported = morph.to_mesh();
        assert_eq!(exported.triangle_count(), mesh.triangle_count());
        assert_eq!(exported.flat_indices().len(), 36);
        assert_eq!(exported.vertices.len(), exported.normals.len());
        assert_eq!(exported.vertices.len(), exported.uvs.len());
        assert_eq!(exported.vertices.len(), exported.tangents.len());
        for [a, b, c] in &mesh.indices {
            for index in [a, b, c] {
                assert!(exported.vertices.contains(&mesh.vertices[*index as usize]));
            }
        }

        let again = Morph::try_from(&exported).unwrap();
        assert_eq!(again.data().face_count(), 6);
    }

    #[test]
    fn cube_faces_have_four_point_perimeters() {
        let morph = Morph::try_from(&cube()).unwrap();
        for (id, face) in morph.data().faces() {
            assert_eq!(face.len(), 2);
            assert_eq!(morph.face_perimeter(id).unwrap().len(), 4);
            assert_relative_eq!(morph.face_area(id).unwrap(), 1.0, epsilon = 1e-12);
        }
    }

    fn quad_with_split_normals() -> TriangleMesh {
        let mut mesh = TriangleMesh::from_flat_indices(
            vec![
                p(0.0, 0.0, 0.0),
                p(1.0, 0.0, 0.0),
                p(1.0, 1.0, 0.0),
                p(0.0, 0.0, 0.0),
                p(1.0, 1.0, 0.0),
                p(0.0, 1.0, 0.0),
            ],
            &[0, 1, 2, 3, 4, 5],
        );
        mesh.normals = vec![
            Vector3::z(),
            Vector3::z(),
            Vector3::z(),
            Vector3::x(),
            Vector3::x(),
            Vector3::x(),
        ];
        mesh
    }

    #[test]
    fn mesh_points_resolve_by_location() {
        let morph = Morph::try_from(&quad_with_split_normals()).unwrap();
        let data = morph.data();
        assert_eq!(data.point_count(), 4);
        assert_eq!(data.edge_count(), 5);
        assert_eq!(data.triangle_count(), 2);
        assert_eq!(data.face_count(), 1);

        // First vertex at a location wins
        let origin = data.existing_point_in_same_location(&Point3::origin()).unwrap();
        assert_eq!(data.point(origin).unwrap().normal, Vector3::z());
    }

    #[test]
    fn split_attributes_keep_hard_edges() {
        let mut morph = Morph::with_params(MorphParams {
            split_attributes: true,
            ..MorphParams::default()
        });
        morph
            .add_mesh(&quad_with_split_normals(), &Matrix4::identity())
            .unwrap();
        assert_eq!(morph.data().point_count(), 6);
        assert_eq!(morph.data().edge_count(), 6);
        assert_eq!(morph.data().face_count(), 1);

        let origin: BTreeSet<PointId> = morph
            .data()
            .points()
            .filter(|(_, point)| point.position == Point3::origin())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(origin.len(), 2);
        let mut ids = origin.iter();
        let (first, second) = (*ids.next().unwrap(), *ids.next().unwrap());
        assert!(morph.data().is_colocated(first, second));
        assert_eq!(morph.to_mesh().vertices.len(), 6);
    }

    #[test]
    fn mesh_transform_applies() {
        let mut mesh = TriangleMesh::from_flat_indices(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            &[0, 1, 2],
        );
        mesh.normals = vec![Vector3::z()];
        let matrix = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 2.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let morph = Morph::from_mesh(&mesh, &matrix).unwrap();

        let exported = morph.to_mesh();
        assert!(exported.vertices.contains(&p(2.0, 0.0, 2.0)));
        assert!(exported.vertices.contains(&p(0.0, 0.0, 2.0)));
        let shaded = exported
            .normals
            .iter()
            .filter(|normal| **normal == Vector3::z())
            .count();
        assert_eq!(shaded, 1);
    }

    #[test]
    fn invalid_mesh_leaves_morph_unchanged() {
        let mut morph = unit_square();
        let out_of_range = TriangleMesh::from_flat_indices(vec![p(5.0, 0.0, 0.0)], &[0, 1, 2]);
        assert!(morph.add_mesh(&out_of_range, &Matrix4::identity()).is_err());

        let degenerate = TriangleMesh::from_flat_indices(
            vec![p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0), p(5.0, 0.0, 0.0)],
            &[0, 1, 2],
        );
        assert!(morph.add_mesh(&degenerate, &Matrix4::identity()).is_err());
        assert_eq!(morph.data().point_count(), 4);
    }

    #[test]
    fn flipped_triangles_export_reversed() {
        let mut morph = Morph::new();
        let t = morph
            .add_triangle(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0))
            .unwrap();
        let before = morph.to_mesh().indices[0];
        assert!(morph.flip_triangle(t));
        let after = morph.to_mesh().indices[0];
        assert_eq!(after, [before[0], before[2], before[1]]);
        assert!(morph.triangle(t).unwrap().flipped);
    }

    #[test]
    fn retriangulating_centre_fan() {
        init_tracing();
        let mut morph = Morph::new();
        let centre = p(0.5, 0.5, 0.0);
        let corners = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        for i in 0..4 {
            morph
                .add_triangle(centre, corners[i], corners[(i + 1) % 4])
                .unwrap();
        }
        let face = only_face(&morph);
        let area = morph.face_area(face).unwrap();

        assert!(morph.try_retriangulate_face(face).unwrap());
        assert_eq!(morph.data().triangle_count(), 2);
        assert_eq!(morph.data().point_count(), 4);
        assert_eq!(morph.data().edge_count(), 5);
        assert_eq!(only_face(&morph), face);
        assert_relative_eq!(morph.face_area(face).unwrap(), area, epsilon = 1e-12);
        assert!(morph
            .data()
            .existing_point_in_same_location(&centre)
            .is_none());

        // Now minimal
        assert!(!morph.try_retriangulate_face(face).unwrap());
    }

    #[test]
    fn bow_tie_face_is_left_alone() {
        let mut morph = Morph::new();
        morph
            .add_triangle(p(0.0, -1.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0))
            .unwrap();
        morph
            .add_triangle(p(1.0, 0.0, 0.0), p(2.0, -1.0, 0.0), p(2.0, 1.0, 0.0))
            .unwrap();
        let face = only_face(&morph);
        assert!(!morph.try_retriangulate_face(face).unwrap());
        assert_eq!(morph.data().triangle_count(), 2);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut morph = unit_square();
        let corner = morph
            .data()
            .existing_point_in_same_location(&p(1.0, 0.0, 0.0))
            .unwrap();
        let restored = Morph::from_snapshot(morph.snapshot()).unwrap();
        assert_eq!(restored.to_mesh(), morph.to_mesh());

        // IDs survive, so edits keep working on the restored copy
        let mut restored = restored;
        restored.set_point(corner, p(1.0, 0.0, 1.0)).unwrap();
        morph.set_point(corner, p(1.0, 0.0, 1.0)).unwrap();
        assert_eq!(restored.data().face_count(), morph.data().face_count());
    }

    #[test]
    fn attributes_can_be_edited() {
        let mut morph = unit_square();
        let corner = morph
            .data()
            .existing_point_in_same_location(&p(0.0, 0.0, 0.0))
            .unwrap();
        morph
            .set_point_attributes(corner, Point2::new(0.25, 0.75), Vector3::z(), Vector4::x())
            .unwrap();
        assert_eq!(morph.point(corner).unwrap().uv, Point2::new(0.25, 0.75));
        assert!(morph
            .set_point_attributes(PointId::default(), Point2::origin(), Vector3::z(), Vector4::x())
            .is_err());
    }
}
