mod adjacency;
pub mod edge;
pub mod face;
mod membership;
pub mod params;
pub mod point;
pub mod snapshot;
pub mod triangle;

pub use edge::{EdgeData, EdgeId};
pub use face::{FaceData, FaceId};
pub use params::MorphParams;
pub use point::{PointData, PointId};
pub use snapshot::Snapshot;
pub use triangle::{TriangleData, TriangleId};

use std::collections::{BTreeSet, HashMap};

use slotmap::{Key, SecondaryMap, SlotMap};
use tracing::{debug, trace};

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::{LocationKey, Point3};

/// Central registry that owns all mesh entities and their adjacency indexes.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures. All mutation of the cross-entity
/// invariants (colocation classes, connectivity, face membership) happens
/// here.
#[derive(Debug, Clone, Default)]
pub struct Data {
    params: MorphParams,
    points: SlotMap<PointId, PointData>,
    edges: SlotMap<EdgeId, EdgeData>,
    triangles: SlotMap<TriangleId, TriangleData>,
    faces: SlotMap<FaceId, FaceData>,
    point_edges: SecondaryMap<PointId, BTreeSet<EdgeId>>,
    point_triangles: SecondaryMap<PointId, BTreeSet<TriangleId>>,
    point_faces: SecondaryMap<PointId, BTreeSet<FaceId>>,
    triangle_faces: SecondaryMap<TriangleId, FaceId>,
    connected: SecondaryMap<PointId, BTreeSet<PointId>>,
    colocated: SecondaryMap<PointId, BTreeSet<PointId>>,
    locations: HashMap<LocationKey, BTreeSet<PointId>>,
}

impl Data {
    /// Creates a new, empty registry with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty registry with custom parameters.
    #[must_use]
    pub fn with_params(params: MorphParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Returns the parameters this registry was created with.
    #[must_use]
    pub fn params(&self) -> &MorphParams {
        &self.params
    }

    /// Quantizes a position with this registry's precision.
    #[must_use]
    pub fn location_key(&self, position: &Point3) -> LocationKey {
        LocationKey::new(position, self.params.location_precision)
    }

    // --- Lookups ---

    /// Returns the point with the given ID, if it exists.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&PointData> {
        self.points.get(id)
    }

    /// Returns the edge with the given ID, if it exists.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.edges.get(id)
    }

    /// Returns the triangle with the given ID, if it exists.
    #[must_use]
    pub fn triangle(&self, id: TriangleId) -> Option<&TriangleData> {
        self.triangles.get(id)
    }

    /// Returns the face with the given ID, if it exists.
    #[must_use]
    pub fn face(&self, id: FaceId) -> Option<&FaceData> {
        self.faces.get(id)
    }

    /// Iterates over all points in arena order.
    pub fn points(&self) -> impl Iterator<Item = (PointId, &PointData)> {
        self.points.iter()
    }

    /// Iterates over all edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Iterates over all triangles in arena order.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &TriangleData)> {
        self.triangles.iter()
    }

    /// Iterates over all faces in arena order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Returns the number of points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Edges with `point` as an endpoint.
    pub fn point_edges(&self, point: PointId) -> impl Iterator<Item = EdgeId> + '_ {
        self.point_edges.get(point).into_iter().flatten().copied()
    }

    /// Triangles with `point` as a corner.
    pub fn point_triangles(&self, point: PointId) -> impl Iterator<Item = TriangleId> + '_ {
        self.point_triangles.get(point).into_iter().flatten().copied()
    }

    /// Faces holding at least one triangle with `point` as a corner.
    pub fn point_faces(&self, point: PointId) -> impl Iterator<Item = FaceId> + '_ {
        self.point_faces.get(point).into_iter().flatten().copied()
    }

    /// The face a triangle belongs to.
    #[must_use]
    pub fn triangle_face(&self, triangle: TriangleId) -> Option<FaceId> {
        self.triangle_faces.get(triangle).copied()
    }

    /// Returns the edge joining `a` and `b`, in either direction.
    #[must_use]
    pub fn find_edge(&self, a: PointId, b: PointId) -> Option<EdgeId> {
        self.point_edges(a)
            .find(|&id| self.edges.get(id).is_some_and(|edge| edge.joins(a, b)))
    }

    /// Returns the lowest-ID point at the location of `position`.
    #[must_use]
    pub fn existing_point_in_same_location(&self, position: &Point3) -> Option<PointId> {
        self.points_at(position).next()
    }

    /// Returns the lowest-ID point at the same location as `point` whose
    /// shading attributes are identical.
    #[must_use]
    pub fn existing_point_matching(&self, point: &PointData) -> Option<PointId> {
        self.points_at(&point.position).find(|&id| {
            self.points
                .get(id)
                .is_some_and(|existing| existing.same_attributes(point))
        })
    }

    /// Overwrites the shading attributes of a point, keeping its position.
    /// Returns `false` if the point does not exist.
    pub fn set_point_attributes(&mut self, id: PointId, attributes: &PointData) -> bool {
        let Some(point) = self.points.get_mut(id) else {
            return false;
        };
        point.uv = attributes.uv;
        point.normal = attributes.normal;
        point.tangent = attributes.tangent;
        true
    }

    fn points_at(&self, position: &Point3) -> impl Iterator<Item = PointId> + '_ {
        self.locations
            .get(&self.location_key(position))
            .into_iter()
            .flatten()
            .copied()
    }

    // --- Insertion ---

    /// Inserts a point and merges it with every point already at its
    /// location.
    pub fn add_point(&mut self, point: PointData) -> PointId {
        let key = self.location_key(&point.position);
        let id = self.points.insert(point);
        self.point_edges.insert(id, BTreeSet::new());
        self.point_triangles.insert(id, BTreeSet::new());
        self.point_faces.insert(id, BTreeSet::new());
        self.connected.insert(id, BTreeSet::new());
        self.colocated.insert(id, BTreeSet::new());
        self.locations.entry(key).or_default().insert(id);
        self.connect_points_in_same_location(id);
        trace!(?id, ?key, "added point");
        id
    }

    /// Inserts the edge between `a` and `b`, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if either point is missing or both share a location.
    pub fn add_edge(&mut self, a: PointId, b: PointId) -> Result<EdgeId> {
        let [key_a, key_b] = self.require_locations([a, b])?;
        if let Some(existing) = self.find_edge(a, b) {
            return Ok(existing);
        }
        if key_a == key_b {
            return Err(GeometryError::Degenerate("edge endpoints share a location".into()).into());
        }

        let id = self.edges.insert(EdgeData::new(a, b));
        insert_into(&mut self.point_edges, a, id);
        insert_into(&mut self.point_edges, b, id);
        self.add_connection(a, b, false);
        Ok(id)
    }

    /// Inserts a triangle over three existing points and assigns it to a
    /// face.
    ///
    /// # Errors
    ///
    /// Returns an error if a point is missing or two corners share a
    /// location.
    pub fn add_triangle(&mut self, a: PointId, b: PointId, c: PointId) -> Result<TriangleId> {
        let id = self.insert_triangle(a, b, c)?;
        let face = self.connect_triangle_with_face(id);
        trace!(?id, ?face, "added triangle");
        Ok(id)
    }

    /// Inserts the triangle and its edges without assigning a face.
    fn insert_triangle(&mut self, a: PointId, b: PointId, c: PointId) -> Result<TriangleId> {
        let [key_a, key_b, key_c] = self.require_locations([a, b, c])?;
        if key_a == key_b || key_b == key_c || key_c == key_a {
            return Err(
                GeometryError::Degenerate("triangle corners share a location".into()).into(),
            );
        }

        let ab = self.add_edge(a, b)?;
        let bc = self.add_edge(b, c)?;
        let ca = self.add_edge(c, a)?;
        let id = self.triangles.insert(TriangleData {
            a,
            b,
            c,
            ab,
            bc,
            ca,
            flipped: false,
        });
        for point in [a, b, c] {
            insert_into(&mut self.point_triangles, point, id);
        }
        Ok(id)
    }

    fn require_locations<const N: usize>(&self, ids: [PointId; N]) -> Result<[LocationKey; N]> {
        let mut keys = [LocationKey::default(); N];
        for (key, id) in keys.iter_mut().zip(ids) {
            let point = self
                .points
                .get(id)
                .ok_or_else(|| TopologyError::EntityNotFound("point".into()))?;
            *key = self.location_key(&point.position);
        }
        Ok(keys)
    }

    // --- Removal ---

    /// Removes a point together with its edges and triangles. Edges and
    /// points orphaned by the cascade are removed too.
    ///
    /// Returns `false` if the point does not exist.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        if !self.points.contains_key(id) {
            return false;
        }

        let mut edges = Vec::new();
        let mut points = Vec::new();
        let mut faces = BTreeSet::new();
        let triangles: Vec<TriangleId> = self.point_triangles(id).collect();
        for triangle in triangles {
            if let Some((data, face)) = self.unlink_triangle(triangle) {
                edges.extend(data.edges());
                points.extend(data.points());
                faces.extend(face);
            }
        }
        let incident: Vec<EdgeId> = self.point_edges(id).collect();
        for edge in incident {
            if let Some(data) = self.unlink_edge(edge) {
                points.extend(data.other(id));
            }
        }
        self.unlink_point(id);

        for face in faces {
            self.split_disconnected(face);
        }
        points.retain(|&point| point != id);
        self.prune(&edges, &points);
        debug!(?id, "removed point");
        true
    }

    /// Removes an edge and every triangle built on it.
    ///
    /// Returns `false` if the edge does not exist.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.get(id).copied() else {
            return false;
        };

        let mut edges = Vec::new();
        let mut points = vec![edge.a, edge.b];
        let mut faces = BTreeSet::new();
        let triangles: Vec<TriangleId> = self
            .point_triangles(edge.a)
            .filter(|&t| self.triangles.get(t).is_some_and(|t| t.contains_edge(id)))
            .collect();
        for triangle in triangles {
            if let Some((data, face)) = self.unlink_triangle(triangle) {
                edges.extend(data.edges());
                points.extend(data.points());
                faces.extend(face);
            }
        }
        self.unlink_edge(id);

        for face in faces {
            self.split_disconnected(face);
        }
        self.prune(&edges, &points);
        true
    }

    /// Removes a triangle, pruning its edges and points if nothing else uses
    /// them.
    ///
    /// Returns `false` if the triangle does not exist.
    pub fn remove_triangle(&mut self, id: TriangleId) -> bool {
        let Some((data, face)) = self.unlink_triangle(id) else {
            return false;
        };
        if let Some(face) = face {
            self.split_disconnected(face);
        }
        self.prune(&data.edges(), &data.points());
        true
    }

    /// Removes a face and all of its triangles.
    ///
    /// Returns `false` if the face does not exist.
    pub fn remove_face(&mut self, id: FaceId) -> bool {
        let Some(face) = self.faces.get(id) else {
            return false;
        };
        let triangles: Vec<TriangleId> = face.triangles.iter().copied().collect();
        for triangle in triangles {
            self.remove_triangle(triangle);
        }
        debug!(?id, "removed face");
        true
    }

    /// Detaches a triangle from its face and all indexes. The face is not
    /// re-partitioned and nothing is pruned.
    fn unlink_triangle(&mut self, id: TriangleId) -> Option<(TriangleData, Option<FaceId>)> {
        if !self.triangles.contains_key(id) {
            return None;
        }
        let face = self.remove_membership(id);
        let data = self.triangles.remove(id)?;
        for point in data.points() {
            remove_from(&mut self.point_triangles, point, &id);
        }
        Some((data, face.filter(|&face| self.faces.contains_key(face))))
    }

    fn unlink_edge(&mut self, id: EdgeId) -> Option<EdgeData> {
        let edge = self.edges.remove(id)?;
        remove_from(&mut self.point_edges, edge.a, &id);
        remove_from(&mut self.point_edges, edge.b, &id);
        self.disconnect_if_unjoined(edge.a, edge.b);
        Some(edge)
    }

    fn unlink_point(&mut self, id: PointId) {
        let Some(point) = self.points.get(id) else {
            return;
        };
        let key = self.location_key(&point.position);
        self.unindex_location(id, key);
        self.detach_point(id);
        self.point_edges.remove(id);
        self.point_triangles.remove(id);
        self.point_faces.remove(id);
        self.points.remove(id);
    }

    /// Removes the given edges if no triangle uses them any more, then the
    /// given points if they have neither edges nor triangles left.
    fn prune(&mut self, edges: &[EdgeId], points: &[PointId]) {
        for &edge in edges {
            if self.edges.contains_key(edge) && !self.edge_in_use(edge) {
                self.unlink_edge(edge);
            }
        }
        for &point in points {
            let orphaned = self.points.contains_key(point)
                && self.point_edges(point).next().is_none()
                && self.point_triangles(point).next().is_none();
            if orphaned {
                self.unlink_point(point);
                trace!(?point, "pruned orphaned point");
            }
        }
    }

    fn edge_in_use(&self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.get(id) else {
            return false;
        };
        self.point_triangles(edge.a)
            .any(|t| self.triangles.get(t).is_some_and(|t| t.contains_edge(id)))
    }

    fn index_location(&mut self, id: PointId, key: LocationKey) {
        self.locations.entry(key).or_default().insert(id);
    }

    fn unindex_location(&mut self, id: PointId, key: LocationKey) {
        if let Some(ids) = self.locations.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.locations.remove(&key);
            }
        }
    }
}

fn insert_into<K: Key, V: Ord>(map: &mut SecondaryMap<K, BTreeSet<V>>, key: K, value: V) {
    if let Some(entry) = map.entry(key) {
        entry.or_default().insert(value);
    }
}

fn remove_from<K: Key, V: Ord>(map: &mut SecondaryMap<K, BTreeSet<V>>, key: K, value: &V) {
    if let Some(set) = map.get_mut(key) {
        set.remove(value);
    }
}
