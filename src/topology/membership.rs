//! Face membership: assigning triangles to faces and keeping faces planar
//! and connected as points move.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::Point3;

use super::face::{FaceData, FaceId};
use super::point::PointId;
use super::triangle::{TriangleData, TriangleId};
use super::{insert_into, remove_from, Data};

impl Data {
    /// Adds `triangle` to the first face that accepts it, or to a new face.
    ///
    /// A triangle that could join two existing faces joins only the first;
    /// the faces are not merged.
    pub(crate) fn connect_triangle_with_face(&mut self, triangle: TriangleId) -> FaceId {
        let existing = self
            .faces
            .iter()
            .find(|(_, face)| face.accepts(triangle, self))
            .map(|(id, _)| id);
        let face = existing.unwrap_or_else(|| {
            let id = self.faces.insert(FaceData::default());
            debug!(face = ?id, ?triangle, "created face");
            id
        });
        self.attach(face, triangle);
        face
    }

    /// Moves `triangle` into `face` if it lies on the same face as one of its
    /// members.
    ///
    /// Returns `false` (and changes nothing) if the face does not exist, the
    /// triangle is already a member, or it does not fit.
    pub fn try_add_triangle(&mut self, face: FaceId, triangle: TriangleId) -> bool {
        let accepted = self
            .faces
            .get(face)
            .is_some_and(|data| data.accepts(triangle, self));
        if !accepted {
            return false;
        }
        if let Some(previous) = self.remove_membership(triangle) {
            self.split_disconnected(previous);
        }
        self.attach(face, triangle);
        true
    }

    fn attach(&mut self, face: FaceId, triangle: TriangleId) {
        let Some(points) = self.triangles.get(triangle).map(TriangleData::points) else {
            return;
        };
        let Some(data) = self.faces.get_mut(face) else {
            return;
        };
        data.triangles.insert(triangle);
        self.triangle_faces.insert(triangle, face);
        for point in points {
            insert_into(&mut self.point_faces, point, face);
        }
    }

    /// Takes `triangle` out of its face, deleting the face if it becomes
    /// empty. Returns the face the triangle left.
    pub(crate) fn remove_membership(&mut self, triangle: TriangleId) -> Option<FaceId> {
        let face = self.triangle_faces.remove(triangle)?;
        let data = self.faces.get_mut(face)?;
        data.triangles.remove(&triangle);

        if let Some(points) = self.triangles.get(triangle).map(TriangleData::points) {
            for point in points {
                let still_member = self.faces.get(face).is_some_and(|data| {
                    data.triangles.iter().any(|&other| {
                        self.triangles
                            .get(other)
                            .is_some_and(|other| other.contains_point(point))
                    })
                });
                if !still_member {
                    remove_from(&mut self.point_faces, point, &face);
                }
            }
        }

        if self.faces.get(face).is_some_and(FaceData::is_empty) {
            self.faces.remove(face);
            debug!(?face, "removed empty face");
        }
        Some(face)
    }

    /// Splits `face` into its same-face connected components. The component
    /// holding the lowest triangle ID keeps the face; every other component
    /// moves to a new face. Returns the new faces.
    pub(crate) fn split_disconnected(&mut self, face: FaceId) -> Vec<FaceId> {
        let Some(members) = self
            .faces
            .get(face)
            .map(|data| data.triangles.iter().copied().collect::<Vec<_>>())
        else {
            return Vec::new();
        };
        if members.len() <= 1 {
            return Vec::new();
        }

        let mut seen = BTreeSet::new();
        let mut components: Vec<Vec<TriangleId>> = Vec::new();
        for &start in &members {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                let Some(current) = self.triangles.get(current) else {
                    continue;
                };
                for &other in &members {
                    if seen.contains(&other) {
                        continue;
                    }
                    let same_face = self
                        .triangles
                        .get(other)
                        .is_some_and(|other| current.is_same_face(other, self));
                    if same_face {
                        seen.insert(other);
                        component.push(other);
                        queue.push_back(other);
                    }
                }
            }
            components.push(component);
        }

        let mut created = Vec::new();
        for component in components.into_iter().skip(1) {
            for &triangle in &component {
                self.remove_membership(triangle);
            }
            let id = self.faces.insert(FaceData::default());
            for triangle in component {
                self.attach(id, triangle);
            }
            created.push(id);
        }
        if !created.is_empty() {
            debug!(?face, parts = created.len() + 1, "split face");
        }
        created
    }

    /// Re-checks face membership of triangles whose geometry changed.
    ///
    /// A triangle that no longer lies on the same face as any other member is
    /// detached and reassigned; the faces it touched are then split into
    /// connected components.
    fn revalidate(&mut self, triangles: impl IntoIterator<Item = TriangleId>) {
        let mut touched = BTreeSet::new();
        for triangle in triangles {
            let Some(face) = self.triangle_faces.get(triangle).copied() else {
                continue;
            };
            touched.insert(face);
            let stranded = self
                .faces
                .get(face)
                .is_some_and(|data| data.len() > 1 && !data.keeps(triangle, self));
            if stranded {
                self.remove_membership(triangle);
                let target = self.connect_triangle_with_face(triangle);
                debug!(?triangle, from = ?face, to = ?target, "triangle left its face");
            }
        }
        for face in touched {
            self.split_disconnected(face);
        }
    }

    /// Re-evaluates the faces of every triangle with `id` as a corner after
    /// the point moved.
    pub fn on_relocate_point(&mut self, id: PointId) {
        let triangles: Vec<TriangleId> = self.point_triangles(id).collect();
        self.revalidate(triangles);
    }

    /// Moves a point and all of its colocated peers to `position`.
    ///
    /// The class merges with any points already at the destination, and the
    /// faces of every affected triangle are re-partitioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the point does not exist, or if the move would
    /// collapse an edge or triangle onto a single location. Nothing changes in
    /// that case.
    pub fn relocate_point(&mut self, id: PointId, position: Point3) -> Result<()> {
        if !self.points.contains_key(id) {
            return Err(TopologyError::EntityNotFound("point".into()).into());
        }
        let class = self.colocation_class(id);
        let target = self.location_key(&position);

        let collapses = class.iter().any(|&member| {
            self.point_edges(member).any(|edge| {
                self.edges
                    .get(edge)
                    .and_then(|edge| edge.other(member))
                    .filter(|other| !class.contains(other))
                    .and_then(|other| self.points.get(other))
                    .is_some_and(|other| self.location_key(&other.position) == target)
            })
        });
        if collapses {
            return Err(GeometryError::Degenerate(
                "relocation would collapse an edge onto one location".into(),
            )
            .into());
        }

        for &member in &class {
            let Some(point) = self.points.get_mut(member) else {
                continue;
            };
            let previous = point.position;
            point.position = position;
            let previous = self.location_key(&previous);
            self.unindex_location(member, previous);
            self.index_location(member, target);
        }
        for &member in &class {
            self.connect_points_in_same_location(member);
        }
        for &member in &class {
            self.on_relocate_point(member);
        }
        debug!(?id, moved = class.len(), ?position, "relocated point");
        Ok(())
    }

    /// Reverses a triangle's winding and re-evaluates its face.
    ///
    /// Returns `false` if the triangle does not exist.
    pub fn flip_triangle(&mut self, id: TriangleId) -> bool {
        let Some(triangle) = self.triangles.get_mut(id) else {
            return false;
        };
        triangle.flip();
        self.revalidate([id]);
        true
    }

    /// Replaces every triangle of `face` with triangles over the given point
    /// triples. Edges and points no longer used are pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist, or a triple references a
    /// missing point or has two corners at one location. Nothing changes in
    /// that case.
    pub fn replace_face_triangles(
        &mut self,
        face: FaceId,
        triples: &[[PointId; 3]],
    ) -> Result<Vec<TriangleId>> {
        let Some(previous) = self
            .faces
            .get(face)
            .map(|data| data.triangles.iter().copied().collect::<Vec<_>>())
        else {
            return Err(TopologyError::EntityNotFound("face".into()).into());
        };
        for triple in triples {
            let [a, b, c] = self.require_locations(*triple)?;
            if a == b || b == c || c == a {
                return Err(
                    GeometryError::Degenerate("triangle corners share a location".into()).into(),
                );
            }
        }

        let mut created = Vec::with_capacity(triples.len());
        for &[a, b, c] in triples {
            let id = self.insert_triangle(a, b, c)?;
            self.attach(face, id);
            created.push(id);
        }

        let replaced = previous.len();
        let mut edges = Vec::new();
        let mut points = Vec::new();
        for triangle in previous {
            if let Some((data, _)) = self.unlink_triangle(triangle) {
                edges.extend(data.edges());
                points.extend(data.points());
            }
        }
        self.prune(&edges, &points);
        debug!(?face, replaced, created = created.len(), "replaced face triangles");
        Ok(created)
    }
}
