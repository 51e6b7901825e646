use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::debug;

use crate::error::{GeometryError, Result, TopologyError, TriangulationError};
use crate::math::PlaneProjection;
use crate::topology::{Data, FaceId, PointId};

use super::FacePerimeter;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Computes a smaller triangulation of a face over its perimeter points.
///
/// A face whose perimeter has at least two more points than it has
/// triangles is already minimal and is left alone, as is a face whose
/// perimeter passes through one location twice. Otherwise the perimeter polygon is
/// triangulated in the face's plane; the result is only offered if it uses
/// fewer triangles than the face does now.
pub struct RetriangulateFace {
    face: FaceId,
}

impl RetriangulateFace {
    /// Creates a new `RetriangulateFace` query.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the query. Returns `None` when there is nothing to improve,
    /// otherwise the new corner triples, wound to match the face normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the perimeter cannot be extracted or the polygon
    /// cannot be triangulated.
    pub fn execute(&self, data: &Data) -> Result<Option<Vec<[PointId; 3]>>> {
        let face = data
            .face(self.face)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))?;
        let triangle_count = face.len();
        let perimeter = FacePerimeter::new(self.face).execute(data)?;
        if perimeter.len() >= triangle_count + 2 {
            debug!(face = ?self.face, triangle_count, "face already minimal");
            return Ok(None);
        }
        let distinct: HashSet<PointId> = perimeter.iter().copied().collect();
        if distinct.len() < perimeter.len() {
            debug!(face = ?self.face, "perimeter is pinched, not a simple polygon");
            return Ok(None);
        }

        let normal = face.normal(data).ok_or(GeometryError::ZeroVector)?;
        let projection = PlaneProjection::new(&normal)?;
        let mut positions = Vec::with_capacity(perimeter.len());
        let mut polygon = Vec::with_capacity(perimeter.len());
        for &id in &perimeter {
            let point = data
                .point(id)
                .ok_or_else(|| TopologyError::EntityNotFound("point".into()))?;
            let projected = projection.project(&point.position);
            positions.push(point.position);
            polygon.push(SpadePoint2::new(projected.x, projected.y));
        }

        let triples = triangulate_polygon(&polygon)?;
        if triples.len() >= triangle_count {
            return Ok(None);
        }

        let result = triples
            .into_iter()
            .map(|[i, j, k]| {
                let winding = (positions[j] - positions[i]).cross(&(positions[k] - positions[i]));
                if winding.dot(&normal) < 0.0 {
                    [perimeter[i], perimeter[k], perimeter[j]]
                } else {
                    [perimeter[i], perimeter[j], perimeter[k]]
                }
            })
            .collect::<Vec<_>>();
        debug!(
            face = ?self.face,
            before = triangle_count,
            after = result.len(),
            "retriangulated face"
        );
        Ok(Some(result))
    }
}

/// Triangulates a simple polygon, returning triples of indices into
/// `polygon`.
fn triangulate_polygon(polygon: &[SpadePoint2<f64>]) -> Result<Vec<[usize; 3]>> {
    if polygon.len() < 3 {
        return Err(
            TriangulationError::Failed("polygon needs at least 3 points".into()).into(),
        );
    }

    let mut cdt = Cdt::new();
    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(polygon.len());
    let mut polygon_index: HashMap<usize, usize> = HashMap::new();
    for (index, &point) in polygon.iter().enumerate() {
        let handle = cdt
            .insert(point)
            .map_err(|e: InsertionError| TriangulationError::Failed(format!("CDT insert: {e}")))?;
        if polygon_index.insert(handle.index(), index).is_some() {
            return Err(TriangulationError::Failed(
                "polygon visits one position twice".into(),
            )
            .into());
        }
        handles.push(handle);
    }

    for (i, &from) in handles.iter().enumerate() {
        let to = handles[(i + 1) % handles.len()];
        if !cdt.can_add_constraint(from, to) {
            return Err(TriangulationError::Failed("polygon self-intersects".into()).into());
        }
        cdt.add_constraint(from, to);
    }

    let interior = interior_faces(&cdt);
    let mut triples = Vec::with_capacity(interior.len());
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let [a, b, c] = face
            .vertices()
            .map(|vertex| polygon_index.get(&vertex.fix().index()).copied());
        let (Some(a), Some(b), Some(c)) = (a, b, c) else {
            return Err(
                TriangulationError::Failed("triangle uses an unknown vertex".into()).into(),
            );
        };
        triples.push([a, b, c]);
    }
    Ok(triples)
}

/// Inner faces of the triangulation that lie inside the constraint loop.
///
/// Flood-fills from the convex hull inwards, toggling inside/outside every
/// time a constraint edge is crossed.
fn interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut inside = HashSet::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, bool)> = VecDeque::new();

    let outer = cdt.outer_face().fix();
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let crossed = cdt.is_constraint_edge(edge.as_undirected().fix());
            queue.push_back((inner.fix(), crossed));
        }
    }

    while let Some((face, is_inside)) = queue.pop_front() {
        if !visited.insert(face.index()) {
            continue;
        }
        if is_inside {
            inside.insert(face.index());
        }
        for edge in cdt.face(face).adjacent_edges() {
            if let Some(neighbor) = edge.rev().face().as_inner() {
                if visited.contains(&neighbor.fix().index()) {
                    continue;
                }
                let crossed = cdt.is_constraint_edge(edge.as_undirected().fix());
                queue.push_back((neighbor.fix(), is_inside ^ crossed));
            }
        }
    }
    inside
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::PointData;

    fn add(data: &mut Data, x: f64, y: f64) -> PointId {
        data.add_point(PointData::new(Point3::new(x, y, 0.0)))
    }

    fn only_face(data: &Data) -> FaceId {
        data.faces().next().map(|(id, _)| id).unwrap()
    }

    #[test]
    fn minimal_face_declines() {
        let mut data = Data::new();
        let p0 = add(&mut data, 0.0, 0.0);
        let p1 = add(&mut data, 1.0, 0.0);
        let p2 = add(&mut data, 1.0, 1.0);
        let p3 = add(&mut data, 0.0, 1.0);
        data.add_triangle(p0, p1, p2).unwrap();
        data.add_triangle(p0, p2, p3).unwrap();

        let result = RetriangulateFace::new(only_face(&data)).execute(&data).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn centre_fan_collapses_to_two_triangles() {
        let mut data = Data::new();
        let centre = add(&mut data, 0.5, 0.5);
        let corners = [
            add(&mut data, 0.0, 0.0),
            add(&mut data, 1.0, 0.0),
            add(&mut data, 1.0, 1.0),
            add(&mut data, 0.0, 1.0),
        ];
        for i in 0..4 {
            data.add_triangle(centre, corners[i], corners[(i + 1) % 4])
                .unwrap();
        }
        let face = only_face(&data);
        let normal = data.face(face).unwrap().normal(&data).unwrap();

        let triples = RetriangulateFace::new(face).execute(&data).unwrap().unwrap();
        assert_eq!(triples.len(), 2);
        for [a, b, c] in triples {
            assert!(![a, b, c].contains(&centre));
            let pa = data.point(a).unwrap().position;
            let pb = data.point(b).unwrap().position;
            let pc = data.point(c).unwrap().position;
            assert!((pb - pa).cross(&(pc - pa)).dot(&normal) > 0.0);
        }
    }

    #[test]
    fn pinched_face_declines() {
        // Two triangles touching at a single point
        let mut data = Data::new();
        let a0 = add(&mut data, 0.0, -1.0);
        let pinch = add(&mut data, 1.0, 0.0);
        let a2 = add(&mut data, 0.0, 1.0);
        let b1 = add(&mut data, 2.0, -1.0);
        let b2 = add(&mut data, 2.0, 1.0);
        data.add_triangle(a0, pinch, a2).unwrap();
        data.add_triangle(pinch, b1, b2).unwrap();
        let face = only_face(&data);

        let perimeter = FacePerimeter::new(face).execute(&data).unwrap();
        assert_eq!(perimeter.len(), 6);
        assert_eq!(perimeter.iter().filter(|&&id| id == pinch).count(), 2);
        assert!(RetriangulateFace::new(face).execute(&data).unwrap().is_none());
    }

    #[test]
    fn concave_polygon_stays_inside() {
        // An L-shape split into a fan around an interior point
        let outline = [
            SpadePoint2::new(0.0, 0.0),
            SpadePoint2::new(2.0, 0.0),
            SpadePoint2::new(2.0, 1.0),
            SpadePoint2::new(1.0, 1.0),
            SpadePoint2::new(1.0, 2.0),
            SpadePoint2::new(0.0, 2.0),
        ];
        let triples = triangulate_polygon(&outline).unwrap();
        assert_eq!(triples.len(), 4);
        let area: f64 = triples
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (outline[a], outline[b], outline[c]);
                ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() * 0.5
            })
            .sum();
        assert!((area - 3.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_points_fail() {
        let outline = [SpadePoint2::new(0.0, 0.0), SpadePoint2::new(1.0, 0.0)];
        assert!(triangulate_polygon(&outline).is_err());
    }
}
