use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::polygon_2d::{leftmost_bottom, signed_turn_angle};
use crate::math::{LocationKey, PlaneProjection, Point2, Vector2, TOLERANCE};
use crate::topology::{Data, FaceData, FaceId, PointId};

/// Extracts the ordered outer boundary of a face.
///
/// The face is projected into its own plane and walked with an angular
/// sweep: starting from the leftmost-lowest point, each step takes the
/// neighbor with the largest signed turn from the current heading, which
/// keeps the walk on the outer boundary. Points are merged by location and
/// reported by their lowest ID.
pub struct FacePerimeter {
    face: FaceId,
}

impl FacePerimeter {
    /// Creates a new `FacePerimeter` query.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the query, returning the perimeter as an open loop: the last
    /// point connects back to the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist or has no normal, if the
    /// walk reaches a point with nowhere to go, or if it does not close within
    /// `MorphParams::max_perimeter_steps` steps.
    pub fn execute(&self, data: &Data) -> Result<Vec<PointId>> {
        let face = data
            .face(self.face)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))?;
        let normal = face.normal(data).ok_or(GeometryError::ZeroVector)?;
        let projection = PlaneProjection::new(&normal)?;
        let outline = Outline::collect(face, data, &projection);

        let max_steps = data.params().max_perimeter_steps;
        outline.walk(max_steps).inspect_err(|error| {
            warn!(face = ?self.face, %error, "perimeter walk failed");
        })
    }
}

/// A face's points merged by location, projected to 2D, with the
/// neighbor relation given by the face's own triangle edges.
struct Outline {
    representatives: BTreeMap<LocationKey, PointId>,
    positions: BTreeMap<LocationKey, Point2>,
    neighbors: BTreeMap<LocationKey, BTreeSet<LocationKey>>,
}

impl Outline {
    fn collect(face: &FaceData, data: &Data, projection: &PlaneProjection) -> Self {
        let mut outline = Self {
            representatives: BTreeMap::new(),
            positions: BTreeMap::new(),
            neighbors: BTreeMap::new(),
        };

        for triangle in face.triangles.iter().filter_map(|&id| data.triangle(id)) {
            let mut keys = [LocationKey::default(); 3];
            for (key, id) in keys.iter_mut().zip(triangle.points()) {
                let Some(point) = data.point(id) else {
                    continue;
                };
                *key = data.location_key(&point.position);
                outline
                    .representatives
                    .entry(*key)
                    .and_modify(|current| *current = (*current).min(id))
                    .or_insert(id);
                outline
                    .positions
                    .entry(*key)
                    .or_insert_with(|| projection.project(&point.position));
            }
            for (from, to) in [(0, 1), (1, 2), (2, 0)] {
                outline.link(keys[from], keys[to]);
            }
        }
        outline
    }

    fn link(&mut self, a: LocationKey, b: LocationKey) {
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    fn position(&self, key: &LocationKey) -> Result<Point2> {
        self.positions.get(key).copied().ok_or_else(|| {
            TopologyError::InvalidTopology("perimeter point has no position".into()).into()
        })
    }

    fn walk(&self, max_steps: usize) -> Result<Vec<PointId>> {
        let keys: Vec<LocationKey> = self.positions.keys().copied().collect();
        let points: Vec<Point2> = self.positions.values().copied().collect();
        let start = leftmost_bottom(&points)
            .map(|index| keys[index])
            .ok_or_else(|| TopologyError::InvalidTopology("face has no points".into()))?;

        let mut boundary = vec![start];
        let mut previous: Option<LocationKey> = None;
        let mut current = start;
        let mut heading = Vector2::y();

        for _ in 0..max_steps {
            let origin = self.position(&current)?;
            let mut best: Option<(LocationKey, f64, f64)> = None;
            for &candidate in self.neighbors.get(&current).into_iter().flatten() {
                if Some(candidate) == previous {
                    continue;
                }
                let direction = self.position(&candidate)? - origin;
                let angle = signed_turn_angle(&heading, &direction);
                let distance = direction.norm();
                let better = best.is_none_or(|(_, best_angle, best_distance)| {
                    angle > best_angle + TOLERANCE
                        || ((angle - best_angle).abs() <= TOLERANCE && distance < best_distance)
                });
                if better {
                    best = Some((candidate, angle, distance));
                }
            }

            let Some((next, _, _)) = best else {
                return Err(
                    TopologyError::InvalidTopology("perimeter walk reached a dead end".into())
                        .into(),
                );
            };
            if next == start {
                return Ok(boundary
                    .iter()
                    .filter_map(|key| self.representatives.get(key).copied())
                    .collect());
            }
            heading = self.position(&next)? - origin;
            boundary.push(next);
            previous = Some(current);
            current = next;
        }

        Err(TopologyError::PerimeterStepLimit(max_steps).into())
    }
}
