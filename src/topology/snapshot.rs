//! Plain-value capture of a registry.
//!
//! A [`Snapshot`] holds only the entity arenas; adjacency indexes are
//! rebuilt by [`deserialize`]. Arena keys survive the round trip, so IDs held
//! by a host stay valid.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{Result, TopologyError};

use super::edge::{EdgeData, EdgeId};
use super::face::{FaceData, FaceId};
use super::params::MorphParams;
use super::point::{PointData, PointId};
use super::triangle::{TriangleData, TriangleId};
use super::{insert_into, Data};

/// The entity arenas of a [`Data`] registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub params: MorphParams,
    pub points: SlotMap<PointId, PointData>,
    pub edges: SlotMap<EdgeId, EdgeData>,
    pub triangles: SlotMap<TriangleId, TriangleData>,
    pub faces: SlotMap<FaceId, FaceData>,
}

/// Captures the arenas of `data`.
#[must_use]
pub fn serialize(data: &Data) -> Snapshot {
    Snapshot {
        params: data.params,
        points: data.points.clone(),
        edges: data.edges.clone(),
        triangles: data.triangles.clone(),
        faces: data.faces.clone(),
    }
}

/// Rebuilds a registry from a snapshot, reconstructing every adjacency
/// index.
///
/// # Errors
///
/// Returns an error if an entity references a missing entity, a triangle's
/// edges do not join its corners, a face is empty, or a triangle belongs to
/// no face or to more than one.
pub fn deserialize(snapshot: Snapshot) -> Result<Data> {
    let Snapshot {
        params,
        points,
        edges,
        triangles,
        faces,
    } = snapshot;
    let mut data = Data {
        params,
        points,
        edges,
        triangles,
        faces,
        ..Data::default()
    };

    let ids: Vec<PointId> = data.points.keys().collect();
    for &id in &ids {
        data.point_edges.insert(id, BTreeSet::new());
        data.point_triangles.insert(id, BTreeSet::new());
        data.point_faces.insert(id, BTreeSet::new());
        data.connected.insert(id, BTreeSet::new());
        data.colocated.insert(id, BTreeSet::new());
        if let Some(point) = data.points.get(id) {
            let key = data.location_key(&point.position);
            data.index_location(id, key);
        }
    }
    for id in ids {
        data.connect_points_in_same_location(id);
    }

    let edges: Vec<(EdgeId, EdgeData)> = data.edges.iter().map(|(id, edge)| (id, *edge)).collect();
    for (id, edge) in edges {
        if !data.points.contains_key(edge.a) || !data.points.contains_key(edge.b) {
            return Err(invalid("edge references a missing point"));
        }
        insert_into(&mut data.point_edges, edge.a, id);
        insert_into(&mut data.point_edges, edge.b, id);
        data.add_connection(edge.a, edge.b, false);
    }

    let triangles: Vec<(TriangleId, TriangleData)> = data
        .triangles
        .iter()
        .map(|(id, triangle)| (id, *triangle))
        .collect();
    for (id, triangle) in triangles {
        let joined = |edge: EdgeId, a: PointId, b: PointId| {
            data.edges.get(edge).is_some_and(|edge| edge.joins(a, b))
        };
        let consistent = joined(triangle.ab, triangle.a, triangle.b)
            && joined(triangle.bc, triangle.b, triangle.c)
            && joined(triangle.ca, triangle.c, triangle.a);
        if !consistent {
            return Err(invalid("triangle edges do not join its corners"));
        }
        let Some([a, b, c]) = triangle.point_locations(&data) else {
            return Err(invalid("triangle references a missing point"));
        };
        if a == b || b == c || c == a {
            return Err(invalid("triangle has two corners at one location"));
        }
        for point in triangle.points() {
            insert_into(&mut data.point_triangles, point, id);
        }
    }

    let faces: Vec<(FaceId, Vec<TriangleId>)> = data
        .faces
        .iter()
        .map(|(id, face)| (id, face.triangles.iter().copied().collect()))
        .collect();
    for (face, members) in faces {
        if members.is_empty() {
            return Err(invalid("face has no triangles"));
        }
        if !is_single_face(&members, &data) {
            return Err(invalid("face members do not form one planar patch"));
        }
        for triangle in members {
            let Some(points) = data.triangles.get(triangle).map(TriangleData::points) else {
                return Err(invalid("face references a missing triangle"));
            };
            if data.triangle_faces.insert(triangle, face).is_some() {
                return Err(invalid("triangle belongs to more than one face"));
            }
            for point in points {
                insert_into(&mut data.point_faces, point, face);
            }
        }
    }
    if data
        .triangles
        .keys()
        .any(|id| !data.triangle_faces.contains_key(id))
    {
        return Err(invalid("triangle belongs to no face"));
    }

    Ok(data)
}

/// Every member reachable from the first through same-face neighbors.
fn is_single_face(members: &[TriangleId], data: &Data) -> bool {
    let Some(&first) = members.first() else {
        return false;
    };
    let mut reached = BTreeSet::from([first]);
    let mut stack = vec![first];
    while let Some(current) = stack.pop() {
        let Some(current) = data.triangles.get(current) else {
            return false;
        };
        for &other in members {
            if reached.contains(&other) {
                continue;
            }
            let same_face = data
                .triangles
                .get(other)
                .is_some_and(|other| current.is_same_face(other, data));
            if same_face {
                reached.insert(other);
                stack.push(other);
            }
        }
    }
    reached.len() == members.len()
}

fn invalid(reason: &str) -> crate::MorphError {
    TopologyError::InvalidTopology(reason.into()).into()
}
