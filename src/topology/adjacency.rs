//! Point connectivity and colocation classes.
//!
//! `connected` links every pair of points joined by an edge, closed under
//! colocation: when A and B share a location, every neighbor of one is a
//! neighbor of the other, and colocated peers are neighbors of each other.
//! `colocated` holds each point's colocation class without the point itself.

use std::collections::BTreeSet;

use super::point::PointId;
use super::{insert_into, remove_from, Data};

impl Data {
    /// Points connected to `id` by an edge, directly or through a colocated
    /// peer.
    #[must_use]
    pub fn connected_points(&self, id: PointId) -> Option<&BTreeSet<PointId>> {
        self.connected.get(id)
    }

    /// Other points sharing the location of `id`.
    #[must_use]
    pub fn colocated_points(&self, id: PointId) -> Option<&BTreeSet<PointId>> {
        self.colocated.get(id)
    }

    #[must_use]
    pub fn is_connected(&self, a: PointId, b: PointId) -> bool {
        self.connected.get(a).is_some_and(|set| set.contains(&b))
    }

    #[must_use]
    pub fn is_colocated(&self, a: PointId, b: PointId) -> bool {
        self.colocated.get(a).is_some_and(|set| set.contains(&b))
    }

    /// The colocation class of `id`, including `id` itself.
    pub(crate) fn colocation_class(&self, id: PointId) -> BTreeSet<PointId> {
        let mut class = self.colocated.get(id).cloned().unwrap_or_default();
        class.insert(id);
        class
    }

    /// Connects `a` and `b`.
    ///
    /// With `same_point`, the two colocation classes are merged and every
    /// member of the merged class is connected to every other member and to
    /// every neighbor of any member. Otherwise every member of `a`'s class is
    /// connected to every member of `b`'s class. Repeating a call changes
    /// nothing.
    pub fn add_connection(&mut self, a: PointId, b: PointId, same_point: bool) {
        if a == b || !self.points.contains_key(a) || !self.points.contains_key(b) {
            return;
        }

        if same_point {
            let mut class = self.colocation_class(a);
            class.extend(self.colocation_class(b));
            for &member in &class {
                if let Some(peers) = self.colocated.get_mut(member) {
                    peers.extend(class.iter().copied().filter(|&peer| peer != member));
                }
            }

            let mut neighbors: BTreeSet<PointId> = class
                .iter()
                .filter_map(|&member| self.connected.get(member))
                .flatten()
                .copied()
                .collect();
            neighbors.extend(class.iter().copied());
            for &member in &class {
                for &neighbor in &neighbors {
                    self.link(member, neighbor);
                }
            }
        } else {
            let left = self.colocation_class(a);
            let right = self.colocation_class(b);
            for &x in &left {
                for &y in &right {
                    self.link(x, y);
                }
            }
        }
    }

    /// Merges `id` into the colocation class of every point already at its
    /// location.
    pub(crate) fn connect_points_in_same_location(&mut self, id: PointId) {
        let Some(point) = self.points.get(id) else {
            return;
        };
        let key = self.location_key(&point.position);
        let peers: Vec<PointId> = self
            .locations
            .get(&key)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&peer| peer != id && !self.is_colocated(peer, id))
            .collect();
        for peer in peers {
            self.add_connection(peer, id, true);
        }
    }

    /// Drops the connection between the classes of `a` and `b` unless some
    /// edge still joins a member of one to a member of the other.
    pub(crate) fn disconnect_if_unjoined(&mut self, a: PointId, b: PointId) {
        let left = self.colocation_class(a);
        let right = self.colocation_class(b);
        if !left.is_disjoint(&right) {
            return;
        }
        let joined = left.iter().any(|&x| {
            self.point_edges(x).any(|edge| {
                self.edges
                    .get(edge)
                    .and_then(|edge| edge.other(x))
                    .is_some_and(|other| right.contains(&other))
            })
        });
        if joined {
            return;
        }
        for &x in &left {
            for &y in &right {
                self.unlink(x, y);
            }
        }
    }

    /// Removes `id` from every connection and colocation set.
    pub(crate) fn detach_point(&mut self, id: PointId) {
        if let Some(peers) = self.colocated.remove(id) {
            for peer in peers {
                remove_from(&mut self.colocated, peer, &id);
            }
        }
        if let Some(neighbors) = self.connected.remove(id) {
            for neighbor in neighbors {
                remove_from(&mut self.connected, neighbor, &id);
            }
        }
    }

    fn link(&mut self, a: PointId, b: PointId) {
        if a == b {
            return;
        }
        insert_into(&mut self.connected, a, b);
        insert_into(&mut self.connected, b, a);
    }

    fn unlink(&mut self, a: PointId, b: PointId) {
        remove_from(&mut self.connected, a, &b);
        remove_from(&mut self.connected, b, &a);
    }
}
