use serde::{Deserialize, Serialize};

use super::point::PointId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the registry.
    pub struct EdgeId;
}

/// Data associated with an edge.
///
/// An edge is an unordered pair of points; `(a, b)` and `(b, a)` denote the
/// same edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// First endpoint.
    pub a: PointId,
    /// Second endpoint.
    pub b: PointId,
}

impl EdgeData {
    /// Creates a new edge between two points.
    #[must_use]
    pub fn new(a: PointId, b: PointId) -> Self {
        Self { a, b }
    }

    /// Returns the endpoint opposite to `point`, if `point` is an endpoint.
    #[must_use]
    pub fn other(&self, point: PointId) -> Option<PointId> {
        if self.a == point {
            Some(self.b)
        } else if self.b == point {
            Some(self.a)
        } else {
            None
        }
    }

    /// Returns `true` if this edge joins `a` and `b`, in either order.
    #[must_use]
    pub fn joins(&self, a: PointId, b: PointId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}
