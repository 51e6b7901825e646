use super::{Point2, Vector2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the index of the leftmost vertex (smallest x), breaking ties by
/// smallest y. `None` for an empty slice.
#[must_use]
pub fn leftmost_bottom(points: &[Point2]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, pt) in points.iter().enumerate() {
        let Some(b) = best.map(|b| &points[b]) else {
            best = Some(i);
            continue;
        };
        if pt.x < b.x - TOLERANCE || ((pt.x - b.x).abs() < TOLERANCE && pt.y < b.y) {
            best = Some(i);
        }
    }
    best
}

/// Signed angle in `(-PI, PI]` that turns `reference` onto `direction`.
///
/// Positive angles are counter-clockwise (left) turns.
#[must_use]
pub fn signed_turn_angle(reference: &Vector2, direction: &Vector2) -> f64 {
    let cross = reference.x * direction.y - reference.y * direction.x;
    let dot = reference.dot(direction);
    cross.atan2(dot)
}
