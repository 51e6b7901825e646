use crate::error::{GeometryError, MorphError, Result, TopologyError};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{PlaneProjection, Point2};
use crate::topology::{Data, FaceId};

use super::FacePerimeter;

/// Computes the area enclosed by a face's perimeter.
///
/// The perimeter is projected into the face plane and measured with the
/// shoelace formula, so interior points do not affect the result.
pub struct FaceArea {
    face: FaceId,
}

impl FaceArea {
    /// Creates a new `FaceArea` query.
    #[must_use]
    pub fn new(face: FaceId) -> Self {
        Self { face }
    }

    /// Executes the query, returning the (unsigned) area.
    ///
    /// # Errors
    ///
    /// Returns an error if the perimeter cannot be extracted.
    pub fn execute(&self, data: &Data) -> Result<f64> {
        let perimeter = FacePerimeter::new(self.face).execute(data)?;
        let normal = data
            .face(self.face)
            .and_then(|face| face.normal(data))
            .ok_or(GeometryError::ZeroVector)?;
        let projection = PlaneProjection::new(&normal)?;

        let polygon = perimeter
            .iter()
            .map(|&id| {
                data.point(id)
                    .map(|point| projection.project(&point.position))
                    .ok_or_else(|| MorphError::from(TopologyError::EntityNotFound("point".into())))
            })
            .collect::<Result<Vec<Point2>>>()?;
        Ok(signed_area_2d(&polygon).abs())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::{PointData, PointId};
    use approx::assert_relative_eq;

    fn add(data: &mut Data, x: f64, y: f64, z: f64) -> PointId {
        data.add_point(PointData::new(Point3::new(x, y, z)))
    }

    #[test]
    fn unit_square_area() {
        let mut data = Data::new();
        let p0 = add(&mut data, 0.0, 0.0, 0.0);
        let p1 = add(&mut data, 1.0, 0.0, 0.0);
        let p2 = add(&mut data, 1.0, 1.0, 0.0);
        let p3 = add(&mut data, 0.0, 1.0, 0.0);
        data.add_triangle(p0, p1, p2).unwrap();
        data.add_triangle(p0, p2, p3).unwrap();
        let face = data.faces().next().map(|(id, _)| id).unwrap();

        let area = FaceArea::new(face).execute(&data).unwrap();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tilted_triangle_area() {
        let mut data = Data::new();
        let a = add(&mut data, 0.0, 0.0, 0.0);
        let b = add(&mut data, 2.0, 0.0, 0.0);
        let c = add(&mut data, 0.0, 2.0, 2.0);
        data.add_triangle(a, b, c).unwrap();
        let face = data.faces().next().map(|(id, _)| id).unwrap();

        // |(2,0,0) x (0,2,2)| / 2 = |(0,-4,4)| / 2
        let area = FaceArea::new(face).execute(&data).unwrap();
        assert_relative_eq!(area, 32.0_f64.sqrt() / 2.0, epsilon = 1e-9);
    }
}
