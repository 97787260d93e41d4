use crate::error::{GeometryError, Result};
use crate::math::intersect_3d::{line_plane_intersect, signed_distance_to_plane, LinePlaneRelation};
use crate::math::{Isometry3, Point3, Vector3, TOLERANCE};

use super::Ray;

/// An oriented box: the solid of a straight wall.
///
/// Stored as a center, three orthonormal axes and the half extent along
/// each axis. Axis 0 runs along the wall baseline, axis 1 across its
/// thickness and axis 2 is vertical.
#[derive(Debug, Clone)]
pub struct Prism {
    center: Point3,
    axes: [Vector3; 3],
    half_extents: [f64; 3],
}

impl Prism {
    /// Builds the prism swept upward from a horizontal baseline.
    ///
    /// `start` and `end` give the baseline at the wall's base elevation
    /// (taken from `start.z`); the wall extends `thickness / 2` to each side
    /// of it and `height` upward.
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline has no horizontal extent or if the
    /// thickness or height is not positive.
    pub fn from_baseline(start: Point3, end: Point3, thickness: f64, height: f64) -> Result<Self> {
        let run = Vector3::new(end.x - start.x, end.y - start.y, 0.0);
        let len = run.norm();
        if !len.is_finite() || len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("wall baseline has no horizontal length".into()).into(),
            );
        }
        if !(thickness > TOLERANCE && height > TOLERANCE) {
            return Err(GeometryError::Degenerate(format!(
                "wall thickness {thickness} and height {height} must be positive"
            ))
            .into());
        }

        let along = run / len;
        let up = Vector3::z();
        let across = up.cross(&along);
        let center = Point3::new(
            (start.x + end.x) * 0.5,
            (start.y + end.y) * 0.5,
            start.z + height * 0.5,
        );

        Ok(Self {
            center,
            axes: [along, across, up],
            half_extents: [len * 0.5, thickness * 0.5, height * 0.5],
        })
    }

    /// Returns the prism's center point.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the prism moved by a rigid transform.
    #[must_use]
    pub fn transformed(&self, iso: &Isometry3) -> Self {
        Self {
            center: iso.transform_point(&self.center),
            axes: self.axes.map(|axis| iso.transform_vector(&axis)),
            half_extents: self.half_extents,
        }
    }

    /// Returns the ray parameter of every face the ray crosses at `t >= 0`.
    ///
    /// Each face is reported on its own, so a ray passing through the prism
    /// yields both the entry and the exit face. A ray starting inside the
    /// prism reports only the faces ahead of it. Crossings through an edge
    /// or corner are reported once per adjacent face.
    #[must_use]
    pub fn face_crossings(&self, ray: &Ray) -> Vec<f64> {
        let mut hits = Vec::new();
        for (i, axis) in self.axes.iter().enumerate() {
            for sign in [-1.0, 1.0] {
                let normal = axis * sign;
                let face_origin = self.center + normal * self.half_extents[i];
                let LinePlaneRelation::Point { point, t } =
                    line_plane_intersect(ray.origin(), ray.direction(), &face_origin, &normal)
                else {
                    continue;
                };
                if t < -TOLERANCE || !self.within_face(&point, i) {
                    continue;
                }
                hits.push(t.max(0.0));
            }
        }
        hits
    }

    /// Checks that `point` lies inside the face bounds along every axis
    /// except `skip`.
    fn within_face(&self, point: &Point3, skip: usize) -> bool {
        self.axes
            .iter()
            .zip(self.half_extents)
            .enumerate()
            .filter(|(j, _)| *j != skip)
            .all(|(_, (axis, half))| {
                signed_distance_to_plane(point, &self.center, axis).abs() <= half + TOLERANCE
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Wall along Y at x = 3, 0.2 thick, 3 high.
    fn wall_at_x3() -> Prism {
        Prism::from_baseline(p(3.0, -5.0, 0.0), p(3.0, 5.0, 0.0), 0.2, 3.0).unwrap()
    }

    fn sorted(mut ts: Vec<f64>) -> Vec<f64> {
        ts.sort_by(f64::total_cmp);
        ts
    }

    #[test]
    fn ray_through_wall_reports_entry_and_exit() {
        let ray = Ray::new(p(0.0, 0.0, 1.0), Vector3::x()).unwrap();
        let hits = sorted(wall_at_x3().face_crossings(&ray));
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0], 2.9, epsilon = 1e-9);
        assert_relative_eq!(hits[1], 3.1, epsilon = 1e-9);
    }

    #[test]
    fn ray_above_wall_misses() {
        let ray = Ray::new(p(0.0, 0.0, 4.0), Vector3::x()).unwrap();
        assert!(wall_at_x3().face_crossings(&ray).is_empty());
    }

    #[test]
    fn ray_pointing_away_misses() {
        let ray = Ray::new(p(0.0, 0.0, 1.0), -Vector3::x()).unwrap();
        assert!(wall_at_x3().face_crossings(&ray).is_empty());
    }

    #[test]
    fn ray_starting_inside_reports_exit_only() {
        let ray = Ray::new(p(3.0, 0.0, 1.0), Vector3::x()).unwrap();
        let hits = wall_at_x3().face_crossings(&ray);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0], 0.1, epsilon = 1e-9);
    }

    #[test]
    fn transformed_prism_moves_with_link() {
        let iso = Isometry3::from_parts(
            Translation3::new(10.0, 0.0, 0.0),
            UnitQuaternion::identity(),
        );
        let moved = wall_at_x3().transformed(&iso);
        assert_relative_eq!(*moved.center(), p(13.0, 0.0, 1.5), epsilon = 1e-12);

        let ray = Ray::new(p(0.0, 0.0, 1.0), Vector3::x()).unwrap();
        let hits = sorted(moved.face_crossings(&ray));
        assert_relative_eq!(hits[0], 12.9, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_baseline_is_rejected() {
        assert!(Prism::from_baseline(p(1.0, 1.0, 0.0), p(1.0, 1.0, 3.0), 0.2, 3.0).is_err());
        assert!(Prism::from_baseline(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), 0.0, 3.0).is_err());
    }
}
