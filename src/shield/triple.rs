use tracing::{debug, trace};

use crate::error::{GeometryError, GridError, Result};
use crate::geometry::SampleCubicHermiteCurves;
use crate::math::{centroid, surface_axes, Point3, Vector3, TOLERANCE};

use super::{GridPoint, ShieldMesh, Side};

/// A curve converging on a triple point, as grid offsets from the rim.
///
/// Offsets are `(rows up, columns in)`; on the right side columns count in
/// from the right rim. Derivative weights `(w1, w2)` build the end derivative
/// `sign * w1 * d1 + w2 * d2`, turning the stored axes 45 degrees toward the
/// triple point.
struct Approach {
    start: (usize, usize),
    start_weights: (f64, f64),
    end: (usize, usize),
    end_weights: (f64, f64),
}

const APPROACHES: [Approach; 3] = [
    // From the rim row, diagonally up and in, ending along d2.
    Approach {
        start: (0, 2),
        start_weights: (1.0, 1.0),
        end: (2, 1),
        end_weights: (0.0, 1.0),
    },
    // From the rim row under the triple point, ending on the diagonal.
    Approach {
        start: (0, 1),
        start_weights: (1.0, 0.0),
        end: (2, 2),
        end_weights: (1.0, 1.0),
    },
    // From the side column above, diagonally down and in, ending along d1.
    Approach {
        start: (2, 0),
        start_weights: (1.0, -1.0),
        end: (1, 2),
        end_weights: (1.0, 0.0),
    },
];

fn weighted(point: &GridPoint, (w1, w2): (f64, f64), sign: f64) -> Vector3 {
    point.d1 * (sign * w1) + point.d2 * w2
}

impl ShieldMesh {
    /// Computes both triple points for through-thickness layer `n3`, left first.
    ///
    /// # Errors
    ///
    /// Returns an error if a required neighbour point or seed proportion is
    /// unset, or if curve sampling or surface projection fails.
    pub fn solve_triple_points(&mut self, n3: usize) -> Result<()> {
        for side in Side::BOTH {
            self.solve_triple_point(side, n3)?;
        }
        Ok(())
    }

    /// Computes the coordinates and derivatives of one triple point.
    ///
    /// Three approach curves are each sampled into two elements by arc length
    /// and their midpoints averaged. With a track surface, the average is
    /// moved to the nearest surface point, searching from the proportion
    /// stored at the inward neighbour, and `d3` is the surface normal.
    ///
    /// # Errors
    ///
    /// Returns an error if a required neighbour point or seed proportion is
    /// unset, if nodes were already generated, or if curve sampling or
    /// surface projection fails.
    pub fn solve_triple_point(&mut self, side: Side, n3: usize) -> Result<()> {
        if self.nodes_generated {
            return Err(GridError::Frozen.into());
        }
        let counts = self.counts;
        let rim = counts.elements_count_rim();
        let (n2b, n2c) = (rim + 1, rim + 2);
        let (n1b, n1c) = (side.column(&counts, 1), side.column(&counts, 2));
        let sign = side.sign();

        let mut estimates = Vec::with_capacity(APPROACHES.len());
        for approach in &APPROACHES {
            let start = self
                .grid
                .require(n3, rim + approach.start.0, side.column(&counts, approach.start.1))?;
            let end = self
                .grid
                .require(n3, rim + approach.end.0, side.column(&counts, approach.end.1))?;
            let samples = SampleCubicHermiteCurves::new(
                vec![start.position, end.position],
                vec![
                    weighted(start, approach.start_weights, sign),
                    weighted(end, approach.end_weights, sign),
                ],
                2,
            )
            .arc_length_derivatives(true)
            .execute()?;
            estimates.push(samples.points[1]);
        }
        let mut position: Point3 = centroid(&estimates)
            .ok_or_else(|| GeometryError::Degenerate("no triple point estimates".into()))?;

        let mut surface_normal = None;
        if let Some(surface) = &self.track_surface {
            let seed = self
                .proportion(n2b, n1c)?
                .ok_or(GridError::MissingProportion { n2: n2b, n1: n1c })?;
            let nearest = surface.find_nearest_position(
                &position,
                Some(surface.position_from_proportion(seed.x, seed.y)),
            )?;
            let coordinates = surface.evaluate_coordinates(&nearest)?;
            let direction = coordinates
                .d1
                .try_normalize(TOLERANCE)
                .ok_or(GeometryError::ZeroVector)?;
            let (_, _, normal) = surface_axes(&coordinates.d1, &coordinates.d2, &direction)?;
            trace!(
                ?side,
                n3,
                moved = (coordinates.point - position).norm(),
                "projected triple point"
            );
            position = coordinates.point;
            surface_normal = Some((normal, surface.proportion(&nearest)));
        }

        let inward = self.grid.require(n3, n2b, n1c)?.position;
        let above = self.grid.require(n3, n2c, n1b)?.position;
        let d1 = (inward - position) * sign;
        let d2 = above - position;
        let d3 = match surface_normal {
            Some((normal, proportion)) => {
                self.set_proportion(n2b, n1b, proportion)?;
                normal
            }
            None => d1
                .cross(&d2)
                .try_normalize(TOLERANCE)
                .ok_or(GeometryError::ZeroVector)?,
        };
        debug!(
            ?side,
            n3,
            n2 = n2b,
            n1 = n1b,
            x = position.x,
            y = position.y,
            z = position.z,
            "solved triple point"
        );
        *self.grid.point_mut(n3, n2b, n1b)? = Some(GridPoint::new(position, d1, d2).with_d3(d3));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::fixtures::{fill_planar, planar_shield};
    use super::*;
    use crate::error::ShieldError;
    use crate::geometry::{Plane, TrackSurface};
    use crate::math::Point2;
    use crate::shield::ShieldCounts;
    use approx::assert_relative_eq;

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn planar_triple_points_stay_in_layer() {
        let mut shield = planar_shield(5, 7, 1);
        shield.solve_triple_points(0).unwrap();
        shield.solve_triple_points(1).unwrap();
        for n3 in 0..2 {
            for n1 in [2, 5] {
                let p = shield.point(n3, 2, n1).unwrap().unwrap();
                assert!((p.position.z - n3 as f64).abs() < 1e-12);
                assert!(p.position.y > 1.0 && p.position.y < 3.0);
                assert!((p.position.x - n1 as f64).abs() < 1.0);
                assert_relative_eq!(p.d3.unwrap(), Vector3::z(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn left_and_right_are_mirror_images() {
        let mut shield = planar_shield(5, 7, 1);
        shield.solve_triple_points(0).unwrap();
        let left = shield.point(0, 2, 2).unwrap().unwrap().position;
        let right = shield.point(0, 2, 5).unwrap().unwrap().position;
        assert_relative_eq!(right.x, 7.0 - left.x, epsilon = 1e-9);
        assert_relative_eq!(right.y, left.y, epsilon = 1e-9);
    }

    #[test]
    fn d1_points_at_inward_neighbour() {
        let mut shield = planar_shield(6, 9, 2);
        shield.solve_triple_points(0).unwrap();
        // Left triple point (3, 3): inward neighbour (3, 4), above (4, 3).
        let left = shield.point(0, 3, 3).unwrap().unwrap();
        assert_relative_eq!(left.d1, Point3::new(4.0, 3.0, 0.0) - left.position, epsilon = 1e-12);
        assert_relative_eq!(left.d2, Point3::new(3.0, 4.0, 0.0) - left.position, epsilon = 1e-12);
        // Right triple point (3, 6): inward neighbour (3, 5) lies in -x, so d1 is negated.
        let right = shield.point(0, 3, 6).unwrap().unwrap();
        assert_relative_eq!(right.d1, right.position - Point3::new(5.0, 3.0, 0.0), epsilon = 1e-12);
        assert!(right.d1.x > 0.0);
        assert_relative_eq!(right.d2, Point3::new(6.0, 4.0, 0.0) - right.position, epsilon = 1e-12);
    }

    fn approach_midpoint(start: (Point3, Vector3), end: (Point3, Vector3)) -> Point3 {
        SampleCubicHermiteCurves::new(vec![start.0, end.0], vec![start.1, end.1], 2)
            .arc_length_derivatives(true)
            .execute()
            .unwrap()
            .points[1]
    }

    #[test]
    fn triple_point_is_mean_of_three_approach_curves() {
        let mut shield = planar_shield(5, 7, 1);
        shield.solve_triple_points(0).unwrap();
        // Left side, rim 1: triple point (2, 2) approached from (1, 3), (1, 2) and (3, 1).
        let estimates = [
            approach_midpoint(
                (Point3::new(3.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 0.0)),
                (Point3::new(2.0, 3.0, 0.0), Vector3::y()),
            ),
            approach_midpoint(
                (Point3::new(2.0, 1.0, 0.0), Vector3::x()),
                (Point3::new(3.0, 3.0, 0.0), Vector3::new(1.0, 1.0, 0.0)),
            ),
            approach_midpoint(
                (Point3::new(1.0, 3.0, 0.0), Vector3::new(1.0, -1.0, 0.0)),
                (Point3::new(3.0, 2.0, 0.0), Vector3::x()),
            ),
        ];
        let mean = Point3::from(estimates.iter().map(|p| p.coords).sum::<Vector3>() / 3.0);
        let left = shield.point(0, 2, 2).unwrap().unwrap().position;
        assert_relative_eq!(left, mean, epsilon = 1e-12);
        // Dropping any one estimate moves the result.
        for skip in 0..3 {
            let partial: Vec<_> = (0..3).filter(|&i| i != skip).map(|i| estimates[i]).collect();
            let partial_mean = centroid(&partial).unwrap();
            assert!((partial_mean - left).norm() > 1e-6);
        }
    }

    #[test]
    fn coincident_estimates_give_their_common_point() {
        // Each approach curve is a straight segment bisected by the origin,
        // with end derivatives equal to its chord.
        let mut shield = ShieldMesh::new(ShieldCounts::new(5, 7, 1).unwrap());
        let diagonal = Vector3::new(1.0, 1.0, 0.0);
        let points = [
            // (n2, n1, position, d1, d2)
            (1, 3, Point3::new(0.0, -1.0, 0.0), Vector3::y(), Vector3::y()),
            (3, 2, Point3::new(0.0, 1.0, 0.0), Vector3::x(), Vector3::new(0.0, 2.0, 0.0)),
            (1, 2, Point3::new(-1.0, -1.0, 0.0), Vector3::new(2.0, 2.0, 0.0), Vector3::y()),
            (3, 3, Point3::new(1.0, 1.0, 0.0), diagonal, diagonal),
            (3, 1, Point3::new(-1.0, 0.0, 0.0), Vector3::new(2.0, 1.0, 0.0), Vector3::y()),
            (2, 3, Point3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0), Vector3::y()),
        ];
        for (n2, n1, position, d1, d2) in points {
            shield.set_point(0, n2, n1, GridPoint::new(position, d1, d2)).unwrap();
        }
        shield.solve_triple_point(Side::Left, 0).unwrap();
        let p = shield.point(0, 2, 2).unwrap().unwrap();
        assert_relative_eq!(p.position, Point3::origin(), epsilon = 1e-9);
        assert_relative_eq!(p.d1, Vector3::x(), epsilon = 1e-9);
        assert_relative_eq!(p.d2, Vector3::y(), epsilon = 1e-9);
        assert_relative_eq!(p.d3.unwrap(), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn unset_neighbour_is_a_precondition_violation() {
        let mut shield = planar_shield(5, 7, 1);
        shield.clear_point(0, 1, 3).unwrap();
        let err = shield.solve_triple_point(Side::Left, 0).unwrap_err();
        assert!(matches!(
            err,
            ShieldError::Grid(GridError::UnsetPoint { n3: 0, n2: 1, n1: 3 })
        ));
        assert!(shield.point(0, 2, 2).unwrap().is_none());
        // The right side does not touch the cleared point.
        shield.solve_triple_point(Side::Right, 0).unwrap();
    }

    fn tracked_shield() -> ShieldMesh {
        let plane = Plane::new(
            Point3::new(-1.0, -1.0, 1.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 10.0, 0.0),
        )
        .unwrap();
        let mut shield = ShieldMesh::new(ShieldCounts::new(5, 7, 1).unwrap())
            .with_track_surface(TrackSurface::new(plane).unwrap());
        fill_planar(&mut shield);
        shield
    }

    #[test]
    fn track_surface_moves_triple_points_onto_surface() {
        let mut shield = tracked_shield();
        shield.set_proportion(2, 3, Point2::new(0.4, 0.3)).unwrap();
        shield.set_proportion(2, 4, Point2::new(0.5, 0.3)).unwrap();
        shield.solve_triple_points(0).unwrap();
        for n1 in [2, 5] {
            let p = shield.point(0, 2, n1).unwrap().unwrap();
            assert_relative_eq!(p.position.z, 1.0, epsilon = 1e-9);
            assert_relative_eq!(p.d3.unwrap(), Vector3::z(), epsilon = 1e-12);
            let proportion = shield.proportion(2, n1).unwrap().unwrap();
            assert_relative_eq!(
                proportion,
                Point2::new((p.position.x + 1.0) / 10.0, (p.position.y + 1.0) / 10.0),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn track_surface_needs_seed_proportion() {
        let mut shield = tracked_shield();
        let err = shield.solve_triple_point(Side::Left, 0).unwrap_err();
        assert!(matches!(
            err,
            ShieldError::Grid(GridError::MissingProportion { n2: 2, n1: 3 })
        ));
    }
}
