use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// Five-point Gauss-Legendre abscissae on `[-1, 1]`.
const GAUSS_POINTS: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683,
    0.0,
    0.538_469_310_105_683,
    0.906_179_845_938_664,
];

/// Weights matching [`GAUSS_POINTS`].
const GAUSS_WEIGHTS: [f64; 5] = [
    0.236_926_885_056_189,
    0.478_628_670_499_366,
    0.568_888_888_888_889,
    0.478_628_670_499_366,
    0.236_926_885_056_189,
];

/// Sub-intervals used for composite arc length quadrature.
const QUADRATURE_INTERVALS: usize = 8;

const MAX_INVERSION_ITERATIONS: usize = 100;

/// A cubic Hermite segment between two points with end derivatives.
///
/// `P(xi) = h00 * p0 + h10 * d0 + h01 * p1 + h11 * d1` for `xi` in `[0, 1]`,
/// with the usual Hermite basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicHermite {
    start: Point3,
    start_derivative: Vector3,
    end: Point3,
    end_derivative: Vector3,
}

impl CubicHermite {
    /// Creates a new segment.
    #[must_use]
    pub fn new(
        start: Point3,
        start_derivative: Vector3,
        end: Point3,
        end_derivative: Vector3,
    ) -> Self {
        Self {
            start,
            start_derivative,
            end,
            end_derivative,
        }
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point3 {
        &self.end
    }

    pub(crate) fn point_at(&self, xi: f64) -> Point3 {
        let xi2 = xi * xi;
        let xi3 = xi2 * xi;
        let h00 = 2.0 * xi3 - 3.0 * xi2 + 1.0;
        let h10 = xi3 - 2.0 * xi2 + xi;
        let h01 = -2.0 * xi3 + 3.0 * xi2;
        let h11 = xi3 - xi2;
        Point3::from(
            self.start.coords * h00
                + self.start_derivative * h10
                + self.end.coords * h01
                + self.end_derivative * h11,
        )
    }

    pub(crate) fn derivative_at(&self, xi: f64) -> Vector3 {
        let xi2 = xi * xi;
        let dh00 = 6.0 * xi2 - 6.0 * xi;
        let dh10 = 3.0 * xi2 - 4.0 * xi + 1.0;
        let dh01 = -6.0 * xi2 + 6.0 * xi;
        let dh11 = 3.0 * xi2 - 2.0 * xi;
        self.start.coords * dh00
            + self.start_derivative * dh10
            + self.end.coords * dh01
            + self.end_derivative * dh11
    }

    /// Arc length from `xi = 0` to `xi`, by composite Gauss-Legendre quadrature.
    #[must_use]
    pub fn arc_length_to(&self, xi: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let h = xi / QUADRATURE_INTERVALS as f64;
        let mut length = 0.0;
        for i in 0..QUADRATURE_INTERVALS {
            #[allow(clippy::cast_precision_loss)]
            let mid = (i as f64 + 0.5) * h;
            for (g, w) in GAUSS_POINTS.iter().zip(GAUSS_WEIGHTS.iter()) {
                length += w * self.derivative_at(mid + 0.5 * h * g).norm();
            }
        }
        length * 0.5 * h
    }

    /// Total arc length of the segment.
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.arc_length_to(1.0)
    }

    /// Finds the parameter at which the arc length from the start equals `s`.
    ///
    /// Safeguarded Newton iteration: steps leaving the current bracket fall
    /// back to bisection.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` lies outside `[0, arc_length]` or the segment
    /// has zero length.
    pub fn xi_at_arc_length(&self, s: f64) -> Result<f64> {
        let total = self.arc_length();
        if total < TOLERANCE {
            return Err(GeometryError::Degenerate("zero-length hermite segment".into()).into());
        }
        let slack = TOLERANCE * total.max(1.0);
        if s < -slack || s > total + slack {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "arc length",
                value: s,
                min: 0.0,
                max: total,
            }
            .into());
        }
        let s = s.clamp(0.0, total);
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let mut xi = s / total;
        for _ in 0..MAX_INVERSION_ITERATIONS {
            let residual = self.arc_length_to(xi) - s;
            if residual.abs() < slack {
                break;
            }
            if residual > 0.0 {
                hi = xi;
            } else {
                lo = xi;
            }
            let speed = self.derivative_at(xi).norm();
            let newton = if speed > TOLERANCE {
                xi - residual / speed
            } else {
                f64::NAN
            };
            xi = if newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
        }
        Ok(xi)
    }
}

impl Curve for CubicHermite {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        check_parameter(t)?;
        Ok(self.point_at(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        check_parameter(t)?;
        Ok(self.derivative_at(t))
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }

    fn is_closed(&self) -> bool {
        (self.end - self.start).norm() < TOLERANCE
    }
}

fn check_parameter(t: f64) -> Result<()> {
    if (0.0..=1.0).contains(&t) {
        Ok(())
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter: "xi",
            value: t,
            min: 0.0,
            max: 1.0,
        }
        .into())
    }
}
