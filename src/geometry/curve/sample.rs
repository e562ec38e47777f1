use crate::error::{GeometryError, OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::CubicHermite;

/// Points and derivatives sampled along a piecewise cubic Hermite curve.
#[derive(Debug, Clone, Default)]
pub struct CurveSamples {
    /// Sampled points, `elements_count_out + 1` of them.
    pub points: Vec<Point3>,
    /// Derivatives at each sampled point.
    pub derivatives: Vec<Vector3>,
}

/// Resamples a piecewise cubic Hermite curve into elements of equal arc length.
///
/// The input curve passes through `points` with `derivatives` at each point.
/// The output has `elements_count_out + 1` points; the first and last input
/// points are reproduced exactly.
pub struct SampleCubicHermiteCurves {
    points: Vec<Point3>,
    derivatives: Vec<Vector3>,
    elements_count_out: usize,
    arc_length_derivatives: bool,
}

impl SampleCubicHermiteCurves {
    /// Creates a new sampling operation.
    #[must_use]
    pub fn new(points: Vec<Point3>, derivatives: Vec<Vector3>, elements_count_out: usize) -> Self {
        Self {
            points,
            derivatives,
            elements_count_out,
            arc_length_derivatives: false,
        }
    }

    /// When set, output derivatives are unit tangents scaled to the output
    /// element arc length. Otherwise the curve derivative is rescaled from
    /// the input segment's parameterization to the output element's.
    #[must_use]
    pub fn arc_length_derivatives(mut self, enabled: bool) -> Self {
        self.arc_length_derivatives = enabled;
        self
    }

    /// Executes the sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two points are given, the point and
    /// derivative counts differ, `elements_count_out` is zero, or the curve
    /// has zero length.
    pub fn execute(&self) -> Result<CurveSamples> {
        if self.points.len() < 2 {
            return Err(
                OperationError::InvalidInput("at least two points are required".into()).into(),
            );
        }
        if self.points.len() != self.derivatives.len() {
            return Err(OperationError::InvalidInput(format!(
                "{} points but {} derivatives",
                self.points.len(),
                self.derivatives.len()
            ))
            .into());
        }
        if self.elements_count_out == 0 {
            return Err(
                OperationError::InvalidInput("elements_count_out must be positive".into()).into(),
            );
        }

        let segments: Vec<CubicHermite> = self
            .points
            .windows(2)
            .zip(self.derivatives.windows(2))
            .map(|(p, d)| CubicHermite::new(p[0], d[0], p[1], d[1]))
            .collect();
        let lengths: Vec<f64> = segments.iter().map(CubicHermite::arc_length).collect();
        let total: f64 = lengths.iter().sum();
        if total < TOLERANCE {
            return Err(GeometryError::Degenerate("curve has zero length".into()).into());
        }
        #[allow(clippy::cast_precision_loss)]
        let element_length = total / self.elements_count_out as f64;

        let mut samples = CurveSamples {
            points: Vec::with_capacity(self.elements_count_out + 1),
            derivatives: Vec::with_capacity(self.elements_count_out + 1),
        };
        let mut segment = 0;
        let mut segment_start = 0.0;
        for n in 0..=self.elements_count_out {
            #[allow(clippy::cast_precision_loss)]
            let target = element_length * n as f64;
            while segment + 1 < segments.len() && target > segment_start + lengths[segment] {
                segment_start += lengths[segment];
                segment += 1;
            }
            let curve = &segments[segment];
            let length = lengths[segment];
            let xi = if n == 0 {
                0.0
            } else if n == self.elements_count_out {
                1.0
            } else if length < TOLERANCE {
                0.0
            } else {
                curve.xi_at_arc_length((target - segment_start).clamp(0.0, length))?
            };

            let point = if xi == 0.0 {
                *curve.start()
            } else if xi == 1.0 {
                *curve.end()
            } else {
                curve.point_at(xi)
            };
            let tangent = curve.derivative_at(xi);
            let derivative = if self.arc_length_derivatives {
                let direction = tangent
                    .try_normalize(TOLERANCE)
                    .or_else(|| (curve.end() - curve.start()).try_normalize(TOLERANCE))
                    .ok_or(GeometryError::ZeroVector)?;
                direction * element_length
            } else if length < TOLERANCE {
                tangent
            } else {
                tangent * (element_length / length)
            };
            samples.points.push(point);
            samples.derivatives.push(derivative);
        }
        Ok(samples)
    }
}
