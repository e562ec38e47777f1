use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A flat parallelogram patch in 3D space.
///
/// `P(u, v) = origin + u * u_span + v * v_span` for `u, v` in `[0, 1]`.
/// The spans are kept unnormalized so the parameters are proportions across
/// the patch.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_span: Vector3,
    v_span: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new patch from an origin corner and two edge vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if either span is zero-length or the spans are parallel.
    pub fn new(origin: Point3, u_span: Vector3, v_span: Vector3) -> Result<Self> {
        if u_span.norm() < TOLERANCE || v_span.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = u_span.cross(&v_span).try_normalize(TOLERANCE).ok_or_else(|| {
            GeometryError::Degenerate("plane spans are parallel".into())
        })?;
        Ok(Self {
            origin,
            u_span,
            v_span,
            normal,
        })
    }

    /// Returns the origin corner.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal `u_span x v_span`.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }
}

impl Surface for Plane {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_span * u + self.v_span * v)
    }

    fn derivatives(&self, _u: f64, _v: f64) -> Result<(Vector3, Vector3)> {
        Ok((self.u_span, self.v_span))
    }

    fn normal(&self, _u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, 1.0, 0.0, 1.0)
    }
}
