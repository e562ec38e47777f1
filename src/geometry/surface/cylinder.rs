use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A patch of a cylindrical surface.
///
/// `P(u, v) = base + radius * cos(u) * ref_dir + radius * sin(u) * binormal + v * axis`
/// where `binormal = axis x ref_dir`, `u` spans `[angle_start, angle_end]` and
/// `v` spans `[0, height]`.
///
/// The outward normal is `cos(u) * ref_dir + sin(u) * binormal`.
#[derive(Debug, Clone)]
pub struct Cylinder {
    base: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
    angle_start: f64,
    angle_end: f64,
    height: f64,
}

impl Cylinder {
    /// Creates a new cylinder patch.
    ///
    /// # Arguments
    ///
    /// * `base` - Centre of the bottom circle, on the axis
    /// * `radius` - Radius (must be positive)
    /// * `axis` - Axis direction (will be normalized)
    /// * `ref_dir` - Reference direction for u=0 (must be perpendicular to axis)
    /// * `angles` - Angular range `(start, end)` of the patch in radians
    /// * `height` - Extent along the axis (must be positive)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is non-positive, a direction
    /// is zero-length, the reference direction is not perpendicular to the
    /// axis, or the angular range is empty.
    pub fn new(
        base: Point3,
        radius: f64,
        axis: Vector3,
        ref_dir: Vector3,
        angles: (f64, f64),
        height: f64,
    ) -> Result<Self> {
        if radius < TOLERANCE || height < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "cylinder radius and height must be positive".into(),
            )
            .into());
        }
        let axis = axis.try_normalize(TOLERANCE).ok_or(GeometryError::ZeroVector)?;
        let ref_dir = ref_dir.try_normalize(TOLERANCE).ok_or(GeometryError::ZeroVector)?;
        if axis.dot(&ref_dir).abs() > TOLERANCE {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to axis".into(),
            )
            .into());
        }
        let (angle_start, angle_end) = angles;
        if angle_end - angle_start < TOLERANCE {
            return Err(GeometryError::Degenerate("empty angular range".into()).into());
        }
        Ok(Self {
            base,
            radius,
            axis,
            ref_dir,
            angle_start,
            angle_end,
            height,
        })
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the axis direction (unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    fn binormal(&self) -> Vector3 {
        self.axis.cross(&self.ref_dir)
    }
}

impl Surface for Cylinder {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let binormal = self.binormal();
        Ok(self.base
            + self.ref_dir * (self.radius * u.cos())
            + binormal * (self.radius * u.sin())
            + self.axis * v)
    }

    fn derivatives(&self, u: f64, _v: f64) -> Result<(Vector3, Vector3)> {
        let binormal = self.binormal();
        let du = (binormal * u.cos() - self.ref_dir * u.sin()) * self.radius;
        Ok((du, self.axis))
    }

    fn normal(&self, u: f64, _v: f64) -> Result<Vector3> {
        let n = self.ref_dir * u.cos() + self.binormal() * u.sin();
        n.try_normalize(TOLERANCE)
            .ok_or_else(|| GeometryError::ZeroVector.into())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(self.angle_start, self.angle_end, 0.0, self.height)
    }
}
