mod cylinder;
mod plane;
mod track;

pub use cylinder::Cylinder;
pub use plane::Plane;
pub use track::{ProjectionParams, SurfaceCoordinates, TrackSurface, TrackSurfacePosition};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Parameter domain for a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDomain {
    /// Start of the U parameter range.
    pub u_min: f64,
    /// End of the U parameter range.
    pub u_max: f64,
    /// Start of the V parameter range.
    pub v_min: f64,
    /// End of the V parameter range.
    pub v_max: f64,
}

impl SurfaceDomain {
    /// Creates a new surface domain.
    #[must_use]
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// Returns whether both parameter ranges are finite and non-empty.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        [self.u_min, self.u_max, self.v_min, self.v_max]
            .iter()
            .all(|x| x.is_finite())
            && self.u_max - self.u_min > TOLERANCE
            && self.v_max - self.v_min > TOLERANCE
    }

    /// Clamps `(u, v)` into the domain.
    #[must_use]
    pub fn clamp(&self, u: f64, v: f64) -> (f64, f64) {
        (u.clamp(self.u_min, self.u_max), v.clamp(self.v_min, self.v_max))
    }
}

/// Trait for parametric surfaces in 3D space.
pub trait Surface {
    /// Evaluates the surface at parameters `(u, v)`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range or evaluation fails.
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3>;

    /// Computes the partial derivatives `(dP/du, dP/dv)` at `(u, v)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range.
    fn derivatives(&self, u: f64, v: f64) -> Result<(Vector3, Vector3)>;

    /// Computes the unit surface normal at parameters `(u, v)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range or the normal is degenerate.
    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        let (du, dv) = self.derivatives(u, v)?;
        du.cross(&dv)
            .try_normalize(TOLERANCE)
            .ok_or_else(|| GeometryError::ZeroVector.into())
    }

    /// Returns the parameter domain of the surface.
    fn domain(&self) -> SurfaceDomain;
}
