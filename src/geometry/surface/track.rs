use std::fmt;

use tracing::{trace, warn};

use crate::error::{GeometryError, OperationError, Result};
use crate::math::{Matrix2, Point2, Point3, Vector2, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// Maximum number of step halvings tried before a Gauss-Newton step is abandoned.
const MAX_STEP_HALVINGS: usize = 12;

/// Parameters controlling nearest-point search on a [`TrackSurface`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectionParams {
    /// Convergence threshold on the 3D length of a parameter step.
    pub tolerance: f64,
    /// Maximum number of Gauss-Newton iterations.
    pub max_iterations: usize,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
        }
    }
}

/// A location on a track surface, in the surface's own parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSurfacePosition {
    /// U parameter on the surface.
    pub u: f64,
    /// V parameter on the surface.
    pub v: f64,
}

/// Coordinates and tangents evaluated at a [`TrackSurfacePosition`].
#[derive(Debug, Clone, Copy)]
pub struct SurfaceCoordinates {
    /// 3D point on the surface.
    pub point: Point3,
    /// Derivative with respect to the U parameter.
    pub d1: Vector3,
    /// Derivative with respect to the V parameter.
    pub d2: Vector3,
}

/// A bounded surface that generated points are kept on.
///
/// Positions are exchanged as surface parameters or as proportions, where
/// each proportion maps the corresponding parameter range onto `[0, 1]`.
pub struct TrackSurface {
    surface: Box<dyn Surface>,
    domain: SurfaceDomain,
    params: ProjectionParams,
}

impl fmt::Debug for TrackSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackSurface")
            .field("domain", &self.domain)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl TrackSurface {
    /// Wraps a surface for tracking.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface's parameter domain is unbounded or empty.
    pub fn new(surface: impl Surface + 'static) -> Result<Self> {
        let domain = surface.domain();
        if !domain.is_bounded() {
            return Err(OperationError::InvalidInput(
                "track surface requires a bounded parameter domain".into(),
            )
            .into());
        }
        Ok(Self {
            surface: Box::new(surface),
            domain,
            params: ProjectionParams::default(),
        })
    }

    /// Replaces the projection parameters.
    #[must_use]
    pub fn with_params(mut self, params: ProjectionParams) -> Self {
        self.params = params;
        self
    }

    /// Returns the parameter domain.
    #[must_use]
    pub fn domain(&self) -> SurfaceDomain {
        self.domain
    }

    /// Creates a position from proportions across the parameter ranges.
    #[must_use]
    pub fn position_from_proportion(
        &self,
        proportion1: f64,
        proportion2: f64,
    ) -> TrackSurfacePosition {
        let d = &self.domain;
        TrackSurfacePosition {
            u: d.u_min + proportion1 * (d.u_max - d.u_min),
            v: d.v_min + proportion2 * (d.v_max - d.v_min),
        }
    }

    /// Returns the proportions across the parameter ranges of a position.
    #[must_use]
    pub fn proportion(&self, position: &TrackSurfacePosition) -> Point2 {
        let d = &self.domain;
        Point2::new(
            (position.u - d.u_min) / (d.u_max - d.u_min),
            (position.v - d.v_min) / (d.v_max - d.v_min),
        )
    }

    /// Evaluates the point and parameter derivatives at a position.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying surface fails to evaluate.
    pub fn evaluate_coordinates(
        &self,
        position: &TrackSurfacePosition,
    ) -> Result<SurfaceCoordinates> {
        let point = self.surface.evaluate(position.u, position.v)?;
        let (d1, d2) = self.surface.derivatives(position.u, position.v)?;
        Ok(SurfaceCoordinates { point, d1, d2 })
    }

    /// Finds the position on the surface nearest to `point`.
    ///
    /// Damped Gauss-Newton iteration on the squared distance, clamped to the
    /// parameter domain, starting from `start` or the domain centre.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface tangents become parallel or evaluation fails.
    pub fn find_nearest_position(
        &self,
        point: &Point3,
        start: Option<TrackSurfacePosition>,
    ) -> Result<TrackSurfacePosition> {
        let d = &self.domain;
        let (mut u, mut v) = match start {
            Some(s) => d.clamp(s.u, s.v),
            None => (0.5 * (d.u_min + d.u_max), 0.5 * (d.v_min + d.v_max)),
        };
        let mut x = self.surface.evaluate(u, v)?;
        let mut distance_squared = (x - point).norm_squared();

        for iteration in 0..self.params.max_iterations {
            let (du, dv) = self.surface.derivatives(u, v)?;
            let r = x - point;
            let jtj = Matrix2::new(du.dot(&du), du.dot(&dv), du.dot(&dv), dv.dot(&dv));
            let jtr = Vector2::new(du.dot(&r), dv.dot(&r));
            let inverse = jtj.try_inverse().ok_or_else(|| {
                GeometryError::Degenerate("surface tangents are parallel".into())
            })?;
            let step = -(inverse * jtr);

            let mut scale = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_STEP_HALVINGS {
                let (nu, nv) = d.clamp(u + scale * step.x, v + scale * step.y);
                let nx = self.surface.evaluate(nu, nv)?;
                let nd = (nx - point).norm_squared();
                if nd <= distance_squared {
                    accepted = Some((nu, nv, nx, nd));
                    break;
                }
                scale *= 0.5;
            }
            let Some((nu, nv, nx, nd)) = accepted else {
                trace!(iteration, "nearest position: no descent step");
                return Ok(TrackSurfacePosition { u, v });
            };

            let moved = (du * (nu - u) + dv * (nv - v)).norm();
            u = nu;
            v = nv;
            x = nx;
            distance_squared = nd;
            if moved < self.params.tolerance {
                trace!(iteration, distance = nd.sqrt(), "nearest position converged");
                return Ok(TrackSurfacePosition { u, v });
            }
        }
        warn!(
            max_iterations = self.params.max_iterations,
            distance = distance_squared.sqrt(),
            "nearest position search did not converge"
        );
        Ok(TrackSurfacePosition { u, v })
    }

    /// Returns true if `position` lies within [`TOLERANCE`] of the domain.
    #[must_use]
    pub fn contains(&self, position: &TrackSurfacePosition) -> bool {
        let d = &self.domain;
        position.u >= d.u_min - TOLERANCE
            && position.u <= d.u_max + TOLERANCE
            && position.v >= d.v_min - TOLERANCE
            && position.v <= d.v_max + TOLERANCE
    }
}
