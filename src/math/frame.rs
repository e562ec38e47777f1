use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// Computes an orthonormal frame on a surface from its two tangents.
///
/// Returns `(ax1, ax2, ax3)` where `ax3` is the unit normal `d1 x d2`,
/// `ax1` is `direction` projected into the tangent plane and normalized,
/// and `ax2 = ax3 x ax1` completes the right-handed frame.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] if the tangents are parallel or
/// `direction` is normal to the surface.
pub fn surface_axes(
    d1: &Vector3,
    d2: &Vector3,
    direction: &Vector3,
) -> Result<(Vector3, Vector3, Vector3)> {
    let ax3 = d1
        .cross(d2)
        .try_normalize(TOLERANCE)
        .ok_or(GeometryError::ZeroVector)?;
    let ax1 = (direction - ax3 * direction.dot(&ax3))
        .try_normalize(TOLERANCE)
        .ok_or(GeometryError::ZeroVector)?;
    let ax2 = ax3.cross(&ax1);
    Ok((ax1, ax2, ax3))
}

/// Unweighted mean of a set of points.
///
/// Accumulates offsets from the first point, so identical inputs return
/// that point exactly. Returns `None` for an empty slice.
#[must_use]
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    let (first, rest) = points.split_first()?;
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    let offset = rest
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + (p - first));
    Some(first + offset / count)
}
