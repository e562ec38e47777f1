pub mod curve;
pub mod surface;

pub use curve::{CubicHermite, Curve, CurveDomain, CurveSamples, SampleCubicHermiteCurves};
pub use surface::{
    Cylinder, Plane, ProjectionParams, Surface, SurfaceCoordinates, SurfaceDomain,
    TrackSurface, TrackSurfacePosition,
};
