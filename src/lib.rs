pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod shield;

pub use error::{Result, ShieldError};
pub use shield::{ShieldCounts, ShieldMesh, Side};
