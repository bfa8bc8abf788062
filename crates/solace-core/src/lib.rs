//! Solace core - geometric primitives shared by the lighting crates
//!
//! Frustum corner extraction, bounding volumes, the cube face convention and
//! the error type every Solace crate returns.

pub mod bounds;
pub mod camera;
pub mod cubemap;
pub mod error;

pub use bounds::{Aabb, Sphere};
pub use camera::{Camera, FrustumCorners};
pub use cubemap::{CubeFace, CubemapFaces};
pub use error::{Result, SolaceError};
