//! Solace - the lighting core of a deferred renderer
//!
//! Fits cascaded shadow maps for the sun every frame and bakes a grid of
//! spherical-harmonic irradiance probes over as many frames as it takes.
//! [`LightingOrchestrator`] ties both to one [`ProbeBakeContext`]; the member
//! crates are re-exported for finer-grained use.

pub use solace_core as core;
pub use solace_lighting as lighting;

mod orchestrator;

pub use orchestrator::LightingOrchestrator;
pub use solace_lighting::ProbeBakeContext;

pub mod prelude {
    pub use crate::core::{Aabb, Camera, CubeFace, CubemapFaces, FrustumCorners, SolaceError, Sphere};
    pub use crate::lighting::{
        capture_fn, BakeRequest, BakeState, Cascade, CascadeConfig, CascadedShadowMaps, EnvironmentCapture,
        IndirectLighting, ProbeBakeConfig, ProbeBakeContext, ProbeGrid, ProbeGridBaker, ShCoefficients,
    };
    pub use crate::LightingOrchestrator;
    pub use glam;
}
