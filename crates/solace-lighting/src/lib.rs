//! Lighting for Solace
//!
//! Two subsystems share this crate:
//!
//! - [`shadows`]: cascaded shadow maps for the sun. Splits the view frustum
//!   and fits a stable orthographic light projection per cascade.
//! - Probe baking ([`baker`], [`probe_grid`], [`sh_projector`]): captures the
//!   environment at every probe of a regular grid, projects it to 9
//!   spherical-harmonic coefficients and repeats for several bounces so
//!   later bounces pick up indirect light from earlier ones.
//!
//! Both read their settings from an explicit [`ProbeBakeContext`].

pub mod baker;
pub mod capture;
pub mod context;
pub mod probe_grid;
pub mod sh;
pub mod sh_projector;
pub mod shadows;
pub mod textures;

pub use baker::{BakeRequest, BakeState, ProbeGridBaker};
pub use capture::{capture_fn, EnvironmentCapture, IndirectLighting};
pub use context::{ProbeBakeConfig, ProbeBakeContext};
pub use probe_grid::{DoubleBuffer, GridLayout, ProbeGrid, ShTextureSet, MAX_GRID_DIMENSION, MAX_PROBE_COUNT};
pub use sh::{sh_basis, PackedSh, ShCoefficients, PACKED_TEXEL_COUNT, SH_COEFFICIENT_COUNT};
pub use sh_projector::{project_cubemap, texel_weight, ShProjector, SolidAngleTable};
pub use shadows::{
    compute_splits, Cascade, CascadeConfig, CascadeFitter, CascadeUniforms, CascadedShadowMaps, MAX_CASCADES,
};
pub use textures::{ProbeGridTextures, ProbeGridUniforms, SH_TEXTURE_FORMAT};
