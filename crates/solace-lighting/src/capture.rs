//! Environment capture seam
//!
//! The baker does not render anything itself. For every probe it asks an
//! [`EnvironmentCapture`] for six radiance faces at the probe position. From
//! the second bounce on, the capture also receives the previous bounce's
//! coefficients as [`IndirectLighting`] so it can light surfaces indirectly.

use crate::probe_grid::{sample_trilinear, GridLayout, ShTextureSet};
use crate::sh::ShCoefficients;
use glam::Vec3;
use solace_core::CubemapFaces;

/// Read-only view of the last completed bounce.
#[derive(Debug, Clone, Copy)]
pub struct IndirectLighting<'a> {
    layout: &'a GridLayout,
    textures: &'a ShTextureSet,
}

impl<'a> IndirectLighting<'a> {
    pub(crate) fn new(layout: &'a GridLayout, textures: &'a ShTextureSet) -> Self {
        Self { layout, textures }
    }

    pub fn layout(&self) -> &'a GridLayout {
        self.layout
    }

    /// Stored coefficients of one probe, by linear index.
    pub fn coefficients(&self, cell: usize) -> ShCoefficients {
        self.textures.read(cell)
    }

    pub fn sample_coefficients(&self, world_position: Vec3) -> ShCoefficients {
        sample_trilinear(self.layout, self.textures, world_position)
    }

    pub fn sample_irradiance(&self, world_position: Vec3, normal: Vec3) -> Vec3 {
        self.sample_coefficients(world_position).irradiance(normal)
    }
}

/// Produces the radiance seen from a probe position.
///
/// `indirect` is `None` during the first bounce. The returned faces must use
/// the face size the bake was prepared with.
pub trait EnvironmentCapture {
    fn capture_environment(&mut self, position: Vec3, indirect: Option<&IndirectLighting<'_>>) -> CubemapFaces;
}

impl<F> EnvironmentCapture for F
where
    F: FnMut(Vec3, Option<&IndirectLighting<'_>>) -> CubemapFaces,
{
    fn capture_environment(&mut self, position: Vec3, indirect: Option<&IndirectLighting<'_>>) -> CubemapFaces {
        self(position, indirect)
    }
}

/// Pins a closure to the capture signature.
///
/// Closures handed straight to a generic `C: EnvironmentCapture` parameter
/// do not get the higher-ranked signature inferred; routing them through
/// here does.
pub fn capture_fn<F>(f: F) -> F
where
    F: FnMut(Vec3, Option<&IndirectLighting<'_>>) -> CubemapFaces,
{
    f
}
