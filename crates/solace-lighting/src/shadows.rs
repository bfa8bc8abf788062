//! Cascaded shadow maps for the directional sun light
//!
//! Splits the camera frustum along depth and fits one orthographic light
//! projection around each slice. Two fitting modes:
//!
//! - **Stabilized**: a cube around the slice's bounding sphere. The footprint
//!   only depends on the frustum shape, and the light-space translation is
//!   snapped to whole shadow texels, so cascades do not shimmer while the
//!   camera moves or turns.
//! - **Tight**: the light-space AABB of the slice corners, with the depth range
//!   widened by `z_multiplier` to catch casters outside the view.

use crate::context::ProbeBakeContext;
use arrayvec::ArrayVec;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use solace_core::{Aabb, Camera, FrustumCorners, Result, SolaceError};

/// Upper bound on cascades; sized for the GPU uniform block.
pub const MAX_CASCADES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub cascade_count: u32,
    /// 0.0 = uniform splits, 1.0 = fully logarithmic.
    pub split_lambda: f32,
    pub stabilize: bool,
    /// Depth widening for tight fits. Scene dependent, must be >= 1.
    pub z_multiplier: f32,
    pub shadow_map_resolution: u32,
    pub bias: f32,
    pub normal_bias: f32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            cascade_count: 4,
            split_lambda: 0.75,
            stabilize: true,
            z_multiplier: 10.0,
            shadow_map_resolution: 2048,
            bias: 0.0005,
            normal_bias: 0.001,
        }
    }
}

impl CascadeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cascade_count(mut self, count: u32) -> Self {
        self.cascade_count = count;
        self
    }

    pub fn with_split_lambda(mut self, lambda: f32) -> Self {
        self.split_lambda = lambda;
        self
    }

    pub fn with_stabilization(mut self, stabilize: bool) -> Self {
        self.stabilize = stabilize;
        self
    }

    pub fn with_z_multiplier(mut self, z_multiplier: f32) -> Self {
        self.z_multiplier = z_multiplier;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.shadow_map_resolution = resolution;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cascade_count == 0 || self.cascade_count as usize > MAX_CASCADES {
            return Err(SolaceError::config(format!(
                "cascade count must be in 1..={}, got {}",
                MAX_CASCADES, self.cascade_count
            )));
        }
        if !(0.0..=1.0).contains(&self.split_lambda) {
            return Err(SolaceError::config(format!(
                "split lambda must be in [0, 1], got {}",
                self.split_lambda
            )));
        }
        if !(self.z_multiplier >= 1.0) || !self.z_multiplier.is_finite() {
            return Err(SolaceError::config(format!(
                "z multiplier must be a finite value >= 1, got {}",
                self.z_multiplier
            )));
        }
        if self.shadow_map_resolution == 0 {
            return Err(SolaceError::config("shadow map resolution must be non-zero"));
        }
        Ok(())
    }
}

/// Far distance of each cascade, blending uniform and logarithmic splits.
///
/// Strictly increasing for `0 < near < far`; the last entry is exactly `far`.
pub fn compute_splits(near: f32, far: f32, cascade_count: u32, lambda: f32) -> Vec<f32> {
    let count = cascade_count as f32;
    let mut splits: Vec<f32> = (0..cascade_count)
        .map(|i| {
            let s = (i + 1) as f32 / count;
            let log_split = near * (far / near).powf(s);
            let uniform_split = near + (far - near) * s;
            uniform_split + (log_split - uniform_split) * lambda
        })
        .collect();

    if let Some(last) = splits.last_mut() {
        *last = far;
    }
    splits
}

/// One fitted cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    pub index: usize,
    pub near_distance: f32,
    pub far_distance: f32,
    pub light_view: Mat4,
    pub light_projection: Mat4,
    pub light_view_projection: Mat4,
    /// Light-space bounds relative to the slice centre; z is depth along the light.
    pub light_bounds: Aabb,
    /// Radius of the slice's centroid bounding sphere.
    pub radius: f32,
    /// World units covered by one shadow map texel.
    pub texel_size: f32,
}

#[derive(Debug, Clone)]
pub struct CascadeFitter {
    config: CascadeConfig,
}

impl CascadeFitter {
    pub fn new(config: CascadeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn compute_splits(&self, near: f32, far: f32) -> Vec<f32> {
        compute_splits(near, far, self.config.cascade_count, self.config.split_lambda)
    }

    /// Fits the light projection for the view-depth slice `[near, far]`.
    #[allow(clippy::too_many_arguments)]
    pub fn fit_cascade(
        &self,
        index: usize,
        near: f32,
        far: f32,
        view: Mat4,
        fov_y: f32,
        aspect: f32,
        sun_direction: Vec3,
    ) -> Cascade {
        let light_dir = sun_direction.normalize_or_zero();
        debug_assert!(light_dir != Vec3::ZERO, "sun direction must be non-zero");
        let up = light_up(light_dir);
        let resolution = self.config.shadow_map_resolution as f32;

        let corners = FrustumCorners::for_slice(view, fov_y, aspect, near, far);
        let sphere = corners.bounding_sphere();
        let center = sphere.center;

        let (bounds, texel_size) = if self.config.stabilize {
            let radius = sphere.radius;
            debug_assert!(radius > 0.0, "degenerate cascade slice");
            let bounds = Aabb::new(Vec3::splat(-radius), Vec3::splat(radius));
            (bounds, radius / resolution * 2.0)
        } else {
            let bounds = tight_bounds(&corners, center, light_dir, up, self.config.z_multiplier);
            (bounds, (bounds.max.x - bounds.min.x) / resolution)
        };

        // Eye on the near face of the bound, so light-space depth starts at 0.
        let eye = center + light_dir * bounds.min.z;
        let mut light_view = Mat4::look_to_rh(eye, light_dir, up);

        if self.config.stabilize {
            // TODO: snap the depth translation too; only X/Y are quantized.
            light_view.w_axis.x = (light_view.w_axis.x / texel_size).round() * texel_size;
            light_view.w_axis.y = (light_view.w_axis.y / texel_size).round() * texel_size;
        }

        let light_projection = Mat4::orthographic_rh(
            bounds.min.x,
            bounds.max.x,
            bounds.min.y,
            bounds.max.y,
            0.0,
            bounds.max.z - bounds.min.z,
        );

        Cascade {
            index,
            near_distance: near,
            far_distance: far,
            light_view,
            light_projection,
            light_view_projection: light_projection * light_view,
            light_bounds: bounds,
            radius: sphere.radius,
            texel_size,
        }
    }

    /// Splits the camera frustum and fits every cascade.
    pub fn fit_all(&self, camera: &Camera, sun_direction: Vec3) -> ArrayVec<Cascade, MAX_CASCADES> {
        let view = camera.view_matrix();
        let splits = self.compute_splits(camera.near_plane, camera.far_plane);

        let mut cascades = ArrayVec::new();
        let mut near = camera.near_plane;
        for (index, &far) in splits.iter().enumerate().take(MAX_CASCADES) {
            cascades.push(self.fit_cascade(
                index,
                near,
                far,
                view,
                camera.fov_y,
                camera.aspect_ratio,
                sun_direction,
            ));
            near = far;
        }
        cascades
    }
}

/// Up vector for the light camera that stays clear of the light direction.
fn light_up(light_dir: Vec3) -> Vec3 {
    if light_dir.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Light-space AABB of the slice corners, depth measured along the light and
/// expressed relative to `center`.
fn tight_bounds(corners: &FrustumCorners, center: Vec3, light_dir: Vec3, up: Vec3, z_multiplier: f32) -> Aabb {
    // Temporary eye one unit up-light of the centre.
    let view = Mat4::look_to_rh(center - light_dir, light_dir, up);
    let view_bounds = Aabb::from_transformed_points(corners.points(), &view);

    // View space looks down -Z; flip so z grows away from the light.
    let mut min = Vec3::new(view_bounds.min.x, view_bounds.min.y, -view_bounds.max.z);
    let mut max = Vec3::new(view_bounds.max.x, view_bounds.max.y, -view_bounds.min.z);

    min.z = if min.z < 0.0 { min.z * z_multiplier } else { min.z / z_multiplier };
    max.z = if max.z < 0.0 { max.z / z_multiplier } else { max.z * z_multiplier };

    min.z -= 1.0;
    max.z -= 1.0;
    Aabb::new(min, max)
}

/// Per-frame cascade state consumed by the shadow and shading passes.
pub struct CascadedShadowMaps {
    fitter: CascadeFitter,
    cascades: ArrayVec<Cascade, MAX_CASCADES>,
}

impl CascadedShadowMaps {
    pub fn new(config: CascadeConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Cascaded shadows: {} cascades at {}x{}, lambda {}, {}",
            config.cascade_count,
            config.shadow_map_resolution,
            config.shadow_map_resolution,
            config.split_lambda,
            if config.stabilize { "stabilized" } else { "tight fit" }
        );
        Ok(Self {
            fitter: CascadeFitter::new(config),
            cascades: ArrayVec::new(),
        })
    }

    pub fn config(&self) -> &CascadeConfig {
        self.fitter.config()
    }

    /// Refits every cascade for this frame's camera.
    ///
    /// On error the cascades of the previous frame are kept.
    pub fn update(&mut self, ctx: &ProbeBakeContext, camera: &Camera) -> Result<()> {
        self.refit(ctx, camera).map_err(|e| {
            log::error!("Skipping cascade update: {}", e);
            e
        })
    }

    fn refit(&mut self, ctx: &ProbeBakeContext, camera: &Camera) -> Result<()> {
        camera.validate()?;
        let sun = ctx.light_direction();
        if sun == Vec3::ZERO {
            return Err(SolaceError::config("sun direction must be non-zero"));
        }

        if &ctx.shadows != self.fitter.config() {
            ctx.shadows.validate()?;
            log::info!("Cascade configuration changed, refitting with {:?}", ctx.shadows);
            self.fitter = CascadeFitter::new(ctx.shadows.clone());
        }

        self.cascades = self.fitter.fit_all(camera, sun);
        Ok(())
    }

    pub fn cascades(&self) -> &[Cascade] {
        &self.cascades
    }

    pub fn cascade_matrices(&self) -> ArrayVec<Mat4, MAX_CASCADES> {
        self.cascades.iter().map(|c| c.light_view_projection).collect()
    }

    pub fn cascade_splits(&self) -> ArrayVec<f32, MAX_CASCADES> {
        self.cascades.iter().map(|c| c.far_distance).collect()
    }

    /// Cascade covering a fragment at `view_depth` (positive distance along
    /// the camera forward axis), or `None` beyond the last split.
    pub fn cascade_for_depth(&self, view_depth: f32) -> Option<usize> {
        self.cascades
            .iter()
            .position(|c| view_depth <= c.far_distance)
    }

    pub fn uniforms(&self) -> CascadeUniforms {
        let mut uniforms = CascadeUniforms::zeroed();
        for (i, cascade) in self.cascades.iter().enumerate() {
            uniforms.light_view_proj[i] = cascade.light_view_projection.to_cols_array_2d();
            uniforms.splits[i / 4][i % 4] = cascade.far_distance;
        }
        uniforms.cascade_count = self.cascades.len() as u32;
        uniforms.bias = self.config().bias;
        uniforms.normal_bias = self.config().normal_bias;
        uniforms
    }
}

/// Uniform block for shading: matrices, far splits and bias terms.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CascadeUniforms {
    pub light_view_proj: [[[f32; 4]; 4]; MAX_CASCADES],
    /// Far split per cascade, packed four per vec4.
    pub splits: [[f32; 4]; 2],
    pub cascade_count: u32,
    pub bias: f32,
    pub normal_bias: f32,
    pub _pad: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn splits_hit_far_plane_exactly() {
        for count in 1..=5 {
            for lambda in [0.0, 0.3, 0.75, 1.0] {
                let splits = compute_splits(0.1, 250.0, count, lambda);
                assert_eq!(splits.len(), count as usize);
                assert_eq!(*splits.last().unwrap(), 250.0);
            }
        }
    }

    #[test]
    fn lambda_selects_split_scheme() {
        let uniform = compute_splits(1.0, 100.0, 4, 0.0);
        assert_relative_eq!(uniform[0], 25.75, epsilon = 1e-4);
        assert_relative_eq!(uniform[1], 50.5, epsilon = 1e-4);

        let log = compute_splits(1.0, 100.0, 4, 1.0);
        assert_relative_eq!(log[0], 100.0_f32.powf(0.25), epsilon = 1e-4);
        assert_relative_eq!(log[1], 10.0, epsilon = 1e-4);
    }

    #[test]
    fn config_validation() {
        assert!(CascadeConfig::default().validate().is_ok());
        assert!(CascadeConfig::new().with_cascade_count(0).validate().is_err());
        assert!(CascadeConfig::new().with_cascade_count(6).validate().is_err());
        assert!(CascadeConfig::new().with_split_lambda(1.5).validate().is_err());
        assert!(CascadeConfig::new().with_z_multiplier(0.5).validate().is_err());
        assert!(CascadeConfig::new().with_resolution(0).validate().is_err());
    }

    #[test]
    fn rejected_update_keeps_previous_cascades() {
        let ctx = ProbeBakeContext::default();
        let mut shadows = CascadedShadowMaps::new(CascadeConfig::default()).unwrap();
        shadows.update(&ctx, &Camera::new_perspective(1.0, 1.0, 0.5, 80.0)).unwrap();
        let fitted = shadows.cascade_matrices();

        let bad_camera = Camera::new_perspective(1.0, 1.0, 0.0, 80.0);
        assert!(matches!(
            shadows.update(&ctx, &bad_camera),
            Err(SolaceError::InvalidConfiguration(_))
        ));

        let bad_config = ProbeBakeContext::default().with_shadows(CascadeConfig::new().with_cascade_count(0));
        assert!(shadows.update(&bad_config, &Camera::default()).is_err());
        assert_eq!(shadows.config(), &CascadeConfig::default());

        assert!(shadows.update(&ProbeBakeContext::new(Vec3::ZERO), &Camera::default()).is_err());
        assert_eq!(shadows.cascade_matrices(), fitted);
    }

    #[test]
    fn light_up_avoids_parallel_sun() {
        assert_eq!(light_up(Vec3::NEG_Y), Vec3::Z);
        assert_eq!(light_up(Vec3::new(0.6, -0.8, 0.0)), Vec3::Y);
    }

    #[test]
    fn uniforms_pack_splits_four_per_row() {
        let config = CascadeConfig::new().with_cascade_count(5);
        let ctx = ProbeBakeContext::default().with_shadows(config.clone());
        let mut shadows = CascadedShadowMaps::new(config).unwrap();
        let camera = Camera::new_perspective(1.0, 1.0, 0.5, 80.0);
        shadows.update(&ctx, &camera).unwrap();

        let uniforms = shadows.uniforms();
        assert_eq!(uniforms.cascade_count, 5);
        assert_eq!(uniforms.splits[1][0], 80.0);
        assert_eq!(uniforms.splits[0][0], shadows.cascade_splits()[0]);
    }
}
