use crate::bounds::Sphere;
use crate::error::{Result, SolaceError};
use glam::{Mat4, Quat, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Camera {
    pub fn new_perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y,
            aspect_ratio,
            near_plane: near,
            far_plane: far,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near_plane, self.far_plane)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let mat3 = glam::Mat3::from_cols(right, up, -forward);
        self.rotation = Quat::from_mat3(&mat3);
    }

    /// Rejects projections that would make frustum fitting singular.
    pub fn validate(&self) -> Result<()> {
        if !(self.near_plane > 0.0) {
            return Err(SolaceError::config(format!(
                "camera near plane must be positive, got {}",
                self.near_plane
            )));
        }
        if !(self.far_plane > self.near_plane) {
            return Err(SolaceError::config(format!(
                "camera far plane ({}) must exceed near plane ({})",
                self.far_plane, self.near_plane
            )));
        }
        if !(self.fov_y > 0.0 && self.fov_y < std::f32::consts::PI) {
            return Err(SolaceError::config(format!(
                "camera vertical fov must be in (0, pi), got {}",
                self.fov_y
            )));
        }
        if !(self.aspect_ratio > 0.0) {
            return Err(SolaceError::config(format!(
                "camera aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        Ok(())
    }

    /// World-space corners of the part of this camera's frustum between
    /// `near` and `far` view distances.
    pub fn frustum_slice(&self, near: f32, far: f32) -> FrustumCorners {
        FrustumCorners::for_slice(self.view_matrix(), self.fov_y, self.aspect_ratio, near, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// NDC cube corners, OpenGL depth convention. Near face first.
const NDC_CORNERS: [Vec4; 8] = [
    Vec4::new(-1.0, -1.0, -1.0, 1.0),
    Vec4::new(1.0, -1.0, -1.0, 1.0),
    Vec4::new(1.0, 1.0, -1.0, 1.0),
    Vec4::new(-1.0, 1.0, -1.0, 1.0),
    Vec4::new(-1.0, -1.0, 1.0, 1.0),
    Vec4::new(1.0, -1.0, 1.0, 1.0),
    Vec4::new(1.0, 1.0, 1.0, 1.0),
    Vec4::new(-1.0, 1.0, 1.0, 1.0),
];

/// The 8 world-space vertices of a (sub-)frustum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrustumCorners {
    pub corners: [Vec3; 8],
}

impl FrustumCorners {
    /// Unprojects the `(±1, ±1, ±1)` NDC cube through `inv_view_proj`.
    pub fn from_inverse_view_proj(inv_view_proj: Mat4) -> Self {
        let mut corners = [Vec3::ZERO; 8];
        for (corner, ndc) in corners.iter_mut().zip(NDC_CORNERS.iter()) {
            let world = inv_view_proj * *ndc;
            *corner = world.truncate() / world.w;
        }
        Self { corners }
    }

    /// Corners of the slice `[near, far]` of a perspective frustum seen
    /// through `view`.
    pub fn for_slice(view: Mat4, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let proj = Mat4::perspective_rh_gl(fov_y, aspect, near, far);
        Self::from_inverse_view_proj((proj * view).inverse())
    }

    pub fn centroid(&self) -> Vec3 {
        self.corners.iter().copied().sum::<Vec3>() / 8.0
    }

    pub fn bounding_sphere(&self) -> Sphere {
        Sphere::enclosing_points(&self.corners)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.corners
    }
}
