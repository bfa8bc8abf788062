//! Cubemap face conventions and per-face radiance storage
//!
//! The face table is shared by whoever renders a capture and by the SH
//! projector, so a texel written at `(face, x, y)` is always integrated along
//! the same direction it was rendered from.

use crate::error::{Result, SolaceError};
use glam::{Mat4, Vec2, Vec3};

/// The six axis-aligned cube faces in the standard layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction through the centre of the face.
    pub fn forward(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the face's capture camera.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveX | CubeFace::NegativeX => Vec3::NEG_Y,
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            CubeFace::PositiveZ | CubeFace::NegativeZ => Vec3::NEG_Y,
        }
    }

    /// Screen-right of the face's capture camera (right-handed).
    pub fn right(self) -> Vec3 {
        self.forward().cross(self.up())
    }

    pub fn view_matrix(self, position: Vec3) -> Mat4 {
        Mat4::look_to_rh(position, self.forward(), self.up())
    }

    /// 90° square projection covering exactly one face.
    pub fn projection(near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far)
    }

    /// NDC coordinates of a texel centre; row 0 is the top of the face.
    pub fn texel_ndc(x: u32, y: u32, face_size: u32) -> Vec2 {
        let size = face_size as f32;
        let u = 2.0 * (x as f32 + 0.5) / size - 1.0;
        let v = 1.0 - 2.0 * (y as f32 + 0.5) / size;
        Vec2::new(u, v)
    }

    /// Unit world direction through the centre of texel `(x, y)`.
    pub fn texel_direction(self, x: u32, y: u32, face_size: u32) -> Vec3 {
        self.ndc_direction(Self::texel_ndc(x, y, face_size))
    }

    pub fn ndc_direction(self, ndc: Vec2) -> Vec3 {
        (self.forward() + self.right() * ndc.x + self.up() * ndc.y).normalize()
    }
}

/// Radiance samples for all six faces of one environment capture.
///
/// Each face is `face_size * face_size` linear RGB values, row-major with row
/// 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct CubemapFaces {
    face_size: u32,
    faces: [Vec<Vec3>; 6],
}

impl CubemapFaces {
    pub fn new(face_size: u32) -> Self {
        Self::uniform(face_size, Vec3::ZERO)
    }

    pub fn uniform(face_size: u32, radiance: Vec3) -> Self {
        let texels = (face_size * face_size) as usize;
        Self {
            face_size,
            faces: std::array::from_fn(|_| vec![radiance; texels]),
        }
    }

    /// Fills every texel from its face and view direction.
    pub fn from_fn(face_size: u32, mut radiance: impl FnMut(CubeFace, Vec3) -> Vec3) -> Self {
        let faces = CubeFace::ALL.map(|face| {
            let mut texels = Vec::with_capacity((face_size * face_size) as usize);
            for y in 0..face_size {
                for x in 0..face_size {
                    texels.push(radiance(face, face.texel_direction(x, y, face_size)));
                }
            }
            texels
        });
        Self { face_size, faces }
    }

    /// Wraps externally rendered faces, checking every face is complete.
    pub fn from_faces(face_size: u32, faces: [Vec<Vec3>; 6]) -> Result<Self> {
        let expected = (face_size * face_size) as usize;
        for (face, texels) in CubeFace::ALL.iter().zip(faces.iter()) {
            if texels.len() != expected {
                return Err(SolaceError::MalformedCubemap(format!(
                    "{:?} has {} texels, expected {}",
                    face,
                    texels.len(),
                    expected
                )));
            }
        }
        Ok(Self { face_size, faces })
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    pub fn face(&self, face: CubeFace) -> &[Vec3] {
        &self.faces[face.index()]
    }

    pub fn face_mut(&mut self, face: CubeFace) -> &mut [Vec3] {
        &mut self.faces[face.index()]
    }

    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Vec3 {
        self.faces[face.index()][(y * self.face_size + x) as usize]
    }

    pub fn set_texel(&mut self, face: CubeFace, x: u32, y: u32, radiance: Vec3) {
        let size = self.face_size;
        self.faces[face.index()][(y * size + x) as usize] = radiance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn face_bases_are_orthonormal() {
        for face in CubeFace::ALL {
            let (f, u, r) = (face.forward(), face.up(), face.right());
            assert_relative_eq!(f.dot(u), 0.0);
            assert_relative_eq!(f.dot(r), 0.0);
            assert_relative_eq!(u.dot(r), 0.0);
            assert_relative_eq!(r.length(), 1.0);
        }
    }

    #[test]
    fn centre_texel_looks_down_face_axis() {
        for face in CubeFace::ALL {
            let dir = face.ndc_direction(Vec2::ZERO);
            assert_relative_eq!(dir.dot(face.forward()), 1.0);
        }
    }

    #[test]
    fn texel_direction_matches_capture_camera() {
        // A texel's direction, pushed through that face's view-projection,
        // must land on the texel's own NDC position.
        let size = 8;
        let proj = CubeFace::projection(0.1, 10.0);
        for face in CubeFace::ALL {
            let view_proj = proj * face.view_matrix(Vec3::ZERO);
            for (x, y) in [(0, 0), (7, 0), (3, 5), (7, 7)] {
                let dir = face.texel_direction(x, y, size);
                let clip = view_proj * dir.extend(1.0);
                let ndc = clip.truncate() / clip.w;
                let expected = CubeFace::texel_ndc(x, y, size);
                assert_relative_eq!(ndc.x, expected.x, epsilon = 1e-4);
                assert_relative_eq!(ndc.y, expected.y, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn from_faces_rejects_short_face() {
        let mut faces: [Vec<Vec3>; 6] = std::array::from_fn(|_| vec![Vec3::ONE; 4]);
        faces[3].pop();
        assert!(matches!(
            CubemapFaces::from_faces(2, faces),
            Err(SolaceError::MalformedCubemap(_))
        ));
    }

    #[test]
    fn texel_access_is_row_major() {
        let mut faces = CubemapFaces::new(4);
        faces.set_texel(CubeFace::NegativeY, 1, 2, Vec3::X);
        assert_eq!(faces.face(CubeFace::NegativeY)[2 * 4 + 1], Vec3::X);
        assert_eq!(faces.texel(CubeFace::NegativeY, 1, 2), Vec3::X);
    }
}
