//! Cubemap to SH projection
//!
//! Integrates a captured environment over the sphere. Texels near face
//! corners subtend less solid angle than centre texels, so each sample is
//! weighted by `4 / (1 + u² + v²)^(3/2)`. The weighted sum is normalized by
//! `4π / Σw`, which makes the discrete sum approximate the sphere integral.
//!
//! The weights and per-texel basis values only depend on the face size, so
//! they are tabulated once in a [`SolidAngleTable`] and shared by every probe
//! and every bounce of a bake.

use crate::sh::{sh_basis, ShCoefficients, SH_COEFFICIENT_COUNT};
use glam::Vec3;
use solace_core::{CubeFace, CubemapFaces, Result, SolaceError};

/// Solid-angle weights and SH basis values for one face resolution.
#[derive(Debug, Clone)]
pub struct SolidAngleTable {
    face_size: u32,
    /// Per-texel weight, identical for all six faces.
    weights: Vec<f32>,
    /// Basis values per (face, texel), face-major.
    basis: Vec<[f32; SH_COEFFICIENT_COUNT]>,
    weight_sum: f32,
    normalization: f32,
}

impl SolidAngleTable {
    pub fn new(face_size: u32) -> Result<Self> {
        if face_size == 0 {
            return Err(SolaceError::config("cubemap face size must be non-zero"));
        }

        let texels = (face_size * face_size) as usize;
        let mut weights = Vec::with_capacity(texels);
        for y in 0..face_size {
            for x in 0..face_size {
                let ndc = CubeFace::texel_ndc(x, y, face_size);
                weights.push(texel_weight(ndc.x, ndc.y));
            }
        }

        let mut basis = Vec::with_capacity(texels * 6);
        let mut weight_sum = 0.0_f32;
        for face in CubeFace::ALL {
            for y in 0..face_size {
                for x in 0..face_size {
                    basis.push(sh_basis(face.texel_direction(x, y, face_size)));
                    weight_sum += weights[(y * face_size + x) as usize];
                }
            }
        }
        debug_assert!(weight_sum > 0.0);

        Ok(Self {
            face_size,
            weights,
            basis,
            weight_sum,
            normalization: 4.0 * std::f32::consts::PI / weight_sum,
        })
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    /// Sum of all texel weights over the six faces.
    pub fn weight_sum(&self) -> f32 {
        self.weight_sum
    }

    /// `4π / weight_sum`.
    pub fn normalization(&self) -> f32 {
        self.normalization
    }

    pub fn weight(&self, x: u32, y: u32) -> f32 {
        self.weights[(y * self.face_size + x) as usize]
    }
}

/// Differential solid-angle weight of a texel at NDC `(u, v)`.
pub fn texel_weight(u: f32, v: f32) -> f32 {
    let d = (1.0 + u * u + v * v).sqrt();
    4.0 / (d * d * d)
}

/// Projects captures of one fixed face size.
#[derive(Debug, Clone)]
pub struct ShProjector {
    table: SolidAngleTable,
}

impl ShProjector {
    pub fn new(face_size: u32) -> Result<Self> {
        Ok(Self {
            table: SolidAngleTable::new(face_size)?,
        })
    }

    pub fn face_size(&self) -> u32 {
        self.table.face_size
    }

    pub fn table(&self) -> &SolidAngleTable {
        &self.table
    }

    pub fn project(&self, faces: &CubemapFaces) -> Result<ShCoefficients> {
        let size = self.table.face_size;
        if faces.face_size() != size {
            return Err(SolaceError::FaceSizeMismatch {
                expected: size,
                actual: faces.face_size(),
            });
        }

        let texels = (size * size) as usize;
        let mut coefficients = [Vec3::ZERO; SH_COEFFICIENT_COUNT];
        for face in CubeFace::ALL {
            let radiance = faces.face(face);
            let basis = &self.table.basis[face.index() * texels..(face.index() + 1) * texels];
            for ((&l, &w), b) in radiance.iter().zip(self.table.weights.iter()).zip(basis.iter()) {
                for (c, &y) in coefficients.iter_mut().zip(b.iter()) {
                    *c += l * (w * y);
                }
            }
        }

        Ok(ShCoefficients::new(coefficients).scale(self.table.normalization))
    }
}

/// One-off projection; builds a table for the capture's face size.
pub fn project_cubemap(faces: &CubemapFaces) -> Result<ShCoefficients> {
    ShProjector::new(faces.face_size())?.project(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centre_texels_outweigh_corners() {
        let table = SolidAngleTable::new(8).unwrap();
        assert!(table.weight(3, 3) > table.weight(0, 0));
        assert_eq!(table.weight(0, 0), table.weight(7, 7));
    }

    #[test]
    fn weight_at_face_centre_is_four() {
        assert_relative_eq!(texel_weight(0.0, 0.0), 4.0);
        assert_relative_eq!(texel_weight(1.0, 1.0), 4.0 / 3.0_f32.powf(1.5), epsilon = 1e-6);
    }

    #[test]
    fn normalization_approaches_texel_area() {
        // Each weight is 4 / texel_area times the texel's solid angle, so Σw
        // approaches 16π / texel_area and 4π / Σw approaches texel_area / 4.
        let size = 64;
        let table = SolidAngleTable::new(size).unwrap();
        let texel_area = (2.0 / size as f32).powi(2);
        assert_relative_eq!(table.normalization(), texel_area / 4.0, max_relative = 1e-2);
    }

    #[test]
    fn rejects_zero_face_size() {
        assert!(SolidAngleTable::new(0).is_err());
    }

    #[test]
    fn rejects_mismatched_capture() {
        let projector = ShProjector::new(4).unwrap();
        let err = projector.project(&CubemapFaces::new(8)).unwrap_err();
        assert_eq!(err, SolaceError::FaceSizeMismatch { expected: 4, actual: 8 });
    }
}
