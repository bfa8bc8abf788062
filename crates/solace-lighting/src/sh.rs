//! Third-order (bands 0-2) real spherical harmonics

use glam::Vec3;
use std::ops::{Add, AddAssign, Mul};

pub const SH_COEFFICIENT_COUNT: usize = 9;
/// RGBA texels needed to store one probe's coefficients.
pub const PACKED_TEXEL_COUNT: usize = 7;

/// One probe's coefficients as seven RGBA texels.
pub type PackedSh = [[f32; 4]; PACKED_TEXEL_COUNT];

const Y00: f32 = 0.282095;
const Y1: f32 = 0.488603;
const Y2: f32 = 1.092548;
const Y20: f32 = 0.315392;
const Y22: f32 = 0.546274;

// Cosine-lobe convolution factors per band.
const A0: f32 = std::f32::consts::PI;
const A1: f32 = 2.0 * std::f32::consts::PI / 3.0;
const A2: f32 = std::f32::consts::PI / 4.0;

/// Evaluates the 9 basis functions for a unit direction.
pub fn sh_basis(direction: Vec3) -> [f32; SH_COEFFICIENT_COUNT] {
    let Vec3 { x, y, z } = direction;
    [
        Y00,
        Y1 * y,
        Y1 * z,
        Y1 * x,
        Y2 * x * y,
        Y2 * y * z,
        Y20 * (3.0 * z * z - 1.0),
        Y2 * x * z,
        Y22 * (x * x - y * y),
    ]
}

/// 9 RGB coefficients of an SH radiance approximation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShCoefficients {
    pub coefficients: [Vec3; SH_COEFFICIENT_COUNT],
}

impl ShCoefficients {
    pub const ZERO: Self = Self {
        coefficients: [Vec3::ZERO; SH_COEFFICIENT_COUNT],
    };

    pub fn new(coefficients: [Vec3; SH_COEFFICIENT_COUNT]) -> Self {
        Self { coefficients }
    }

    pub fn dc(&self) -> Vec3 {
        self.coefficients[0]
    }

    /// Reconstructed radiance arriving from `direction`.
    pub fn evaluate(&self, direction: Vec3) -> Vec3 {
        let basis = sh_basis(direction);
        self.coefficients
            .iter()
            .zip(basis.iter())
            .fold(Vec3::ZERO, |acc, (c, b)| acc + *c * *b)
    }

    /// Irradiance on a surface with the given unit normal.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let b = sh_basis(normal);
        let c = &self.coefficients;
        A0 * c[0] * b[0]
            + A1 * (c[1] * b[1] + c[2] * b[2] + c[3] * b[3])
            + A2 * (c[4] * b[4] + c[5] * b[5] + c[6] * b[6] + c[7] * b[7] + c[8] * b[8])
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self {
            coefficients: self.coefficients.map(|c| c * factor),
        }
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = *self;
        for (a, b) in out.coefficients.iter_mut().zip(other.coefficients.iter()) {
            *a = a.lerp(*b, t);
        }
        out
    }

    /// Seven texels: texel `i` holds coefficient `i` in RGB. The alpha
    /// channels carry coefficients 7 and 8 (`c7.r, c7.g, c7.b, c8.r, c8.g,
    /// c8.b`); the last alpha is unused.
    pub fn pack(&self) -> PackedSh {
        let c = &self.coefficients;
        let spare = [c[7].x, c[7].y, c[7].z, c[8].x, c[8].y, c[8].z, 0.0];
        std::array::from_fn(|i| [c[i].x, c[i].y, c[i].z, spare[i]])
    }

    pub fn unpack(packed: &PackedSh) -> Self {
        let mut coefficients = [Vec3::ZERO; SH_COEFFICIENT_COUNT];
        for (coefficient, texel) in coefficients.iter_mut().zip(packed.iter()) {
            *coefficient = Vec3::new(texel[0], texel[1], texel[2]);
        }
        coefficients[7] = Vec3::new(packed[0][3], packed[1][3], packed[2][3]);
        coefficients[8] = Vec3::new(packed[3][3], packed[4][3], packed[5][3]);
        Self { coefficients }
    }
}

impl Add for ShCoefficients {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for ShCoefficients {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.coefficients.iter_mut().zip(rhs.coefficients.iter()) {
            *a += *b;
        }
    }
}

impl Mul<f32> for ShCoefficients {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> ShCoefficients {
        ShCoefficients::new(std::array::from_fn(|i| {
            Vec3::new(i as f32, 10.0 + i as f32, -(i as f32) * 0.5)
        }))
    }

    #[test]
    fn band_zero_is_constant() {
        for dir in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, 1.0).normalize()] {
            assert_eq!(sh_basis(dir)[0], Y00);
        }
    }

    #[test]
    fn basis_matches_known_values() {
        let b = sh_basis(Vec3::Z);
        assert_relative_eq!(b[2], Y1);
        assert_relative_eq!(b[6], 2.0 * Y20);
        assert_eq!(b[1], 0.0);
        assert_eq!(b[8], 0.0);
    }

    #[test]
    fn pack_layout_puts_leftovers_in_alpha() {
        let c = sample();
        let packed = c.pack();

        assert_eq!(packed[0], [0.0, 10.0, -0.0, 7.0]);
        assert_eq!(packed[3][3], c.coefficients[8].x);
        assert_eq!(packed[5][3], c.coefficients[8].z);
        assert_eq!(packed[6][3], 0.0);
        assert_eq!(ShCoefficients::unpack(&packed), c);
    }

    #[test]
    fn constant_radiance_reconstructs() {
        let mut c = ShCoefficients::ZERO;
        c.coefficients[0] = Vec3::splat(2.0 / Y00);

        assert_relative_eq!(c.evaluate(Vec3::Y).x, 2.0, epsilon = 1e-5);
        // Irradiance from uniform radiance L is pi * L.
        assert_relative_eq!(c.irradiance(Vec3::X).y, 2.0 * std::f32::consts::PI, epsilon = 1e-4);
    }

    #[test]
    fn lerp_and_add_are_componentwise() {
        let a = sample();
        let b = a.scale(3.0);

        assert_eq!(a.lerp(&b, 0.5), a * 2.0);
        assert_eq!(a + a, a * 2.0);
    }
}
