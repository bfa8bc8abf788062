//! Explicit lighting state handed to the shadow fitter and probe baker
//!
//! Replaces engine-wide globals (sun direction, bake settings): every call
//! that needs them takes a `&ProbeBakeContext`, so two renderers can bake side
//! by side and tests can build one on the stack.

use crate::shadows::CascadeConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use solace_core::{Result, SolaceError};

/// Default edge length, in texels, of each captured cube face.
pub const DEFAULT_FACE_SIZE: u32 = 16;
/// Default number of probe jobs executed per frame tick.
pub const DEFAULT_BAKE_BATCH_SIZE: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeBakeConfig {
    /// Edge length of each capture face. Fixes the SH integration weights.
    pub face_size: u32,
    /// Jobs processed per `bake_step` before control returns to the caller.
    pub bake_batch_size: u32,
}

impl Default for ProbeBakeConfig {
    fn default() -> Self {
        Self {
            face_size: DEFAULT_FACE_SIZE,
            bake_batch_size: DEFAULT_BAKE_BATCH_SIZE,
        }
    }
}

impl ProbeBakeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face_size(mut self, face_size: u32) -> Self {
        self.face_size = face_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.bake_batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.face_size == 0 {
            return Err(SolaceError::config("probe capture face size must be non-zero"));
        }
        if self.bake_batch_size == 0 {
            return Err(SolaceError::config("bake batch size must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeBakeContext {
    /// Direction the sunlight travels (from the sun towards the scene).
    pub sun_direction: Vec3,
    pub shadows: CascadeConfig,
    pub probes: ProbeBakeConfig,
}

impl Default for ProbeBakeContext {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(0.5, -1.0, 0.3).normalize(),
            shadows: CascadeConfig::default(),
            probes: ProbeBakeConfig::default(),
        }
    }
}

impl ProbeBakeContext {
    pub fn new(sun_direction: Vec3) -> Self {
        Self {
            sun_direction,
            ..Self::default()
        }
    }

    pub fn with_shadows(mut self, shadows: CascadeConfig) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn with_probes(mut self, probes: ProbeBakeConfig) -> Self {
        self.probes = probes;
        self
    }

    pub fn set_sun_direction(&mut self, direction: Vec3) {
        self.sun_direction = direction;
    }

    /// Normalized sun direction. Zero if the stored direction is degenerate.
    pub fn light_direction(&self) -> Vec3 {
        self.sun_direction.normalize_or_zero()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sun_direction.is_finite() || self.sun_direction.length_squared() == 0.0 {
            return Err(SolaceError::config(format!(
                "sun direction must be a finite non-zero vector, got {}",
                self.sun_direction
            )));
        }
        self.shadows.validate()?;
        self.probes.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_valid() {
        assert!(ProbeBakeContext::default().validate().is_ok());
    }

    #[test]
    fn zero_sun_direction_is_rejected() {
        let ctx = ProbeBakeContext::new(Vec3::ZERO);
        assert!(matches!(ctx.validate(), Err(SolaceError::InvalidConfiguration(_))));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let ctx = ProbeBakeContext::default().with_probes(ProbeBakeConfig::new().with_batch_size(0));
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let ctx: ProbeBakeContext =
            serde_json::from_str(r#"{ "probes": { "face_size": 32 } }"#).expect("valid json");

        assert_eq!(ctx.probes.face_size, 32);
        assert_eq!(ctx.probes.bake_batch_size, DEFAULT_BAKE_BATCH_SIZE);
        assert_eq!(ctx.shadows, CascadeConfig::default());
    }
}
