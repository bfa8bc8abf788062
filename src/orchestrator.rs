use solace_core::{Camera, Result};
use solace_lighting::{
    BakeRequest, CascadedShadowMaps, EnvironmentCapture, ProbeBakeContext, ProbeGrid, ProbeGridBaker,
};

/// Per-frame driver for shadows and probe baking.
///
/// Call [`begin_frame`](Self::begin_frame) once per frame before the shadow
/// pass, and [`tick_bake`](Self::tick_bake) once per frame while a bake is
/// running.
pub struct LightingOrchestrator {
    context: ProbeBakeContext,
    shadows: CascadedShadowMaps,
    baker: ProbeGridBaker,
}

impl LightingOrchestrator {
    pub fn new(context: ProbeBakeContext) -> Result<Self> {
        context.validate()?;
        let shadows = CascadedShadowMaps::new(context.shadows.clone())?;
        Ok(Self {
            context,
            shadows,
            baker: ProbeGridBaker::new(),
        })
    }

    pub fn context(&self) -> &ProbeBakeContext {
        &self.context
    }

    /// Edits take effect on the next `begin_frame` / `request_bake`.
    pub fn context_mut(&mut self) -> &mut ProbeBakeContext {
        &mut self.context
    }

    pub fn shadows(&self) -> &CascadedShadowMaps {
        &self.shadows
    }

    pub fn baker(&self) -> &ProbeGridBaker {
        &self.baker
    }

    /// Refits the shadow cascades for this frame's camera.
    pub fn begin_frame(&mut self, camera: &Camera) -> Result<()> {
        self.shadows.update(&self.context, camera)
    }

    pub fn request_bake(&mut self, request: &BakeRequest) -> Result<()> {
        self.baker.prepare_bake(&self.context, request)
    }

    /// Runs one batch of the active bake. Returns the number of jobs run.
    pub fn tick_bake<C>(&mut self, capture: &mut C) -> Result<usize>
    where
        C: EnvironmentCapture + ?Sized,
    {
        self.baker.bake_step(&self.context, capture)
    }

    pub fn is_baking(&self) -> bool {
        self.baker.is_baking()
    }

    pub fn baking_progress(&self) -> f64 {
        self.baker.baking_progress()
    }

    pub fn probe_grid(&self) -> Option<&ProbeGrid> {
        self.baker.grid()
    }
}
