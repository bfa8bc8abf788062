//! Time-sliced multi-bounce probe baking
//!
//! A bake is `bounce_count` passes over every probe of the grid. Each job
//! captures the environment at one probe, projects it to SH and writes the
//! packed result into the front buffer. Bounces after the first hand the
//! capture the back buffer, which holds the previous bounce and is not
//! touched until the current bounce has written its last cell.
//!
//! [`ProbeGridBaker::bake_step`] runs at most `bake_batch_size` jobs and then
//! returns, so a render loop can spread a bake over many frames.

use crate::capture::EnvironmentCapture;
use crate::context::ProbeBakeContext;
use crate::probe_grid::{GridLayout, ProbeGrid};
use crate::sh::ShCoefficients;
use crate::sh_projector::ShProjector;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use solace_core::{Result, SolaceError};

/// Volume and bounce count of one bake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeRequest {
    pub center: Vec3,
    /// World-space extent of the probe volume.
    pub world_dims: Vec3,
    /// Spacing between neighbouring probes.
    pub distance: f32,
    pub bounce_count: u32,
}

impl Default for BakeRequest {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            world_dims: Vec3::splat(8.0),
            distance: 1.0,
            bounce_count: 2,
        }
    }
}

impl BakeRequest {
    pub fn new(center: Vec3, world_dims: Vec3, distance: f32, bounce_count: u32) -> Self {
        Self {
            center,
            world_dims,
            distance,
            bounce_count,
        }
    }

    /// Checks the request and returns the grid it describes.
    pub fn layout(&self) -> Result<GridLayout> {
        if self.bounce_count == 0 {
            return Err(SolaceError::config("bake needs at least one bounce"));
        }
        GridLayout::new(self.center, self.world_dims, self.distance)
    }
}

/// Where the baker is in its job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeState {
    Idle,
    Baking { bounce: u32, cell: usize },
}

#[derive(Debug)]
struct ActiveBake {
    grid: ProbeGrid,
    bounce: u32,
    cell: usize,
    bounce_count: u32,
}

#[derive(Debug, Default)]
pub struct ProbeGridBaker {
    active: Option<ActiveBake>,
    grid: Option<ProbeGrid>,
    projector: Option<ShProjector>,
    jobs_completed: u64,
    jobs_total: u64,
}

impl ProbeGridBaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new bake.
    ///
    /// Fails with [`SolaceError::BakeInProgress`] while a bake is running and
    /// with [`SolaceError::InvalidConfiguration`] for a degenerate request.
    /// Neither failure changes the baker's state. On success the previous
    /// grid is dropped.
    pub fn prepare_bake(&mut self, ctx: &ProbeBakeContext, request: &BakeRequest) -> Result<()> {
        if self.active.is_some() {
            log::warn!("Ignoring bake request: a bake is already in progress");
            return Err(SolaceError::BakeInProgress);
        }

        let layout = ctx
            .probes
            .validate()
            .and_then(|_| request.layout())
            .map_err(|e| {
                log::error!("Rejected bake request: {}", e);
                e
            })?;

        let face_size = ctx.probes.face_size;
        let projector = match self.projector.take() {
            Some(projector) if projector.face_size() == face_size => projector,
            _ => ShProjector::new(face_size)?,
        };
        self.projector = Some(projector);

        let probe_count = layout.probe_count();
        self.grid = None;
        self.jobs_completed = 0;
        self.jobs_total = probe_count as u64 * u64::from(request.bounce_count);
        self.active = Some(ActiveBake {
            grid: ProbeGrid::new(layout),
            bounce: 0,
            cell: 0,
            bounce_count: request.bounce_count,
        });

        log::info!(
            "Baking {} probes ({}x{}x{}), {} bounce(s), {} jobs",
            probe_count,
            layout.dims().x,
            layout.dims().y,
            layout.dims().z,
            request.bounce_count,
            self.jobs_total
        );
        Ok(())
    }

    /// Runs up to `bake_batch_size` jobs and returns how many ran.
    ///
    /// Does nothing when idle. If a capture cannot be projected the bake is
    /// discarded and the error returned; the baker is idle afterwards with no
    /// grid.
    pub fn bake_step<C>(&mut self, ctx: &ProbeBakeContext, capture: &mut C) -> Result<usize>
    where
        C: EnvironmentCapture + ?Sized,
    {
        let Some(projector) = self.projector.as_ref() else {
            return Ok(0);
        };
        let Some(mut bake) = self.active.take() else {
            return Ok(0);
        };

        let batch = ctx.probes.bake_batch_size.max(1) as usize;
        let probe_count = bake.grid.probe_count();
        let mut executed = 0;

        while executed < batch {
            let position = bake.grid.layout().world_position(bake.grid.layout().cell_index(bake.cell));
            let faces = if bake.bounce == 0 {
                capture.capture_environment(position, None)
            } else {
                let indirect = bake.grid.indirect();
                capture.capture_environment(position, Some(&indirect))
            };

            let coefficients = match projector.project(&faces) {
                Ok(coefficients) => coefficients,
                Err(e) => {
                    log::error!(
                        "Aborting bake at bounce {} cell {}: {}",
                        bake.bounce,
                        bake.cell,
                        e
                    );
                    self.jobs_completed = 0;
                    self.jobs_total = 0;
                    return Err(e);
                }
            };

            bake.grid.write_front(bake.cell, &coefficients.pack());
            bake.cell += 1;
            executed += 1;
            self.jobs_completed += 1;

            if bake.cell == probe_count {
                bake.grid.swap_after_bounce();
                bake.bounce += 1;
                bake.cell = 0;
                log::debug!("Finished bounce {}/{}", bake.bounce, bake.bounce_count);

                if bake.bounce == bake.bounce_count {
                    log::info!("Probe bake complete ({} jobs)", self.jobs_completed);
                    self.grid = Some(bake.grid);
                    return Ok(executed);
                }
            }
        }

        log::debug!(
            "Bake batch: {} jobs, progress {:.1}%",
            executed,
            self.baking_progress() * 100.0
        );
        self.active = Some(bake);
        Ok(executed)
    }

    /// Runs batches until the bake finishes. Returns the total job count.
    pub fn bake_to_completion<C>(&mut self, ctx: &ProbeBakeContext, capture: &mut C) -> Result<u64>
    where
        C: EnvironmentCapture + ?Sized,
    {
        let mut total = 0;
        while self.is_baking() {
            total += self.bake_step(ctx, &mut *capture)? as u64;
        }
        Ok(total)
    }

    pub fn is_baking(&self) -> bool {
        self.active.is_some()
    }

    /// Fraction of all jobs of the current or last bake that have run.
    pub fn baking_progress(&self) -> f64 {
        if self.jobs_total == 0 {
            0.0
        } else {
            self.jobs_completed as f64 / self.jobs_total as f64
        }
    }

    pub fn state(&self) -> BakeState {
        match &self.active {
            Some(bake) => BakeState::Baking {
                bounce: bake.bounce,
                cell: bake.cell,
            },
            None => BakeState::Idle,
        }
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed
    }

    pub fn jobs_total(&self) -> u64 {
        self.jobs_total
    }

    /// The finished grid. `None` while baking or before the first bake.
    pub fn grid(&self) -> Option<&ProbeGrid> {
        self.grid.as_ref()
    }

    pub fn sample_coefficients(&self, world_position: Vec3) -> Option<ShCoefficients> {
        self.grid.as_ref().map(|grid| grid.sample_coefficients(world_position))
    }

    pub fn sample_irradiance(&self, world_position: Vec3, normal: Vec3) -> Option<Vec3> {
        self.grid
            .as_ref()
            .map(|grid| grid.sample_irradiance(world_position, normal))
    }
}
