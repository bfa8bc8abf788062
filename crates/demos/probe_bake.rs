//! Headless probe bake over an analytic outdoor scene.
//!
//! The "renderer" is a sky gradient above a flat ground plane. The ground is
//! lit by the sun and, from the second bounce on, by the probes themselves.
//!
//! Usage: `probe_bake [config.json]`, where the optional file holds a
//! `{ "context": ProbeBakeContext, "bake": BakeRequest }` object.

use glam::Vec3;
use serde::Deserialize;
use solace::prelude::*;
use std::f32::consts::PI;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    context: ProbeBakeContext,
    bake: BakeRequest,
}

struct OutdoorScene {
    face_size: u32,
    sun_direction: Vec3,
    sun_irradiance: Vec3,
    ground_height: f32,
    ground_albedo: Vec3,
}

impl OutdoorScene {
    fn sky(&self, dir: Vec3) -> Vec3 {
        let horizon = Vec3::new(0.75, 0.85, 1.0);
        let zenith = Vec3::new(0.25, 0.45, 0.9);
        horizon.lerp(zenith, dir.y.clamp(0.0, 1.0))
    }

    fn ground(&self, hit: Vec3, indirect: Option<&IndirectLighting<'_>>) -> Vec3 {
        let direct = self.sun_irradiance * (-self.sun_direction.y).max(0.0);
        let bounce = indirect
            .map(|grid| grid.sample_irradiance(hit, Vec3::Y))
            .unwrap_or(Vec3::ZERO);
        self.ground_albedo / PI * (direct + bounce)
    }
}

impl EnvironmentCapture for OutdoorScene {
    fn capture_environment(&mut self, position: Vec3, indirect: Option<&IndirectLighting<'_>>) -> CubemapFaces {
        let height = position.y - self.ground_height;
        CubemapFaces::from_fn(self.face_size, |_, dir| {
            if dir.y < 0.0 && height > 0.0 {
                let hit = position + dir * (height / -dir.y);
                self.ground(hit, indirect)
            } else {
                self.sky(dir)
            }
        })
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading bake configuration from {}", path);
            let text = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(DemoConfig {
            context: ProbeBakeContext::default(),
            bake: BakeRequest::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(8.0, 4.0, 8.0), 1.0, 3),
        }),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config()?;
    let mut lighting = LightingOrchestrator::new(config.context)?;
    let mut scene = OutdoorScene {
        face_size: lighting.context().probes.face_size,
        sun_direction: lighting.context().light_direction(),
        sun_irradiance: Vec3::new(3.0, 2.9, 2.6),
        ground_height: 0.0,
        ground_albedo: Vec3::new(0.45, 0.4, 0.35),
    };

    lighting.request_bake(&config.bake)?;

    let mut frame = 0u32;
    while lighting.is_baking() {
        let jobs = lighting.tick_bake(&mut scene)?;
        frame += 1;
        log::info!(
            "Frame {:4}: {} jobs, {:5.1}% baked",
            frame,
            jobs,
            lighting.baking_progress() * 100.0
        );
    }

    let grid = lighting
        .probe_grid()
        .ok_or("bake finished without a probe grid")?;
    println!("Baked {} probes ({}) in {} frames", grid.probe_count(), grid.dims(), frame);

    let center = config.bake.center;
    for (label, normal) in [("up", Vec3::Y), ("down", Vec3::NEG_Y), ("east", Vec3::X)] {
        let e = grid.sample_irradiance(center, normal);
        println!("Irradiance at {} facing {:>4}: ({:.3}, {:.3}, {:.3})", center, label, e.x, e.y, e.z);
    }
    Ok(())
}
