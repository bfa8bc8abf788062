//! Prints cascade splits and light matrices for a camera orbiting the origin.
//!
//! With stabilization on, each cascade's radius and texel size stay fixed
//! from frame to frame while the camera moves.

use glam::Vec3;
use solace::prelude::*;

const FRAMES: u32 = 8;
const ORBIT_RADIUS: f32 = 25.0;

fn orbit_camera(frame: u32) -> Camera {
    let angle = frame as f32 / FRAMES as f32 * std::f32::consts::TAU;
    let mut camera = Camera::new_perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 300.0)
        .with_position(Vec3::new(angle.cos() * ORBIT_RADIUS, 6.0, angle.sin() * ORBIT_RADIUS));
    camera.look_at(Vec3::ZERO, Vec3::Y);
    camera
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let context = ProbeBakeContext::new(Vec3::new(0.3, -1.0, 0.45));
    let mut lighting = LightingOrchestrator::new(context)?;

    for frame in 0..FRAMES {
        let camera = orbit_camera(frame);
        lighting.begin_frame(&camera)?;

        let shadows = lighting.shadows();
        println!("frame {} camera {}", frame, camera.position);
        println!("  splits {:?}", shadows.cascade_splits().as_slice());
        for cascade in shadows.cascades() {
            println!(
                "  cascade {} [{:7.2}, {:7.2}] radius {:8.3} texel {:.5}",
                cascade.index, cascade.near_distance, cascade.far_distance, cascade.radius, cascade.texel_size
            );
            log::debug!("    light view-projection {:?}", cascade.light_view_projection);
        }
    }

    let uniforms = lighting.shadows().uniforms();
    println!(
        "uniform block: {} cascades, bias {}, normal bias {}",
        uniforms.cascade_count, uniforms.bias, uniforms.normal_bias
    );
    Ok(())
}
