use approx::assert_relative_eq;
use glam::{Quat, Vec3, Vec4Swizzles};
use solace_core::Camera;
use solace_lighting::{compute_splits, CascadeConfig, CascadeFitter, CascadedShadowMaps, ProbeBakeContext};

fn sun() -> Vec3 {
    Vec3::new(0.4, -1.0, 0.25).normalize()
}

fn camera() -> Camera {
    Camera::new_perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 200.0)
}

#[test]
fn splits_are_strictly_increasing() {
    for lambda in [0.0, 0.5, 0.75, 0.95, 1.0] {
        let splits = compute_splits(0.1, 1000.0, 4, lambda);
        let mut previous = 0.1;
        for split in &splits {
            assert!(*split > previous, "lambda {}: {:?}", lambda, splits);
            previous = *split;
        }
        assert_eq!(splits[3], 1000.0);
    }
}

#[test]
fn stabilized_radius_ignores_camera_motion() {
    let fitter = CascadeFitter::new(CascadeConfig::default());
    let reference = fitter.fit_all(&camera(), sun());

    let moved = Camera {
        position: Vec3::new(120.0, 15.0, -64.0),
        rotation: Quat::from_euler(glam::EulerRot::YXZ, 1.1, -0.3, 0.05),
        ..camera()
    };
    let cascades = fitter.fit_all(&moved, sun());

    assert_eq!(cascades.len(), reference.len());
    for (a, b) in reference.iter().zip(cascades.iter()) {
        assert_relative_eq!(a.radius, b.radius, max_relative = 1e-3);
        assert_relative_eq!(a.texel_size, b.texel_size, max_relative = 1e-3);
        // Light-space footprint is the same cube.
        assert_relative_eq!(a.light_bounds.extents().x, b.light_bounds.extents().x, max_relative = 1e-3);
    }
}

#[test]
fn stabilized_translation_is_texel_aligned() {
    let fitter = CascadeFitter::new(CascadeConfig::default());
    let mut cam = camera();
    for step in 0..8 {
        cam.position = Vec3::new(step as f32 * 0.37, 2.0, step as f32 * -0.91);
        for cascade in fitter.fit_all(&cam, sun()) {
            for t in [cascade.light_view.w_axis.x, cascade.light_view.w_axis.y] {
                let texels = t / cascade.texel_size;
                assert!((texels - texels.round()).abs() < 1e-2, "{} texels", texels);
            }
        }
    }
}

#[test]
fn tight_fit_contains_slice_corners() {
    let config = CascadeConfig::new().with_stabilization(false);
    let fitter = CascadeFitter::new(config);
    let mut cam = camera().with_position(Vec3::new(3.0, 5.0, 10.0));
    cam.look_at(Vec3::new(0.0, 0.0, -20.0), Vec3::Y);

    let splits = fitter.compute_splits(cam.near_plane, cam.far_plane);
    let cascades = fitter.fit_all(&cam, sun());
    let mut near = cam.near_plane;
    for (cascade, far) in cascades.iter().zip(splits) {
        let corners = cam.frustum_slice(near, far);
        for corner in corners.points() {
            let clip = cascade.light_view_projection * corner.extend(1.0);
            let ndc = clip.xyz() / clip.w;
            assert!(ndc.x.abs() <= 1.0 + 1e-3 && ndc.y.abs() <= 1.0 + 1e-3, "{}", ndc);
            assert!(ndc.z >= -1e-3 && ndc.z <= 1.0 + 1e-3, "{}", ndc);
        }
        near = far;
    }
}

#[test]
fn overhead_sun_still_fits() {
    let fitter = CascadeFitter::new(CascadeConfig::default());
    for cascade in fitter.fit_all(&camera(), Vec3::NEG_Y) {
        assert!(cascade.light_view_projection.is_finite());
        assert!(cascade.radius > 0.0);
    }
}

#[test]
fn cascade_selection_by_depth() {
    let config = CascadeConfig::new().with_cascade_count(3).with_split_lambda(0.0);
    let ctx = ProbeBakeContext::default().with_shadows(config.clone());
    let mut shadows = CascadedShadowMaps::new(config).unwrap();
    let cam = Camera::new_perspective(1.0, 1.0, 1.0, 91.0);
    shadows.update(&ctx, &cam).unwrap();

    // Uniform splits at 31, 61, 91.
    let splits = shadows.cascade_splits();
    assert_relative_eq!(splits[0], 31.0, epsilon = 1e-4);
    assert_relative_eq!(splits[1], 61.0, epsilon = 1e-4);
    assert_eq!(splits[2], 91.0);
    assert_eq!(shadows.cascade_for_depth(5.0), Some(0));
    assert_eq!(shadows.cascade_for_depth(30.0), Some(0));
    assert_eq!(shadows.cascade_for_depth(45.0), Some(1));
    assert_eq!(shadows.cascade_for_depth(90.0), Some(2));
    assert_eq!(shadows.cascade_for_depth(120.0), None);
}

#[test]
fn context_change_refits_with_new_config() {
    let mut shadows = CascadedShadowMaps::new(CascadeConfig::default()).unwrap();
    let ctx = ProbeBakeContext::default().with_shadows(CascadeConfig::new().with_cascade_count(2));
    shadows.update(&ctx, &camera()).unwrap();

    assert_eq!(shadows.config().cascade_count, 2);
    assert_eq!(shadows.cascade_matrices().len(), 2);
}
