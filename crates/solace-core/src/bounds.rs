use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for &point in points {
            min = min.min(point);
            max = max.max(point);
        }

        Self { min, max }
    }

    /// Bounds of `points` after transforming each one by `matrix`.
    pub fn from_transformed_points(points: &[Vec3], matrix: &Mat4) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for &point in points {
            let p = matrix.transform_point3(point);
            min = min.min(p);
            max = max.max(p);
        }

        Self { min, max }
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centred on the arithmetic mean of `points`, just large enough to
    /// contain all of them.
    ///
    /// Not the minimal enclosing sphere. The centroid is what the stabilized
    /// shadow fit uses, and its radius only depends on the shape of the point
    /// set, so it survives rigid motion of the set unchanged.
    pub fn enclosing_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::new(Vec3::ZERO, 0.0);
        }

        let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);

        Self { center, radius }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_from_points_covers_all() {
        let points = [
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-4.0, 5.0, 0.5),
            Vec3::new(0.0, 0.0, -6.0),
        ];
        let aabb = Aabb::from_points(&points);

        assert_eq!(aabb.min, Vec3::new(-4.0, -2.0, -6.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
        for p in points {
            assert!(aabb.contains_point(p));
        }
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let points = [Vec3::ZERO, Vec3::ONE];
        let aabb = Aabb::from_transformed_points(&points, &Mat4::from_translation(Vec3::X * 10.0));

        assert_eq!(aabb.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn enclosing_sphere_uses_centroid() {
        let points = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
        ];
        let sphere = Sphere::enclosing_points(&points);

        assert_relative_eq!(sphere.center.length(), 0.0);
        assert_relative_eq!(sphere.radius, 2.0);
        for p in points {
            assert!(sphere.contains_point(p));
        }
    }

    #[test]
    fn enclosing_sphere_of_nothing_is_empty() {
        let sphere = Sphere::enclosing_points(&[]);
        assert_eq!(sphere.radius, 0.0);
    }
}
