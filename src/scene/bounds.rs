use glam::{Affine3A, Vec3};

/// Axis-aligned box in the local space of its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// A box of the given full extents centered on the origin.
    #[must_use]
    pub fn from_size(size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// World-space AABB enclosing this box after `matrix`.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);
        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// A half-line: `origin + t * direction` for `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray; a zero direction falls back to −Z.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    #[inline]
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects the box of a node whose world matrix is `world`.
    ///
    /// The ray is carried into the node's local space, tested with the slab
    /// method, and the hit point carried back so the returned distance is in
    /// world units regardless of the node's scale.
    #[must_use]
    pub fn intersect_box(&self, bounds: &BoundingBox, world: &Affine3A) -> Option<(f32, Vec3)> {
        let inv = world.inverse();
        let local_origin = inv.transform_point3(self.origin);
        let local_dir = inv.transform_vector3(self.direction);
        let t = ray_aabb_hit_t(local_origin, local_dir, bounds.min, bounds.max)?;
        let point = world.transform_point3(local_origin + local_dir * t);
        Some((point.distance(self.origin), point))
    }
}

/// Slab-method ray–AABB intersection. Returns the entry parameter, or the
/// exit parameter when the origin is inside the box.
#[must_use]
pub fn ray_aabb_hit_t(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_box_in_front() {
        let t = ray_aabb_hit_t(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -4.0));
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn ray_misses_box_behind() {
        let t = ray_aabb_hit_t(Vec3::ZERO, Vec3::Z, Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -4.0));
        assert_eq!(t, None);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let t = ray_aabb_hit_t(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, None);
    }

    #[test]
    fn scaled_node_reports_world_distance() {
        let world = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -10.0),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let (distance, point) = ray.intersect_box(&BoundingBox::from_size(Vec3::ONE), &world).unwrap();
        // Scaled box spans z in [-11, -9].
        assert!((distance - 9.0).abs() < 1e-4);
        assert!((point.z + 9.0).abs() < 1e-4);
    }
}
