//! Ray representation and ray-box tests.

use vcad_kernel_math::{Point3, Transform, Vec3};
use vcad_kernel_mesh::Aabb3;

/// A ray defined by origin and direction.
///
/// The direction is not normalized: ray parameters are measured in units
/// of the direction vector's own length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Direction of travel.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray from origin and direction.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }

    /// Map the ray through `transform`: the origin as a point, the
    /// direction as a vector (no translation).
    pub fn transformed(&self, transform: &Transform) -> Ray {
        Ray {
            origin: transform.apply_point(&self.origin),
            direction: transform.apply_vec(&self.direction),
        }
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` with `t_min` clamped to zero when the
    /// ray enters the box at a non-negative parameter or starts inside it.
    /// Empty boxes never intersect.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        if aabb.is_empty() {
            return None;
        }

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let inv = 1.0 / self.direction[axis];
            let t1 = (aabb.min[axis] - self.origin[axis]) * inv;
            let t2 = (aabb.max[axis] - self.origin[axis]) * inv;
            // NaN (origin on a zero-width slab, parallel ray) leaves the bounds untouched
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }
}

/// Anything that can cheaply reject rays before a detailed test.
pub trait BoundingVolume {
    /// True if the ray may hit something inside the volume.
    fn intersects(&self, ray: &Ray) -> bool;
}

impl BoundingVolume for Aabb3 {
    fn intersects(&self, ray: &Ray) -> bool {
        ray.intersect_aabb(self).is_some()
    }
}
