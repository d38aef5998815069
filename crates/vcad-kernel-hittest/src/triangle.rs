//! Ray-triangle intersection (Möller-Trumbore).

use vcad_kernel_math::{Point3, Tolerance};

use crate::Ray;

/// Intersect a ray with the triangle `(p0, p1, p2)`.
///
/// Returns the ray parameter `t >= 0` at which `ray.at(t)` lies on the
/// triangle, edges and corners included. Rays parallel to the triangle's
/// plane and zero-area triangles report no hit rather than a NaN parameter.
/// The parallel test is relative to the direction and edge lengths, so
/// neither a short direction nor a small triangle changes the outcome.
#[inline]
pub fn intersect_triangle(ray: &Ray, p0: &Point3, p1: &Point3, p2: &Point3) -> Option<f64> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;

    let h = ray.direction.cross(&edge2);
    let det = edge1.dot(&h);

    // Also rejects NaN coordinates
    let scale = ray.direction.norm() * edge1.norm() * edge2.norm();
    if !(det.abs() > Tolerance::DEFAULT.parallel * scale) {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - p0;

    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_det * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(&q);
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}
