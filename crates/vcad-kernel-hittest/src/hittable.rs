//! The `HitTestable` capability and its line and point variants.

use tracing::trace;
use vcad_kernel_math::{Point3, Transform, Vec3};
use vcad_kernel_mesh::{LineGeometry3D, PointGeometry3D};

use crate::{HitPrimitive, HitTestContext, HitTestResult, ModelHandle, Ray};

/// Geometry that can be hit-tested with a world-space ray.
pub trait HitTestable {
    /// Test `ray_world` against this geometry placed by `model_matrix`.
    ///
    /// Appends at most one result (the closest hit) to `hits`, tagged with
    /// `source`, and returns whether it did. Existing entries in `hits`
    /// are left alone.
    fn hit_test(
        &self,
        ctx: &HitTestContext,
        model_matrix: &Transform,
        ray_world: &Ray,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool;
}

/// Closest approach between a ray and a segment.
///
/// Returns `(s, u)`: the ray parameter (`s >= 0`) and the segment
/// parameter (`0 <= u <= 1`) of the two closest points.
fn closest_ray_segment(ray: &Ray, a: &Point3, b: &Point3) -> Option<(f64, f64)> {
    let d1 = ray.direction;
    let d2 = b - a;
    let r = ray.origin - a;

    let dd = d1.dot(&d1);
    if !(dd > 0.0) {
        return None;
    }
    let c = d1.dot(&r);
    let e = d2.dot(&d2);

    if e <= 0.0 {
        return Some(((-c / dd).max(0.0), 0.0));
    }

    let f = d2.dot(&r);
    let bd = d1.dot(&d2);
    let denom = dd * e - bd * bd;

    // Parallel: any ray point will do, clamping below picks the right one
    let s = if denom > 0.0 {
        ((bd * f - c * e) / denom).max(0.0)
    } else {
        0.0
    };

    let u = (bd * s + f) / e;
    if u < 0.0 {
        Some(((-c / dd).max(0.0), 0.0))
    } else if u > 1.0 {
        Some((((bd - c) / dd).max(0.0), 1.0))
    } else {
        Some((s, u))
    }
}

/// Unit vector from `point` back toward the ray origin.
fn facing_normal(ray: &Ray, point: &Point3) -> Vec3 {
    (ray.origin - point)
        .try_normalize(0.0)
        .or_else(|| (-ray.direction).try_normalize(0.0))
        .unwrap_or_else(Vec3::zeros)
}

impl HitTestable for LineGeometry3D {
    fn hit_test(
        &self,
        ctx: &HitTestContext,
        model_matrix: &Transform,
        ray_world: &Ray,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let thickness = ctx.settings.line_hit_thickness;
        let mut best: Option<(f64, Point3, [u32; 2], usize)> = None;
        let mut best_distance = f64::INFINITY;

        for segment in self.segments() {
            let a = model_matrix.apply_point(&segment.p0);
            let b = model_matrix.apply_point(&segment.p1);
            let Some((s, u)) = closest_ray_segment(ray_world, &a, &b) else {
                continue;
            };

            let on_segment = a + u * (b - a);
            let gap = (ray_world.at(s) - on_segment).norm();
            if !(gap <= thickness) {
                continue;
            }

            let distance = (on_segment - ray_world.origin).norm();
            if distance > 0.0 && distance < best_distance {
                best_distance = distance;
                best = Some((distance, on_segment, segment.indices, segment.ordinal));
            }
        }

        let Some((distance, point, indices, ordinal)) = best else {
            trace!(segments = self.segment_count(), "line hit test missed");
            return false;
        };

        hits.push(HitTestResult::new(
            distance,
            point,
            facing_normal(ray_world, &point),
            source,
            HitPrimitive::Segment(indices),
            ordinal,
        ));
        true
    }
}

impl HitTestable for PointGeometry3D {
    fn hit_test(
        &self,
        ctx: &HitTestContext,
        model_matrix: &Transform,
        ray_world: &Ray,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let dd = ray_world.direction.dot(&ray_world.direction);
        if !(dd > 0.0) {
            return false;
        }

        let radius = ctx.settings.point_hit_radius;
        let mut best: Option<(f64, Point3, usize)> = None;
        let mut best_distance = f64::INFINITY;

        for (i, p) in self.positions().iter().enumerate() {
            let world = model_matrix.apply_point(p);
            let v = world - ray_world.origin;
            let s = v.dot(&ray_world.direction) / dd;
            if !(s > 0.0) {
                continue;
            }

            let gap = (v - s * ray_world.direction).norm();
            if !(gap <= radius) {
                continue;
            }

            let distance = v.norm();
            if distance > 0.0 && distance < best_distance {
                best_distance = distance;
                best = Some((distance, world, i));
            }
        }

        let Some((distance, point, i)) = best else {
            trace!(points = self.positions().len(), "point hit test missed");
            return false;
        };

        hits.push(HitTestResult::new(
            distance,
            point,
            facing_normal(ray_world, &point),
            source,
            HitPrimitive::Point(i as u32),
            i,
        ));
        true
    }
}
