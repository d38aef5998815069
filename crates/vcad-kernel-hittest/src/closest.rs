//! Closest-hit selection shared by the brute-force scan and spatial indices.

use tracing::debug;
use vcad_kernel_math::{Point3, Transform, Vec3};
use vcad_kernel_mesh::Triangle;

use crate::triangle::intersect_triangle;
use crate::{HitPrimitive, HitTestResult, ModelHandle, Ray};

/// Running best triangle hit for one world-space ray against one mesh.
///
/// Triangles are intersected in model space; candidates are ranked by the
/// world-space distance from the world ray origin, so non-uniform scale
/// in the model transform cannot reorder them.
#[derive(Debug)]
pub struct ClosestHit<'a> {
    model_matrix: &'a Transform,
    ray_world: &'a Ray,
    ray_model: Ray,
    best: Option<Candidate>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    t: f64,
    distance: f64,
    point_world: Point3,
    triangle: Triangle,
}

impl<'a> ClosestHit<'a> {
    /// Start a search, or `None` when `model_matrix` cannot be inverted.
    pub fn begin(model_matrix: &'a Transform, ray_world: &'a Ray) -> Option<Self> {
        let Some(inverse) = model_matrix.inverse() else {
            debug!(
                determinant = model_matrix.determinant(),
                "model matrix not invertible, skipping hit test"
            );
            return None;
        };
        Some(Self {
            model_matrix,
            ray_world,
            ray_model: ray_world.transformed(&inverse),
            best: None,
        })
    }

    /// The query ray in model space.
    pub fn ray_model(&self) -> &Ray {
        &self.ray_model
    }

    /// Model-space ray parameter of the current best hit, or infinity.
    pub fn best_t(&self) -> f64 {
        self.best.map_or(f64::INFINITY, |c| c.t)
    }

    /// Intersect `triangle` and keep it if it is strictly nearer than the
    /// current best. A tie keeps whichever triangle comes first in the
    /// index buffer, so visiting order does not matter.
    pub fn offer(&mut self, triangle: &Triangle) -> bool {
        let Some(t) = intersect_triangle(&self.ray_model, &triangle.p0, &triangle.p1, &triangle.p2)
        else {
            return false;
        };

        let point_world = self.model_matrix.apply_point(&self.ray_model.at(t));
        let distance = (point_world - self.ray_world.origin).norm();

        let accept = match &self.best {
            None => distance > 0.0 && distance < f64::INFINITY,
            Some(best) => {
                distance > 0.0
                    && (distance < best.distance
                        || (distance == best.distance && triangle.ordinal < best.triangle.ordinal))
            }
        };

        if accept {
            self.best = Some(Candidate {
                t,
                distance,
                point_world,
                triangle: *triangle,
            });
        }
        accept
    }

    /// Push the best hit, if any, to `hits`.
    pub fn finish(self, source: ModelHandle, hits: &mut Vec<HitTestResult>) -> bool {
        let Some(best) = self.best else {
            return false;
        };

        let tri = &best.triangle;
        let world = Triangle {
            p0: self.model_matrix.apply_point(&tri.p0),
            p1: self.model_matrix.apply_point(&tri.p1),
            p2: self.model_matrix.apply_point(&tri.p2),
            ..*tri
        };
        let normal = world_normal(&world, &self.ray_world.direction);

        hits.push(HitTestResult::new(
            best.distance,
            best.point_world,
            normal,
            source,
            HitPrimitive::Triangle(tri.indices),
            tri.ordinal,
        ));
        true
    }
}

/// Unit face normal of a world-space triangle.
///
/// Falls back to facing the ray when the transformed triangle has no area
/// left to define one.
fn world_normal(world: &Triangle, ray_direction: &Vec3) -> Vec3 {
    world
        .normal_unnormalized()
        .try_normalize(0.0)
        .or_else(|| (-ray_direction).try_normalize(0.0))
        .unwrap_or_else(Vec3::zeros)
}
