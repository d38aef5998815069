//! Hit records produced by hit-testing.

use std::cmp::Ordering;
use vcad_kernel_math::{Point3, Vec3};

/// Opaque identity of the object that owns the tested geometry.
///
/// Carried through to [`HitTestResult::model_hit`] untouched; hit-testing
/// never dereferences or owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelHandle(pub u64);

/// The primitive that produced a hit, by its index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPrimitive {
    /// Triangle `(indices[i], indices[i + 1], indices[i + 2])`.
    Triangle([u32; 3]),
    /// Line segment `(indices[i], indices[i + 1])`.
    Segment([u32; 2]),
    /// Point by position index.
    Point(u32),
}

/// A single validated ray hit, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    is_valid: bool,
    distance: f64,
    point_hit: Point3,
    normal_at_hit: Vec3,
    model_hit: ModelHandle,
    primitive: HitPrimitive,
    tag: usize,
}

impl HitTestResult {
    /// Build a hit record.
    ///
    /// `distance` is the world-space distance from the query ray's origin
    /// to `point_hit`; the record is valid only when it is finite and positive.
    pub fn new(
        distance: f64,
        point_hit: Point3,
        normal_at_hit: Vec3,
        model_hit: ModelHandle,
        primitive: HitPrimitive,
        tag: usize,
    ) -> Self {
        Self {
            is_valid: distance.is_finite() && distance > 0.0,
            distance,
            point_hit,
            normal_at_hit,
            model_hit,
            primitive,
            tag,
        }
    }

    /// True for genuine intersections.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// World-space distance from the ray origin to the hit point.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// World-space hit position.
    pub fn point_hit(&self) -> Point3 {
        self.point_hit
    }

    /// World-space unit normal at the hit.
    pub fn normal_at_hit(&self) -> Vec3 {
        self.normal_at_hit
    }

    /// Owner of the hit geometry.
    pub fn model_hit(&self) -> ModelHandle {
        self.model_hit
    }

    /// The primitive that was hit.
    pub fn primitive(&self) -> HitPrimitive {
        self.primitive
    }

    /// Index values of the hit triangle, for mesh hits.
    pub fn triangle_indices(&self) -> Option<[u32; 3]> {
        match self.primitive {
            HitPrimitive::Triangle(indices) => Some(indices),
            _ => None,
        }
    }

    /// Ordinal of the hit primitive within its geometry.
    pub fn tag(&self) -> usize {
        self.tag
    }

    /// Order two hits by distance (nearest first).
    pub fn cmp_by_distance(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

/// Sort hits gathered from several geometries, nearest first.
///
/// Stable, so hits at equal distance keep their gathering order.
pub fn sort_by_distance(hits: &mut [HitTestResult]) {
    hits.sort_by(HitTestResult::cmp_by_distance);
}
