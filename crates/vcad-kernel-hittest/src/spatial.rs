//! Pluggable spatial acceleration for mesh hit-testing.

use std::fmt::Debug;
use std::sync::Arc;
use vcad_kernel_math::{Point3, Transform};

use crate::{HitTestContext, HitTestResult, ModelHandle, Ray};

/// An acceleration structure built over one mesh's triangles.
///
/// `query` answers the same question as the brute-force scan: given a
/// world-space ray and the mesh's model transform, append at most one
/// result (the closest valid hit by world distance) and report whether
/// one was appended. A non-invertible transform is a miss.
pub trait SpatialIndex: Send + Sync + Debug {
    /// Find the closest hit and push it to `hits`.
    fn query(
        &self,
        ctx: &HitTestContext,
        ray_world: &Ray,
        model_matrix: &Transform,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool;

    /// Number of triangles the index was built over.
    fn triangle_count(&self) -> usize;
}

/// Builds a [`SpatialIndex`] from mesh buffers.
///
/// The buffers are already validated: indices come in triples and every
/// index is in range. Implementations may panic on buffers that are not.
pub trait SpatialIndexBuilder: Send + Sync + Debug {
    /// Build an index over `indices.len() / 3` triangles.
    fn build(&self, positions: &[Point3], indices: &[u32]) -> Arc<dyn SpatialIndex>;
}
