//! Bounding Volume Hierarchy over mesh triangles.
//!
//! Uses Surface Area Heuristic (SAH) for construction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use vcad_kernel_math::{Point3, Tolerance, Transform};
use vcad_kernel_mesh::{Aabb3, Triangle};

use crate::error::{HitTestError, Result};
use crate::{
    ClosestHit, HitTestContext, HitTestResult, ModelHandle, Ray, SpatialIndex, SpatialIndexBuilder,
};

/// BVH construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhParams {
    /// Nodes with at most this many triangles become leaves.
    pub max_leaf_triangles: usize,
    /// Number of SAH buckets per axis.
    pub bucket_count: usize,
    /// Cost of visiting an internal node, relative to one triangle test.
    pub traversal_cost: f64,
    /// Triangle count from which triangle bounds are computed in parallel.
    pub parallel_threshold: usize,
}

impl Default for BvhParams {
    fn default() -> Self {
        Self {
            max_leaf_triangles: 4,
            bucket_count: 12,
            traversal_cost: 0.125,
            parallel_threshold: 4096,
        }
    }
}

impl BvhParams {
    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_triangles == 0 {
            return Err(HitTestError::InvalidSettings(
                "max_leaf_triangles must be at least 1".into(),
            ));
        }
        if self.bucket_count < 2 {
            return Err(HitTestError::InvalidSettings(
                "bucket_count must be at least 2".into(),
            ));
        }
        if !(self.traversal_cost.is_finite() && self.traversal_cost >= 0.0) {
            return Err(HitTestError::InvalidSettings(
                "traversal_cost must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Parse parameters from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }
}

impl SpatialIndexBuilder for BvhParams {
    fn build(&self, positions: &[Point3], indices: &[u32]) -> Arc<dyn SpatialIndex> {
        Arc::new(Bvh::build(positions, indices, self))
    }
}

/// A BVH node - either a leaf holding triangles or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node.
    Leaf {
        /// Bounds of the leaf's triangles.
        aabb: Aabb3,
        /// Triangle ordinals (position in the index buffer divided by 3).
        triangles: Vec<u32>,
    },
    /// Internal node with two children.
    Internal {
        /// Bounds of both children.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounds of this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Shape of a built hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    /// Total node count, leaves included.
    pub nodes: usize,
    /// Leaf count.
    pub leaves: usize,
    /// Length of the longest root-to-leaf path, counting both ends.
    pub depth: usize,
}

/// Bounding Volume Hierarchy for accelerated ray-mesh intersection.
///
/// Holds its own copy of the mesh buffers, so it stays consistent with
/// the geometry it was built from even if that geometry later changes.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    positions: Vec<Point3>,
    indices: Vec<u32>,
}

/// Per-triangle build input: ordinal, bounds, bounds center.
type TriangleInfo = (u32, Aabb3, Point3);

impl Bvh {
    /// Build a BVH over the triangles of `indices` using SAH construction.
    ///
    /// The buffers are expected to satisfy the mesh invariants, as the
    /// accessors of `MeshGeometry3D` guarantee. A trailing partial triangle
    /// is ignored.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for `positions`.
    pub fn build(positions: &[Point3], indices: &[u32], params: &BvhParams) -> Self {
        let info = |(ordinal, tri): (usize, &[u32])| -> TriangleInfo {
            let aabb = Aabb3::from_points(tri.iter().map(|&i| &positions[i as usize]));
            (ordinal as u32, aabb, aabb.center())
        };

        let triangle_count = indices.len() / 3;
        let mut tri_data: Vec<TriangleInfo> = if triangle_count >= params.parallel_threshold {
            indices.par_chunks_exact(3).enumerate().map(info).collect()
        } else {
            indices.chunks_exact(3).enumerate().map(info).collect()
        };

        let root = if tri_data.is_empty() {
            None
        } else {
            Some(build_node(&mut tri_data, params))
        };

        let bvh = Self {
            root,
            positions: positions.to_vec(),
            indices: indices.to_vec(),
        };

        let stats = bvh.stats();
        debug!(
            triangles = triangle_count,
            nodes = stats.nodes,
            leaves = stats.leaves,
            depth = stats.depth,
            "built BVH"
        );
        bvh
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Count nodes, leaves and depth.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if let Some(root) = &self.root {
            collect_stats(root, 1, &mut stats);
        }
        stats
    }

    fn triangle(&self, ordinal: u32) -> Triangle {
        let base = ordinal as usize * 3;
        let indices = [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ];
        Triangle {
            p0: self.positions[indices[0] as usize],
            p1: self.positions[indices[1] as usize],
            p2: self.positions[indices[2] as usize],
            indices,
            ordinal: ordinal as usize,
        }
    }

    /// Visit a node, keeping only the closest hit.
    fn closest_in_node(&self, ray: &Ray, node: &BvhNode, closest: &mut ClosestHit<'_>) {
        let Some((t_min, _)) = ray.intersect_aabb(node.aabb()) else {
            return;
        };
        // Strict: a node entered exactly at the best parameter may hold a
        // tie with a lower ordinal
        if t_min > closest.best_t() {
            return;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &ordinal in triangles {
                    closest.offer(&self.triangle(ordinal));
                }
            }
            BvhNode::Internal { left, right, .. } => {
                // Test children in order of AABB distance
                let left_t = ray.intersect_aabb(left.aabb()).map(|(t, _)| t);
                let right_t = ray.intersect_aabb(right.aabb()).map(|(t, _)| t);

                match (left_t, right_t) {
                    (Some(lt), Some(rt)) => {
                        if lt <= rt {
                            self.closest_in_node(ray, left, closest);
                            self.closest_in_node(ray, right, closest);
                        } else {
                            self.closest_in_node(ray, right, closest);
                            self.closest_in_node(ray, left, closest);
                        }
                    }
                    (Some(_), None) => self.closest_in_node(ray, left, closest),
                    (None, Some(_)) => self.closest_in_node(ray, right, closest),
                    (None, None) => {}
                }
            }
        }
    }
}

impl SpatialIndex for Bvh {
    fn query(
        &self,
        _ctx: &HitTestContext,
        ray_world: &Ray,
        model_matrix: &Transform,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        let Some(mut closest) = ClosestHit::begin(model_matrix, ray_world) else {
            return false;
        };

        let ray = *closest.ray_model();
        self.closest_in_node(&ray, root, &mut closest);
        closest.finish(source, hits)
    }

    fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    stats.nodes += 1;
    stats.depth = stats.depth.max(depth);
    match node {
        BvhNode::Leaf { .. } => stats.leaves += 1,
        BvhNode::Internal { left, right, .. } => {
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(tri_data: &mut [TriangleInfo], params: &BvhParams) -> BvhNode {
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in tri_data.iter() {
        bounds.include_aabb(aabb);
    }
    // Padded so flat and grazing triangles survive the slab test
    let aabb = bounds.expanded(Tolerance::DEFAULT.linear);

    if tri_data.len() <= params.max_leaf_triangles.max(1) {
        return BvhNode::Leaf {
            aabb,
            triangles: tri_data.iter().map(|(ordinal, _, _)| *ordinal).collect(),
        };
    }

    let mid = match find_best_split(tri_data, &bounds, params) {
        Some((axis, pos)) => partition_triangles(tri_data, axis, pos),
        None => 0,
    };

    // Fall back to a median split when SAH cannot separate the centroids
    let mid = if mid == 0 || mid == tri_data.len() {
        tri_data.len() / 2
    } else {
        mid
    };

    let (left_data, right_data) = tri_data.split_at_mut(mid);
    BvhNode::Internal {
        aabb,
        left: Box::new(build_node(left_data, params)),
        right: Box::new(build_node(right_data, params)),
    }
}

/// Find the best split axis and position using SAH.
fn find_best_split(
    tri_data: &[TriangleInfo],
    bounds: &Aabb3,
    params: &BvhParams,
) -> Option<(usize, f64)> {
    let n = params.bucket_count.max(2);
    let extent = bounds.size();
    let total_area = bounds.surface_area();

    let mut best: Option<(usize, f64)> = None;
    let mut best_cost = f64::INFINITY;

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if !(axis_extent >= 1e-10) {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut bucket_counts = vec![0usize; n];
        let mut bucket_bounds = vec![Aabb3::empty(); n];

        for (_, aabb, centroid) in tri_data {
            let b = ((centroid[axis] - axis_min) / axis_extent * n as f64) as usize;
            let b = b.min(n - 1);
            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(aabb);
        }

        // Right-hand sweep: counts and bounds of buckets split..n
        let mut right_counts = vec![0usize; n];
        let mut right_bounds = vec![Aabb3::empty(); n];
        let mut count = 0;
        let mut acc = Aabb3::empty();
        for i in (1..n).rev() {
            count += bucket_counts[i];
            acc.include_aabb(&bucket_bounds[i]);
            right_counts[i] = count;
            right_bounds[i] = acc;
        }

        let mut left_count = 0;
        let mut left_bounds = Aabb3::empty();
        for split in 1..n {
            left_count += bucket_counts[split - 1];
            left_bounds.include_aabb(&bucket_bounds[split - 1]);
            let right_count = right_counts[split];

            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = params.traversal_cost
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds[split].surface_area() / total_area * right_count as f64;

            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, axis_min + (split as f64 / n as f64) * axis_extent));
            }
        }
    }

    best
}

/// Partition triangles by centroid along an axis.
fn partition_triangles(tri_data: &mut [TriangleInfo], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = tri_data.len();

    while left < right {
        if tri_data[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            tri_data.swap(left, right);
        }
    }

    left
}
