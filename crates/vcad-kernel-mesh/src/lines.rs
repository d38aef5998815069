//! Line-list and point-cloud geometry.

use vcad_kernel_math::Point3;

use crate::bbox::{Aabb3, BoundCache};
use crate::error::{check_indices, check_vertex_count, Result};
use crate::triangles::Segments;

/// Indexed line list: each consecutive index pair is one segment.
#[derive(Debug, Clone, Default)]
pub struct LineGeometry3D {
    positions: Vec<Point3>,
    indices: Vec<u32>,
    bound: BoundCache,
}

impl LineGeometry3D {
    /// Create a line list from positions and index pairs.
    pub fn from_buffers(positions: Vec<Point3>, indices: Vec<u32>) -> Result<Self> {
        check_indices(&indices, 2, positions.len())?;
        Ok(Self {
            positions,
            indices,
            bound: BoundCache::default(),
        })
    }

    /// Create a polyline through `points`, one segment per neighbouring pair.
    pub fn polyline(points: Vec<Point3>) -> Result<Self> {
        let n = check_vertex_count(points.len())?;
        let indices = (1..n).flat_map(|i| [i - 1, i]).collect();
        Ok(Self {
            positions: points,
            indices,
            bound: BoundCache::default(),
        })
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Segment indices, two per segment.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// True if there are no positions or no segments.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Lazy view of the segments in index order.
    pub fn segments(&self) -> Segments<'_> {
        Segments::new(&self.positions, &self.indices)
    }

    /// Bounding box of all positions.
    pub fn bound(&self) -> Aabb3 {
        self.bound.get_or_compute(&self.positions)
    }

    /// Mutable access to the positions; the vertex count cannot change.
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        self.bound.invalidate();
        &mut self.positions
    }
}

/// Unindexed point cloud.
#[derive(Debug, Clone, Default)]
pub struct PointGeometry3D {
    positions: Vec<Point3>,
    bound: BoundCache,
}

impl PointGeometry3D {
    /// Create a point cloud.
    pub fn new(positions: Vec<Point3>) -> Self {
        Self {
            positions,
            bound: BoundCache::default(),
        }
    }

    /// Point positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// True if there are no points.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Bounding box of all points.
    pub fn bound(&self) -> Aabb3 {
        self.bound.get_or_compute(&self.positions)
    }

    /// Mutable access to the positions.
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        self.bound.invalidate();
        &mut self.positions
    }
}
