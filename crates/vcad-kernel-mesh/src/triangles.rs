//! Lazy per-triangle and per-segment views over index buffers.

use std::iter::Enumerate;
use std::slice::ChunksExact;
use vcad_kernel_math::{Point3, Vec3};

/// A triangle resolved from a mesh's index and position buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner.
    pub p0: Point3,
    /// Second corner.
    pub p1: Point3,
    /// Third corner.
    pub p2: Point3,
    /// The three index values that produced this triangle.
    pub indices: [u32; 3],
    /// Position of this triangle in the index buffer (`i / 3`).
    pub ordinal: usize,
}

impl Triangle {
    /// Unnormalized face normal `(p1 - p0) x (p2 - p0)`; its length is twice the area.
    pub fn normal_unnormalized(&self) -> Vec3 {
        (self.p1 - self.p0).cross(&(self.p2 - self.p0))
    }
}

/// Iterator over the triangles of an index buffer, in index order.
///
/// Borrows the buffers and never copies more than the three corners it
/// yields. Call `MeshGeometry3D::triangles` again to restart.
#[derive(Debug, Clone)]
pub struct Triangles<'a> {
    positions: &'a [Point3],
    chunks: Enumerate<ChunksExact<'a, u32>>,
}

impl<'a> Triangles<'a> {
    pub(crate) fn new(positions: &'a [Point3], indices: &'a [u32]) -> Self {
        Self {
            positions,
            chunks: indices.chunks_exact(3).enumerate(),
        }
    }
}

impl Iterator for Triangles<'_> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        let (ordinal, tri) = self.chunks.next()?;
        let indices = [tri[0], tri[1], tri[2]];
        Some(Triangle {
            p0: self.positions[indices[0] as usize],
            p1: self.positions[indices[1] as usize],
            p2: self.positions[indices[2] as usize],
            indices,
            ordinal,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Triangles<'_> {}

/// A line segment resolved from a line geometry's buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point.
    pub p0: Point3,
    /// End point.
    pub p1: Point3,
    /// The two index values that produced this segment.
    pub indices: [u32; 2],
    /// Position of this segment in the index buffer (`i / 2`).
    pub ordinal: usize,
}

/// Iterator over the segments of a line index buffer, in index order.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    positions: &'a [Point3],
    chunks: Enumerate<ChunksExact<'a, u32>>,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(positions: &'a [Point3], indices: &'a [u32]) -> Self {
        Self {
            positions,
            chunks: indices.chunks_exact(2).enumerate(),
        }
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let (ordinal, seg) = self.chunks.next()?;
        let indices = [seg[0], seg[1]];
        Some(Segment {
            p0: self.positions[indices[0] as usize],
            p1: self.positions[indices[1] as usize],
            indices,
            ordinal,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Point3>, Vec<u32>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (positions, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_triangles_in_index_order() {
        let (positions, indices) = quad();
        let tris: Vec<Triangle> = Triangles::new(&positions, &indices).collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0].indices, [0, 1, 2]);
        assert_eq!(tris[0].ordinal, 0);
        assert_eq!(tris[1].indices, [0, 2, 3]);
        assert_eq!(tris[1].ordinal, 1);
        assert_eq!(tris[1].p2, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangles_exact_size_and_restart() {
        let (positions, indices) = quad();
        let mut iter = Triangles::new(&positions, &indices);
        assert_eq!(iter.len(), 2);
        let snapshot = iter.clone();
        iter.next();
        assert_eq!(iter.len(), 1);
        assert_eq!(snapshot.count(), 2);
    }

    #[test]
    fn test_triangle_normal_follows_winding() {
        let (positions, indices) = quad();
        let tri = Triangles::new(&positions, &indices).next().unwrap();
        let n = tri.normal_unnormalized();
        assert!(n.z > 0.0);
        assert!((n.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_segments() {
        let (positions, _) = quad();
        let indices = [0, 1, 1, 2, 2, 3];
        let segs: Vec<Segment> = Segments::new(&positions, &indices).collect();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2].indices, [2, 3]);
        assert_eq!(segs[2].ordinal, 2);
        assert_eq!(segs[0].p1, Point3::new(1.0, 0.0, 0.0));
    }
}
