//! Indexed triangle mesh with optional per-vertex attributes.

use vcad_kernel_math::{Point2, Point3, Vec3};

use crate::bbox::{Aabb3, BoundCache};
use crate::error::{check_attribute, check_indices, check_vertex_count, Attribute, Result};
use crate::triangles::Triangles;
use crate::Color4;

/// Indexed triangle mesh.
///
/// Buffers are private so every mutation can validate the invariants and
/// mark the cached bound dirty:
///
/// - `indices.len() % 3 == 0` and every index is `< positions.len()`
/// - each present attribute has exactly `positions.len()` entries
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry3D {
    positions: Vec<Point3>,
    indices: Vec<u32>,
    normals: Option<Vec<Vec3>>,
    texture_coordinates: Option<Vec<Point2>>,
    tangents: Option<Vec<Vec3>>,
    bitangents: Option<Vec<Vec3>>,
    colors: Option<Vec<Color4>>,
    bound: BoundCache,
}

impl MeshGeometry3D {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from positions and triangle indices.
    pub fn from_buffers(positions: Vec<Point3>, indices: Vec<u32>) -> Result<Self> {
        check_indices(&indices, 3, positions.len())?;
        Ok(Self {
            positions,
            indices,
            ..Self::default()
        })
    }

    /// Builder form of [`MeshGeometry3D::set_normals`].
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Result<Self> {
        self.set_normals(Some(normals))?;
        Ok(self)
    }

    /// Builder form of [`MeshGeometry3D::set_texture_coordinates`].
    pub fn with_texture_coordinates(mut self, uvs: Vec<Point2>) -> Result<Self> {
        self.set_texture_coordinates(Some(uvs))?;
        Ok(self)
    }

    /// Builder form of [`MeshGeometry3D::set_tangents`].
    pub fn with_tangents(mut self, tangents: Vec<Vec3>) -> Result<Self> {
        self.set_tangents(Some(tangents))?;
        Ok(self)
    }

    /// Builder form of [`MeshGeometry3D::set_bitangents`].
    pub fn with_bitangents(mut self, bitangents: Vec<Vec3>) -> Result<Self> {
        self.set_bitangents(Some(bitangents))?;
        Ok(self)
    }

    /// Builder form of [`MeshGeometry3D::set_colors`].
    pub fn with_colors(mut self, colors: Vec<Color4>) -> Result<Self> {
        self.set_colors(Some(colors))?;
        Ok(self)
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Triangle indices, three per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex normals, if present.
    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    /// Texture coordinates, if present.
    pub fn texture_coordinates(&self) -> Option<&[Point2]> {
        self.texture_coordinates.as_deref()
    }

    /// Tangents, if present.
    pub fn tangents(&self) -> Option<&[Vec3]> {
        self.tangents.as_deref()
    }

    /// Bitangents, if present.
    pub fn bitangents(&self) -> Option<&[Vec3]> {
        self.bitangents.as_deref()
    }

    /// Vertex colors, if present.
    pub fn colors(&self) -> Option<&[Color4]> {
        self.colors.as_deref()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when there is nothing to hit: no positions or no indices.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Lazy view of the triangles in index order.
    pub fn triangles(&self) -> Triangles<'_> {
        Triangles::new(&self.positions, &self.indices)
    }

    /// Bounding box of all positions, recomputed only after a mutation.
    pub fn bound(&self) -> Aabb3 {
        self.bound.get_or_compute(&self.positions)
    }

    /// True if the cached bound must be recomputed before use.
    pub fn is_bound_dirty(&self) -> bool {
        self.bound.is_dirty()
    }

    /// Replace the positions.
    ///
    /// The vertex count may change only if the current indices stay in
    /// range and no attribute would lose parity.
    pub fn set_positions(&mut self, positions: Vec<Point3>) -> Result<()> {
        let n = positions.len();
        check_indices(&self.indices, 3, n)?;
        self.check_attributes(n)?;
        self.positions = positions;
        self.bound.invalidate();
        Ok(())
    }

    /// Mutable access to the positions; the vertex count cannot change.
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        self.bound.invalidate();
        &mut self.positions
    }

    /// Replace the triangle indices.
    pub fn set_indices(&mut self, indices: Vec<u32>) -> Result<()> {
        check_indices(&indices, 3, self.positions.len())?;
        self.indices = indices;
        Ok(())
    }

    /// Replace or remove the normals.
    pub fn set_normals(&mut self, normals: Option<Vec<Vec3>>) -> Result<()> {
        check_attribute(Attribute::Normals, normals.as_deref(), self.positions.len())?;
        self.normals = normals;
        Ok(())
    }

    /// Replace or remove the texture coordinates.
    pub fn set_texture_coordinates(&mut self, uvs: Option<Vec<Point2>>) -> Result<()> {
        check_attribute(
            Attribute::TextureCoordinates,
            uvs.as_deref(),
            self.positions.len(),
        )?;
        self.texture_coordinates = uvs;
        Ok(())
    }

    /// Replace or remove the tangents.
    pub fn set_tangents(&mut self, tangents: Option<Vec<Vec3>>) -> Result<()> {
        check_attribute(Attribute::Tangents, tangents.as_deref(), self.positions.len())?;
        self.tangents = tangents;
        Ok(())
    }

    /// Replace or remove the bitangents.
    pub fn set_bitangents(&mut self, bitangents: Option<Vec<Vec3>>) -> Result<()> {
        check_attribute(
            Attribute::Bitangents,
            bitangents.as_deref(),
            self.positions.len(),
        )?;
        self.bitangents = bitangents;
        Ok(())
    }

    /// Replace or remove the vertex colors.
    pub fn set_colors(&mut self, colors: Option<Vec<Color4>>) -> Result<()> {
        check_attribute(Attribute::Colors, colors.as_deref(), self.positions.len())?;
        self.colors = colors;
        Ok(())
    }

    /// Re-check every invariant.
    pub fn validate(&self) -> Result<()> {
        check_indices(&self.indices, 3, self.positions.len())?;
        self.check_attributes(self.positions.len())
    }

    fn check_attributes(&self, vertex_count: usize) -> Result<()> {
        check_attribute(Attribute::Normals, self.normals(), vertex_count)?;
        check_attribute(
            Attribute::TextureCoordinates,
            self.texture_coordinates(),
            vertex_count,
        )?;
        check_attribute(Attribute::Tangents, self.tangents(), vertex_count)?;
        check_attribute(Attribute::Bitangents, self.bitangents(), vertex_count)?;
        check_attribute(Attribute::Colors, self.colors(), vertex_count)
    }

    /// Append another mesh, offsetting its indices by this mesh's vertex count.
    ///
    /// An attribute survives only if both meshes carry it; otherwise it is
    /// dropped from `self` entirely. Fails, leaving `self` untouched, when
    /// the combined vertex count no longer fits a `u32` index.
    pub fn append(&mut self, other: &MeshGeometry3D) -> Result<()> {
        check_vertex_count(self.positions.len() + other.positions.len())?;
        let offset = check_vertex_count(self.positions.len())?;
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
        append_attribute(&mut self.normals, other.normals());
        append_attribute(&mut self.texture_coordinates, other.texture_coordinates());
        append_attribute(&mut self.tangents, other.tangents());
        append_attribute(&mut self.bitangents, other.bitangents());
        append_attribute(&mut self.colors, other.colors());
        self.bound.invalidate();
        Ok(())
    }
}

fn append_attribute<T: Clone>(dst: &mut Option<Vec<T>>, src: Option<&[T]>) {
    match (dst.as_mut(), src) {
        (Some(values), Some(more)) => values.extend_from_slice(more),
        _ => *dst = None,
    }
}

/// Structural equality over the buffers; the bound cache state is ignored.
impl PartialEq for MeshGeometry3D {
    fn eq(&self, other: &Self) -> bool {
        self.positions == other.positions
            && self.indices == other.indices
            && self.normals == other.normals
            && self.texture_coordinates == other.texture_coordinates
            && self.tangents == other.tangents
            && self.bitangents == other.bitangents
            && self.colors == other.colors
    }
}
