//! Mesh hit-testing: the brute-force scan and the index-owning wrapper.

use std::sync::Arc;
use tracing::{debug, trace};
use vcad_kernel_math::{Tolerance, Transform};
use vcad_kernel_mesh::MeshGeometry3D;

use crate::{
    ClosestHit, HitTestContext, HitTestResult, HitTestable, ModelHandle, Ray, SpatialIndex,
    SpatialIndexBuilder,
};

/// Hit-test a mesh placed in the world by `model_matrix`.
///
/// With a spatial index the query is handed to it entirely. Otherwise the
/// ray is mapped into model space, gated by the mesh bound, and every
/// triangle is tested in index order. The closest hit by world distance
/// (strictly positive) is appended to `hits`.
///
/// An empty mesh, a non-invertible `model_matrix` and a ray that misses
/// the bound all report `false` and leave `hits` unchanged.
pub fn hit_test_mesh(
    geometry: &MeshGeometry3D,
    spatial_index: Option<&dyn SpatialIndex>,
    ctx: &HitTestContext,
    model_matrix: &Transform,
    ray_world: &Ray,
    source: ModelHandle,
    hits: &mut Vec<HitTestResult>,
) -> bool {
    if geometry.is_empty() {
        trace!("empty mesh, skipping hit test");
        return false;
    }

    if let Some(index) = spatial_index {
        return index.query(ctx, ray_world, model_matrix, source, hits);
    }

    let Some(mut closest) = ClosestHit::begin(model_matrix, ray_world) else {
        return false;
    };

    let bound = geometry.bound().expanded(Tolerance::DEFAULT.linear);
    if closest.ray_model().intersect_aabb(&bound).is_none() {
        trace!("ray misses mesh bound");
        return false;
    }

    for triangle in geometry.triangles() {
        closest.offer(&triangle);
    }

    closest.finish(source, hits)
}

impl HitTestable for MeshGeometry3D {
    fn hit_test(
        &self,
        ctx: &HitTestContext,
        model_matrix: &Transform,
        ray_world: &Ray,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool {
        hit_test_mesh(self, None, ctx, model_matrix, ray_world, source, hits)
    }
}

/// A mesh together with an optional spatial index over its triangles.
///
/// Geometry changes go through [`HitTestMesh::update`] or
/// [`HitTestMesh::set_geometry`], which mark the index dirty. A dirty
/// index is never queried; hit tests fall back to the brute-force scan
/// until [`HitTestMesh::refresh_spatial_index`] rebuilds it.
#[derive(Debug, Clone, Default)]
pub struct HitTestMesh {
    geometry: MeshGeometry3D,
    builder: Option<Arc<dyn SpatialIndexBuilder>>,
    index: Option<Arc<dyn SpatialIndex>>,
    index_dirty: bool,
}

impl HitTestMesh {
    /// Wrap a mesh with no spatial index.
    pub fn new(geometry: MeshGeometry3D) -> Self {
        Self {
            geometry,
            builder: None,
            index: None,
            index_dirty: false,
        }
    }

    /// Build a spatial index over the current geometry with `builder`,
    /// and keep the builder for later refreshes.
    pub fn with_spatial_index(mut self, builder: Arc<dyn SpatialIndexBuilder>) -> Self {
        self.builder = Some(builder);
        self.refresh_spatial_index();
        self
    }

    /// The wrapped geometry.
    pub fn geometry(&self) -> &MeshGeometry3D {
        &self.geometry
    }

    /// Mutate the geometry; the spatial index becomes dirty.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut MeshGeometry3D) -> R) -> R {
        self.mark_dirty();
        f(&mut self.geometry)
    }

    /// Replace the geometry; the spatial index becomes dirty.
    pub fn set_geometry(&mut self, geometry: MeshGeometry3D) {
        self.mark_dirty();
        self.geometry = geometry;
    }

    /// The spatial index, if one is built and up to date.
    pub fn spatial_index(&self) -> Option<&dyn SpatialIndex> {
        if self.index_dirty {
            return None;
        }
        self.index.as_deref()
    }

    /// True when geometry changed since the index was last built.
    pub fn is_spatial_index_dirty(&self) -> bool {
        self.index_dirty
    }

    /// Rebuild the spatial index from the current geometry.
    ///
    /// Does nothing without a builder.
    pub fn refresh_spatial_index(&mut self) {
        let Some(builder) = &self.builder else {
            return;
        };
        self.index = Some(builder.build(self.geometry.positions(), self.geometry.indices()));
        self.index_dirty = false;
    }

    /// Drop the spatial index and its builder.
    pub fn clear_spatial_index(&mut self) {
        self.builder = None;
        self.index = None;
        self.index_dirty = false;
    }

    fn mark_dirty(&mut self) {
        if self.index.is_some() {
            self.index_dirty = true;
        }
    }
}

impl From<MeshGeometry3D> for HitTestMesh {
    fn from(geometry: MeshGeometry3D) -> Self {
        Self::new(geometry)
    }
}

impl HitTestable for HitTestMesh {
    fn hit_test(
        &self,
        ctx: &HitTestContext,
        model_matrix: &Transform,
        ray_world: &Ray,
        source: ModelHandle,
        hits: &mut Vec<HitTestResult>,
    ) -> bool {
        if self.index_dirty {
            debug!("spatial index is dirty, using brute-force scan");
        }
        hit_test_mesh(
            &self.geometry,
            self.spatial_index(),
            ctx,
            model_matrix,
            ray_world,
            source,
            hits,
        )
    }
}
