#![warn(missing_docs)]

//! Ray hit-testing against meshes, line lists and point clouds.
//!
//! The query is a world-space [`Ray`] plus the geometry's model transform.
//! Meshes are tested in model space and ranked in world space:
//!
//! - [`intersect_triangle`] - Möller-Trumbore ray/triangle predicate
//! - [`hit_test_mesh`] - closest-hit scan with a bound gate, or delegation
//!   to a [`SpatialIndex`]
//! - [`HitTestMesh`] - mesh plus an optional index kept in sync by a dirty flag
//! - [`Bvh`] / [`BvhParams`] - SAH hierarchy implementing the index traits
//! - [`HitTestable`] - common entry point for meshes, lines and points
//!
//! Misses never raise errors: empty geometry, singular transforms and
//! rays that leave the bound all report `false`.
//!
//! # Example
//!
//! ```
//! use vcad_kernel_hittest::{HitTestContext, HitTestable, ModelHandle, Ray};
//! use vcad_kernel_math::{Point3, Transform, Vec3};
//! use vcad_kernel_mesh::MeshGeometry3D;
//!
//! let mesh = MeshGeometry3D::from_buffers(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![0, 1, 2],
//! )?;
//!
//! let ray = Ray::new(Point3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
//! let mut hits = Vec::new();
//! let hit = mesh.hit_test(
//!     &HitTestContext::default(),
//!     &Transform::translation(0.0, 0.0, 1.0),
//!     &ray,
//!     ModelHandle(1),
//!     &mut hits,
//! );
//!
//! assert!(hit);
//! assert!((hits[0].distance() - 4.0).abs() < 1e-9);
//! # Ok::<(), vcad_kernel_mesh::MeshError>(())
//! ```

mod bvh;
mod closest;
mod error;
mod hittable;
mod mesh;
mod ray;
mod result;
mod settings;
mod spatial;
mod triangle;

pub use bvh::{Bvh, BvhNode, BvhParams, BvhStats};
pub use closest::ClosestHit;
pub use error::{HitTestError, Result};
pub use hittable::HitTestable;
pub use mesh::{hit_test_mesh, HitTestMesh};
pub use ray::{BoundingVolume, Ray};
pub use result::{sort_by_distance, HitPrimitive, HitTestResult, ModelHandle};
pub use settings::{HitTestContext, HitTestSettings};
pub use spatial::{SpatialIndex, SpatialIndexBuilder};
pub use triangle::intersect_triangle;
