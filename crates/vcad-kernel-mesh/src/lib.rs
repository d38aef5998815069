#![warn(missing_docs)]

//! Mesh geometry buffers for vcad hit-testing.
//!
//! - [`MeshGeometry3D`] - indexed triangles with optional per-vertex attributes
//! - [`LineGeometry3D`] / [`PointGeometry3D`] - line lists and point clouds
//! - [`Aabb3`] - axis-aligned bounds, cached per geometry behind a dirty flag
//! - [`Triangles`] - lazy per-triangle view used by hit-testing and index builders
//! - [`merge`] - concatenate meshes, re-indexing by cumulative vertex offset
//!
//! Buffers are validated when installed, so consumers may index
//! `positions` with any value from `indices` without checking.
//!
//! # Example
//!
//! ```
//! use vcad_kernel_math::Point3;
//! use vcad_kernel_mesh::{merge, MeshGeometry3D};
//!
//! let tri = MeshGeometry3D::from_buffers(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![0, 1, 2],
//! )?;
//!
//! let merged = merge(&[&tri, &tri])?;
//! assert_eq!(merged.indices(), &[0, 1, 2, 3, 4, 5]);
//! # Ok::<(), vcad_kernel_mesh::MeshError>(())
//! ```

mod bbox;
mod error;
mod geometry;
mod lines;
mod merge;
mod triangles;

pub use bbox::Aabb3;
pub use error::{Attribute, MeshError, Result};
pub use geometry::MeshGeometry3D;
pub use lines::{LineGeometry3D, PointGeometry3D};
pub use merge::merge;
pub use triangles::{Segment, Segments, Triangle, Triangles};

/// RGBA vertex color.
pub type Color4 = nalgebra::Vector4<f32>;
