//! Concatenation of several meshes into one buffer set.

use tracing::debug;

use crate::error::Result;
use crate::geometry::MeshGeometry3D;

/// Merge meshes into one, in input order.
///
/// Positions are concatenated and each mesh's indices are offset by the
/// number of vertices appended before it. An optional attribute is kept
/// only if every input supplies it. No vertices are welded or removed.
/// An empty input yields an empty mesh. Fails with
/// [`MeshError::TooManyVertices`](crate::MeshError::TooManyVertices) when the
/// merged mesh would need indices past `u32::MAX`.
pub fn merge(meshes: &[&MeshGeometry3D]) -> Result<MeshGeometry3D> {
    let Some((first, rest)) = meshes.split_first() else {
        return Ok(MeshGeometry3D::new());
    };

    let mut merged = (*first).clone();
    for mesh in rest {
        merged.append(mesh)?;
    }

    debug!(
        inputs = meshes.len(),
        vertices = merged.vertex_count(),
        triangles = merged.triangle_count(),
        "merged meshes"
    );

    Ok(merged)
}
