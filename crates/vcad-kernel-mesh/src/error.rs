//! Error types for mesh construction.

use std::fmt;
use thiserror::Error;

/// Optional per-vertex attribute buffers of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Vertex normals.
    Normals,
    /// Texture coordinates.
    TextureCoordinates,
    /// Tangents.
    Tangents,
    /// Bitangents.
    Bitangents,
    /// Vertex colors.
    Colors,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Normals => "normals",
            Attribute::TextureCoordinates => "texture coordinates",
            Attribute::Tangents => "tangents",
            Attribute::Bitangents => "bitangents",
            Attribute::Colors => "colors",
        };
        f.write_str(name)
    }
}

/// Errors raised when geometry buffers violate the mesh invariants.
///
/// These are caught when buffers are installed; hit-testing assumes
/// valid geometry and never re-validates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Index buffer length does not divide into whole primitives.
    #[error("index count {count} is not a multiple of {arity}")]
    IndexCountNotMultiple {
        /// Number of indices supplied.
        count: usize,
        /// Indices per primitive (3 for triangles, 2 for segments).
        arity: usize,
    },

    /// An index references a vertex past the end of the position buffer.
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offset of the bad entry in the index buffer.
        position: usize,
        /// The offending index value.
        index: u32,
        /// Number of vertices available.
        vertex_count: usize,
    },

    /// An attribute buffer does not have one entry per vertex.
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        /// Which attribute is mismatched.
        attribute: Attribute,
        /// Number of vertices.
        expected: usize,
        /// Number of attribute entries supplied.
        actual: usize,
    },

    /// More vertices than a `u32` index can address.
    #[error("{count} vertices cannot be addressed by u32 indices")]
    TooManyVertices {
        /// Number of vertices requested.
        count: usize,
    },
}

/// Result type for mesh construction.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Check an index buffer against its primitive arity and the vertex count.
pub(crate) fn check_indices(indices: &[u32], arity: usize, vertex_count: usize) -> Result<()> {
    if indices.len() % arity != 0 {
        return Err(MeshError::IndexCountNotMultiple {
            count: indices.len(),
            arity,
        });
    }
    match indices.iter().position(|&i| i as usize >= vertex_count) {
        Some(position) => Err(MeshError::IndexOutOfRange {
            position,
            index: indices[position],
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Vertex count as a `u32`, failing when indices could not address every vertex.
pub(crate) fn check_vertex_count(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| MeshError::TooManyVertices { count })
}

/// Check that an optional attribute buffer has one entry per vertex.
pub(crate) fn check_attribute<T>(
    attribute: Attribute,
    values: Option<&[T]>,
    vertex_count: usize,
) -> Result<()> {
    match values {
        Some(v) if v.len() != vertex_count => Err(MeshError::AttributeLength {
            attribute,
            expected: vertex_count,
            actual: v.len(),
        }),
        _ => Ok(()),
    }
}
