//! Mesh buffers and the meshing pipeline
//!
//! The contouring stage produces a [`MeshBuffer`]; the simplifier
//! reworks it in place. Vertices are three 4-wide float vectors so the
//! layout is contiguous and uploads (or SIMD passes) can treat the
//! array as raw `f32`s.
//!
//! Author: Moroya Sakamoto

pub mod contour;
pub mod simplify;

pub use contour::{contour_sdf, generate_mesh, generate_mesh_sized};
pub use simplify::{simplify_mesh, SimplifyOptions, COLLAPSE_MAX_DEGREE};

use glam::Vec4;

/// Mesh vertex: position (`w = 1`), normal (`w = 0`), colour (`w = α`).
///
/// Colour is opaque payload as far as this crate is concerned: the
/// contouring stage writes a default and the simplifier carries it
/// through untouched, compaction included.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// World-space position
    pub position: Vec4,
    /// Surface normal
    pub normal: Vec4,
    /// Vertex colour
    pub colour: Vec4,
}

impl MeshVertex {
    /// Create a vertex with the default (opaque white) colour.
    #[inline]
    pub fn new(position: Vec4, normal: Vec4) -> Self {
        MeshVertex {
            position,
            normal,
            colour: Vec4::ONE,
        }
    }
}

/// Triangle as three vertex indices, no per-triangle attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTriangle {
    /// Vertex indices, CCW relative to the surface
    pub indices: [u32; 3],
}

impl MeshTriangle {
    /// Create a triangle from three vertex indices.
    #[inline]
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        MeshTriangle { indices: [a, b, c] }
    }
}

/// Indexed triangle mesh with explicit counts.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    /// Vertex array
    pub vertices: Vec<MeshVertex>,
    /// Triangle array
    pub triangles: Vec<MeshTriangle>,
}

impl MeshBuffer {
    /// Create an empty mesh buffer.
    pub fn new() -> Self {
        MeshBuffer::default()
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}
