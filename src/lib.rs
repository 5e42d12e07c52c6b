//! # ALICE-Contour
//!
//! **A.L.I.C.E. Contour** is the real-time isosurface meshing core:
//! Dual Contouring over a dense voxel grid plus a QEF-driven
//! edge-collapse simplifier.
//!
//! ## Pipeline
//!
//! A signed-distance evaluator is scanned for sign-change edges; each
//! active voxel gets one vertex placed by QEF minimization over its
//! edge samples; quads are stitched across shared edges and oriented
//! by the stored winding. The simplifier then reworks the mesh in
//! place with randomised, conflict-free edge collapses until it hits
//! the target triangle count.
//!
//! ## Example
//!
//! ```rust
//! use alice_contour::prelude::*;
//!
//! // Quarter-size cube; the presets are sized for the full 128 grid
//! let config = SuperPrimitiveConfig {
//!     s: Vec4::splat(0.25),
//!     r: Vec2::ZERO,
//! };
//!
//! // Contour on a small grid, then simplify in place
//! let mut mesh = generate_mesh_sized(&config, 32);
//! simplify_mesh(&mut mesh, Vec4::ZERO, &SimplifyOptions::default());
//!
//! assert!(mesh.triangle_count() > 0);
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod buffer;
pub mod io;
pub mod mesh;
pub mod qef;
pub mod sdf;
pub mod voxel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::buffer::LinearBuffer;
    pub use crate::io::{export_obj, IoError, ObjConfig};
    pub use crate::mesh::{
        contour_sdf, generate_mesh, generate_mesh_sized, simplify_mesh, MeshBuffer, MeshTriangle,
        MeshVertex, SimplifyOptions, COLLAPSE_MAX_DEGREE,
    };
    pub use crate::qef::{solve_from_points, solve_vertex_pair};
    pub use crate::sdf::{density, sd_super_prim, ShapeType, SuperPrimitiveConfig};
    pub use crate::voxel::{
        decode_voxel_id, encode_edge_id, encode_voxel_id, EDGE_NODE_OFFSETS,
        ENCODED_EDGE_NODE_OFFSETS, ENCODED_EDGE_OFFSETS, VOXEL_GRID_SIZE,
    };
    pub use glam::{Vec2, Vec3, Vec4};
}

// Re-exports for convenience
pub use mesh::{generate_mesh, simplify_mesh, MeshBuffer};
pub use sdf::{ShapeType, SuperPrimitiveConfig};
