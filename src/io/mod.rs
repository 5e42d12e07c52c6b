//! Mesh export
//!
//! The core pipeline is infallible; only the filesystem boundary
//! returns errors.
//!
//! Author: Moroya Sakamoto

mod obj;

pub use obj::{export_obj, ObjConfig};

use thiserror::Error;

/// File I/O errors
#[derive(Error, Debug)]
pub enum IoError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export was asked to write a mesh with no geometry
    #[error("mesh has no geometry to export")]
    EmptyMesh,
}
