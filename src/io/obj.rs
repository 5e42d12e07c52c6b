//! Wavefront OBJ export
//!
//! Minimal v/vn/f writer so generated and simplified meshes can be
//! inspected in any DCC tool without a GPU path.
//!
//! Author: Moroya Sakamoto

use crate::io::IoError;
use crate::mesh::MeshBuffer;
use std::io::Write;
use std::path::Path;

/// OBJ export configuration
#[derive(Debug, Clone)]
pub struct ObjConfig {
    /// Export normals (vn)
    pub export_normals: bool,
}

impl Default for ObjConfig {
    fn default() -> Self {
        ObjConfig {
            export_normals: true,
        }
    }
}

/// Export a mesh to Wavefront OBJ format.
pub fn export_obj(mesh: &MeshBuffer, path: impl AsRef<Path>, config: &ObjConfig) -> Result<(), IoError> {
    if mesh.vertex_count() == 0 || mesh.triangle_count() == 0 {
        return Err(IoError::EmptyMesh);
    }

    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");

    writeln!(w, "# alice-contour OBJ export")?;
    writeln!(w, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(w, "# Triangles: {}", mesh.triangle_count())?;
    writeln!(w, "o {}", stem)?;

    for v in &mesh.vertices {
        writeln!(w, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }

    if config.export_normals {
        for v in &mesh.vertices {
            writeln!(w, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
        }
    }

    // OBJ indices are 1-based
    for tri in &mesh.triangles {
        let [a, b, c] = tri.indices;
        if config.export_normals {
            writeln!(
                w,
                "f {}//{} {}//{} {}//{}",
                a + 1,
                a + 1,
                b + 1,
                b + 1,
                c + 1,
                c + 1
            )?;
        } else {
            writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
    }

    Ok(())
}
