//! Common test helpers for alice-contour integration tests
//!
//! Author: Moroya Sakamoto

#![allow(dead_code)]

use alice_contour::prelude::*;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Test shapes
// ============================================================================

/// Quarter-size cube; fits grids down to 32 (the presets need the full
/// 128 grid).
pub fn small_cube_config() -> SuperPrimitiveConfig {
    SuperPrimitiveConfig {
        s: Vec4::splat(0.25),
        r: Vec2::ZERO,
    }
}

/// Sphere SDF centred on the origin.
pub fn sphere_sdf(radius: f32) -> impl Fn(Vec4) -> f32 + Sync {
    move |p: Vec4| Vec3::new(p.x, p.y, p.z).length() - radius
}

/// Open, gently wavy height-field patch with `n × n` vertices.
///
/// The perimeter is a genuine mesh boundary (multiplicity-1 edges) and
/// the waviness keeps QEF residuals strictly positive so collapses can
/// actually commit.
pub fn wavy_patch(n: usize) -> MeshBuffer {
    let mut mesh = MeshBuffer::new();
    let half = (n - 1) as f32 / 2.0;

    for j in 0..n {
        for i in 0..n {
            let x = i as f32 - half;
            let y = j as f32 - half;
            let z = 0.4 * (0.7 * x).sin() * (0.5 * y).cos();

            // analytic normal of z = h(x, y): (-dh/dx, -dh/dy, 1)
            let dzdx = 0.4 * 0.7 * (0.7 * x).cos() * (0.5 * y).cos();
            let dzdy = -0.4 * 0.5 * (0.7 * x).sin() * (0.5 * y).sin();
            let normal = Vec3::new(-dzdx, -dzdy, 1.0).normalize();

            mesh.vertices.push(MeshVertex::new(
                Vec4::new(x, y, z, 1.0),
                Vec4::new(normal.x, normal.y, normal.z, 0.0),
            ));
        }
    }

    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let a = (j * n + i) as u32;
            let b = (j * n + i + 1) as u32;
            let c = ((j + 1) * n + i) as u32;
            let d = ((j + 1) * n + i + 1) as u32;
            mesh.triangles.push(MeshTriangle::new(a, b, c));
            mesh.triangles.push(MeshTriangle::new(b, d, c));
        }
    }

    mesh
}

// ============================================================================
// Mesh census
// ============================================================================

/// Multiplicity of every undirected edge in the triangle set.
pub fn edge_multiplicities(mesh: &MeshBuffer) -> HashMap<(u32, u32), u32> {
    let mut counts = HashMap::new();
    for tri in &mesh.triangles {
        let [a, b, c] = tri.indices;
        for &(u, v) in &[(a, b), (b, c), (a, c)] {
            let key = (u.min(v), u.max(v));
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of boundary (multiplicity-1) edges.
pub fn boundary_edge_count(mesh: &MeshBuffer) -> usize {
    edge_multiplicities(mesh)
        .values()
        .filter(|&&count| count == 1)
        .count()
}

/// Vertex indices touching a boundary edge.
pub fn boundary_vertices(mesh: &MeshBuffer) -> HashSet<u32> {
    let mut verts = HashSet::new();
    for ((u, v), count) in edge_multiplicities(mesh) {
        if count == 1 {
            verts.insert(u);
            verts.insert(v);
        }
    }
    verts
}

/// V − E + F over the triangle set.
pub fn euler_characteristic(mesh: &MeshBuffer) -> i64 {
    let v = mesh.vertex_count() as i64;
    let e = edge_multiplicities(mesh).len() as i64;
    let f = mesh.triangle_count() as i64;
    v - e + f
}

/// Number of triangles each vertex belongs to.
pub fn vertex_degrees(mesh: &MeshBuffer) -> Vec<u32> {
    let mut degrees = vec![0u32; mesh.vertex_count()];
    for tri in &mesh.triangles {
        for &index in &tri.indices {
            degrees[index as usize] += 1;
        }
    }
    degrees
}

// ============================================================================
// Bit-exact comparison
// ============================================================================

fn vec4_bits(v: Vec4) -> [u32; 4] {
    v.to_array().map(f32::to_bits)
}

/// Byte-level equality of two mesh buffers.
pub fn meshes_bit_identical(a: &MeshBuffer, b: &MeshBuffer) -> bool {
    if a.vertex_count() != b.vertex_count() || a.triangle_count() != b.triangle_count() {
        return false;
    }
    let vertices_match = a.vertices.iter().zip(&b.vertices).all(|(va, vb)| {
        vec4_bits(va.position) == vec4_bits(vb.position)
            && vec4_bits(va.normal) == vec4_bits(vb.normal)
            && vec4_bits(va.colour) == vec4_bits(vb.colour)
    });
    vertices_match
        && a.triangles
            .iter()
            .zip(&b.triangles)
            .all(|(ta, tb)| ta.indices == tb.indices)
}
