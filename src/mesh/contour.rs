//! Dual Contouring over a dense voxel grid
//!
//! One vertex per active voxel, placed by QEF minimization over the
//! voxel's sign-change edges; one quad (two triangles) per active edge,
//! stitched across the four voxels sharing it. All adjacency runs on
//! packed IDs (see [`crate::voxel`]), so the hot loops are hash lookups
//! and integer adds.
//!
//! # Deep Fried Optimizations
//! - **Parallel lattice evaluation**: the (G+1)³ corner densities are
//!   sampled with a rayon par_iter; the result is position-indexed, so
//!   output is bit-identical to a serial pass.
//! - **Deterministic traversal**: voxels are visited in ascending ID
//!   order and edges in scan order, making generation idempotent.
//!
//! Author: Moroya Sakamoto

use crate::mesh::{MeshBuffer, MeshTriangle, MeshVertex};
use crate::qef;
use crate::sdf::{density, SuperPrimitiveConfig};
use crate::voxel::{
    encode_edge_id, encode_voxel_id, edge_axis, edge_base_voxel, AXIS_OFFSET, EDGE_NODE_OFFSETS,
    ENCODED_EDGE_NODE_OFFSETS, ENCODED_EDGE_OFFSETS, VOXEL_GRID_SIZE,
};
use glam::{IVec3, Vec4};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Samples per edge in the linear intersection scan.
///
/// The surface position is the sample with the smallest |density|, not
/// a bisection root. The approximation is deliberate: it defines the
/// exact mesh output, and tests pin it.
const FIND_EDGE_INFO_STEPS: u32 = 16;

/// Step for the central-difference normal probe.
const NORMAL_H: f32 = 0.001;

/// Hermite record for one active (sign-change) edge.
#[derive(Debug, Clone, Copy)]
struct EdgeInfo {
    pos: Vec4,
    normal: Vec4,
    winding: bool,
}

/// Sparse output of the grid scan.
struct ActiveSets {
    /// Active voxel IDs, ascending
    voxel_ids: Vec<u32>,
    /// Active edge IDs in scan order
    edge_ids: Vec<u32>,
    /// Hermite data per active edge
    edges: HashMap<u32, EdgeInfo>,
}

// ── Grid scan ───────────────────────────────────────────────────────

#[inline(always)]
fn find_intersection<F: Fn(Vec4) -> f32>(sdf: &F, p0: Vec4, p1: Vec4) -> f32 {
    let increment = 1.0 / FIND_EDGE_INFO_STEPS as f32;

    let mut min_value = f32::MAX;
    let mut current_t = 0.0;
    let mut t = 0.0;
    for _ in 0..FIND_EDGE_INFO_STEPS {
        let p = p0.lerp(p1, current_t);
        let d = sdf(p).abs();
        if d < min_value {
            t = current_t;
            min_value = d;
        }
        current_t += increment;
    }
    t
}

#[inline(always)]
fn surface_normal<F: Fn(Vec4) -> f32>(sdf: &F, pos: Vec4) -> Vec4 {
    let h = NORMAL_H;
    Vec4::new(
        sdf(pos + Vec4::new(h, 0.0, 0.0, 0.0)) - sdf(pos - Vec4::new(h, 0.0, 0.0, 0.0)),
        sdf(pos + Vec4::new(0.0, h, 0.0, 0.0)) - sdf(pos - Vec4::new(0.0, h, 0.0, 0.0)),
        sdf(pos + Vec4::new(0.0, 0.0, h, 0.0)) - sdf(pos - Vec4::new(0.0, 0.0, h, 0.0)),
        0.0,
    )
    .normalize()
}

fn find_active_voxels<F>(sdf: &F, grid_size: u32) -> ActiveSets
where
    F: Fn(Vec4) -> f32 + Sync,
{
    let grid_offset = grid_size as f32 / 2.0;
    let dim = (grid_size + 1) as usize;

    // Corner lattice, evaluated up front in parallel. Sign checks below
    // read from here; only the intersection scan and the normal probe
    // evaluate the SDF at off-lattice points.
    let lattice: Vec<f32> = (0..dim * dim * dim)
        .into_par_iter()
        .map(|i| {
            let x = i % dim;
            let y = (i / dim) % dim;
            let z = i / (dim * dim);
            sdf(Vec4::new(
                x as f32 - grid_offset,
                y as f32 - grid_offset,
                z as f32 - grid_offset,
                1.0,
            ))
        })
        .collect();

    let at = |x: usize, y: usize, z: usize| -> f32 { lattice[z * dim * dim + y * dim + x] };

    let mut active_voxels: HashSet<u32> = HashSet::new();
    let mut edge_ids: Vec<u32> = Vec::new();
    let mut edges: HashMap<u32, EdgeInfo> = HashMap::new();

    for x in 0..grid_size {
        for y in 0..grid_size {
            for z in 0..grid_size {
                let idx_pos = IVec3::new(x as i32, y as i32, z as i32);
                let p = Vec4::new(
                    x as f32 - grid_offset,
                    y as f32 - grid_offset,
                    z as f32 - grid_offset,
                    1.0,
                );

                let p_density = at(x as usize, y as usize, z as usize);

                for axis in 0..3u32 {
                    let (qx, qy, qz) = match axis {
                        0 => (x + 1, y, z),
                        1 => (x, y + 1, z),
                        _ => (x, y, z + 1),
                    };
                    let q_density = at(qx as usize, qy as usize, qz as usize);

                    // f ≥ 0 counts as outside
                    let zero_crossing = (p_density >= 0.0) != (q_density >= 0.0);
                    if !zero_crossing {
                        continue;
                    }

                    let q = p + AXIS_OFFSET[axis as usize];
                    let t = find_intersection(sdf, p, q);
                    // Both endpoints carry w = 1, so the lerp stays homogeneous.
                    let pos = p.lerp(q, t);
                    let normal = surface_normal(sdf, pos);

                    let code = encode_edge_id(axis, x, y, z);
                    edge_ids.push(code);
                    edges.insert(
                        code,
                        EdgeInfo {
                            pos,
                            normal,
                            winding: p_density >= 0.0,
                        },
                    );

                    for offset in &EDGE_NODE_OFFSETS[axis as usize] {
                        let node_id = encode_voxel_id(idx_pos - *offset);
                        active_voxels.insert(node_id);
                    }
                }
            }
        }
    }

    // Ascending-ID order makes vertex index assignment reproducible.
    let mut voxel_ids: Vec<u32> = active_voxels.into_iter().collect();
    voxel_ids.sort_unstable();

    ActiveSets {
        voxel_ids,
        edge_ids,
        edges,
    }
}

// ── Vertex generation ───────────────────────────────────────────────

fn generate_vertex_data(active: &ActiveSets, buffer: &mut MeshBuffer) -> HashMap<u32, u32> {
    let mut vertex_indices: HashMap<u32, u32> = HashMap::with_capacity(active.voxel_ids.len());

    for &voxel_id in &active.voxel_ids {
        let mut p = [Vec4::ZERO; 12];
        let mut n = [Vec4::ZERO; 12];

        let mut idx = 0;
        for &offset in &ENCODED_EDGE_OFFSETS {
            let edge_id = voxel_id.wrapping_add(offset);
            if let Some(info) = active.edges.get(&edge_id) {
                p[idx] = info.pos;
                n[idx] = info.normal;
                idx += 1;
            }
        }

        if idx == 0 {
            // Wrapped phantom voxel at the grid boundary; nothing to solve.
            continue;
        }

        let (node_pos, _error) = qef::solve_from_points(&p[..idx], &n[..idx]);

        let mut node_normal = Vec4::ZERO;
        for normal in n.iter().take(idx) {
            node_normal += *normal;
        }
        node_normal *= 1.0 / idx as f32;

        vertex_indices.insert(voxel_id, buffer.vertices.len() as u32);
        buffer.vertices.push(MeshVertex::new(node_pos, node_normal));
    }

    vertex_indices
}

// ── Triangle generation ─────────────────────────────────────────────

fn generate_triangles(active: &ActiveSets, vertex_indices: &HashMap<u32, u32>, buffer: &mut MeshBuffer) {
    for &edge_id in &active.edge_ids {
        let info = &active.edges[&edge_id];
        let axis = edge_axis(edge_id) as usize;
        let node_id = edge_base_voxel(edge_id);

        // The four voxels sharing this edge, by pure ID arithmetic.
        let mut edge_voxels = [0u32; 4];
        let mut found = 0;
        for i in 0..4 {
            let voxel_id = node_id.wrapping_sub(ENCODED_EDGE_NODE_OFFSETS[axis * 4 + i]);
            if let Some(&index) = vertex_indices.get(&voxel_id) {
                edge_voxels[found] = index;
                found += 1;
            }
        }

        // A quad needs all four; fewer means the boundary of the active
        // region.
        if found < 4 {
            continue;
        }

        // Vertex order encodes orientation. Swapping the two branches
        // flips every surface normal in the output.
        if info.winding {
            buffer
                .triangles
                .push(MeshTriangle::new(edge_voxels[0], edge_voxels[1], edge_voxels[3]));
            buffer
                .triangles
                .push(MeshTriangle::new(edge_voxels[0], edge_voxels[3], edge_voxels[2]));
        } else {
            buffer
                .triangles
                .push(MeshTriangle::new(edge_voxels[0], edge_voxels[3], edge_voxels[1]));
            buffer
                .triangles
                .push(MeshTriangle::new(edge_voxels[0], edge_voxels[2], edge_voxels[3]));
        }
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Run Dual Contouring over `sdf` on a grid of side `grid_size`.
///
/// The grid is centred on the origin: voxel `(x, y, z)` sits at world
/// position `(x, y, z) − grid_size/2`. `grid_size` must be a power of
/// two no larger than 1024 (the packed-ID limit).
pub fn contour_sdf<F>(sdf: &F, grid_size: u32) -> MeshBuffer
where
    F: Fn(Vec4) -> f32 + Sync,
{
    assert!(
        grid_size.is_power_of_two() && grid_size <= 1024,
        "grid size must be a power of two <= 1024"
    );

    let active = find_active_voxels(sdf, grid_size);

    let mut buffer = MeshBuffer {
        vertices: Vec::with_capacity(active.voxel_ids.len()),
        triangles: Vec::with_capacity(2 * active.edge_ids.len()),
    };

    let vertex_indices = generate_vertex_data(&active, &mut buffer);
    generate_triangles(&active, &vertex_indices, &mut buffer);

    buffer
}

/// Generate the mesh for a super-primitive on a grid of side `grid_size`.
pub fn generate_mesh_sized(config: &SuperPrimitiveConfig, grid_size: u32) -> MeshBuffer {
    contour_sdf(&|p| density(config, p), grid_size)
}

/// Generate the mesh for a super-primitive at the reference resolution.
pub fn generate_mesh(config: &SuperPrimitiveConfig) -> MeshBuffer {
    generate_mesh_sized(config, VOXEL_GRID_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_intersection_linear_field() {
        // d(p) = p.x: zero at x = 0. Scanning from -1 to +1 lands on the
        // sample closest to the root.
        let sdf = |p: Vec4| p.x;
        let t = find_intersection(
            &sdf,
            Vec4::new(-1.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
        );
        assert!((t - 0.5).abs() <= 1.0 / 16.0, "t = {}", t);
    }

    #[test]
    fn test_surface_normal_points_along_gradient() {
        let sdf = |p: Vec4| p.y;
        let n = surface_normal(&sdf, Vec4::new(0.3, 0.0, -0.2, 1.0));
        assert!((n.y - 1.0).abs() < 1e-4);
        assert!(n.x.abs() < 1e-4 && n.z.abs() < 1e-4);
        assert_eq!(n.w, 0.0);
    }

    #[test]
    fn test_all_positive_sdf_is_empty() {
        let mesh = contour_sdf(&|_| 1.0, 16);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_bad_grid_size_panics() {
        let _ = contour_sdf(&|_| 1.0, 100);
    }
}
