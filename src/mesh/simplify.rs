//! Randomised iterative edge-collapse mesh simplification
//!
//! Instead of a global priority queue, every iteration samples a
//! fraction of the candidate edges, scores them with the QEF solver,
//! and lets each vertex nominate the single cheapest edge it would
//! collapse along. A collapse commits only when *both* endpoints
//! nominate the same edge, so no vertex can take part in two collapses
//! in one iteration. Conflicts resolve without locks or ordering, and
//! the same rule would hold up under concurrent evaluation with a
//! compare-and-swap minimum per vertex.
//!
//! All working sets live in pre-sized [`LinearBuffer`]s, bounded by the
//! initial edge and vertex counts; nothing reallocates inside the loop.
//!
//! Author: Moroya Sakamoto

use crate::buffer::LinearBuffer;
use crate::mesh::{MeshBuffer, MeshTriangle, MeshVertex};
use crate::qef;
use glam::Vec4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hard cap on the combined degree of a collapse's endpoints.
pub const COLLAPSE_MAX_DEGREE: i32 = 16;

/// Fixed seed for the per-iteration edge sampling; runs are reproducible.
const COLLAPSE_SEED: u64 = 42;

/// Tuning options for [`simplify_mesh`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimplifyOptions {
    /// Fraction of candidate edges sampled per iteration. More edges
    /// processed means more nomination collisions, so there is a sweet
    /// spot well below 1.
    pub edge_fraction: f32,
    /// Hard iteration cap.
    pub max_iterations: u32,
    /// Stop once the triangle count falls to this fraction of the input.
    pub target_percentage: f32,
    /// Reject collapses whose error metric (1/residual, plus the degree
    /// penalty) exceeds this.
    pub max_error: f32,
    /// Reject collapses over edges longer than this; controls how
    /// uniform the simplified mesh stays.
    pub max_edge_size: f32,
    /// Reject collapses across normals whose cosine falls below this;
    /// preserves sharp features.
    pub min_angle_cosine: f32,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        SimplifyOptions {
            edge_fraction: 0.125,
            max_iterations: 10,
            target_percentage: 0.05,
            max_error: 1.0,
            max_edge_size: 0.5,
            min_angle_cosine: 0.8,
        }
    }
}

/// Candidate edge with `min < max`, packed into a u64 for sort/compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CandidateEdge {
    min: u32,
    max: u32,
}

impl CandidateEdge {
    #[inline(always)]
    fn new(a: u32, b: u32) -> Self {
        CandidateEdge {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline(always)]
    fn key(self) -> u64 {
        (u64::from(self.min) << 32) | u64::from(self.max)
    }
}

// ── Pipeline stages ─────────────────────────────────────────────────

/// Rebuild the candidate edge list from the current triangle set.
///
/// Every triangle contributes its three edges; after a key sort, a
/// multiplicity sweep classifies each distinct edge. Multiplicity one
/// marks a boundary edge (both endpoints become boundary vertices and
/// are off limits); higher multiplicities keep one representative.
/// Boundary sets change as the mesh shrinks, so this runs per
/// iteration.
fn build_candidate_edges(
    vertices: &LinearBuffer<MeshVertex>,
    triangles: &LinearBuffer<MeshTriangle>,
    edges: &mut LinearBuffer<CandidateEdge>,
    filtered_edges: &mut LinearBuffer<CandidateEdge>,
    boundary_verts: &mut LinearBuffer<bool>,
) {
    edges.clear();
    for tri in triangles.iter() {
        let [a, b, c] = tri.indices;
        edges.push(CandidateEdge::new(a, b));
        edges.push(CandidateEdge::new(b, c));
        edges.push(CandidateEdge::new(a, c));
    }

    if edges.is_empty() {
        return;
    }

    edges.as_mut_slice().sort_unstable_by_key(|e| e.key());

    boundary_verts.resize_fill(vertices.len(), false);
    filtered_edges.clear();

    fn flush(
        edge: CandidateEdge,
        count: u32,
        filtered: &mut LinearBuffer<CandidateEdge>,
        boundary: &mut LinearBuffer<bool>,
    ) {
        if count == 1 {
            boundary[edge.min as usize] = true;
            boundary[edge.max as usize] = true;
        } else {
            filtered.push(edge);
        }
    }

    let mut prev = edges[0];
    let mut count = 1;
    for idx in 1..edges.len() {
        let curr = edges[idx];
        if curr.key() != prev.key() {
            flush(prev, count, filtered_edges, boundary_verts);
            count = 1;
        } else {
            count += 1;
        }
        prev = curr;
    }
    flush(prev, count, filtered_edges, boundary_verts);

    edges.clear();
    for edge in filtered_edges.iter() {
        if !boundary_verts[edge.min as usize] && !boundary_verts[edge.max as usize] {
            edges.push(*edge);
        }
    }
}

/// Sample and score collapse candidates; each endpoint claims its
/// cheapest edge. Returns the number of valid candidates recorded.
#[allow(clippy::too_many_arguments)]
fn find_valid_collapses(
    options: &SimplifyOptions,
    edges: &LinearBuffer<CandidateEdge>,
    vertices: &LinearBuffer<MeshVertex>,
    vertex_triangle_counts: &LinearBuffer<i32>,
    collapse_valid: &mut LinearBuffer<usize>,
    collapse_edge_id: &mut LinearBuffer<i32>,
    collapse_position: &mut LinearBuffer<Vec4>,
    collapse_normal: &mut LinearBuffer<Vec4>,
    min_edge_cost: &mut LinearBuffer<f32>,
    random_edges: &mut LinearBuffer<usize>,
) -> usize {
    let mut prng = StdRng::seed_from_u64(COLLAPSE_SEED);

    let num_random_edges = (edges.len() as f32 * options.edge_fraction) as usize;
    random_edges.clear();
    for _ in 0..num_random_edges {
        random_edges.push(prng.gen_range(0..edges.len()));
    }

    // sort the indices to improve locality
    random_edges.as_mut_slice().sort_unstable();

    min_edge_cost.resize_fill(vertices.len(), f32::MAX);

    let mut valid_collapses = 0;
    for &i in random_edges.iter() {
        let edge = edges[i];
        let v_min = &vertices[edge.min as usize];
        let v_max = &vertices[edge.max as usize];

        // prevent collapses across sharp features
        let cos_angle = v_min.normal.dot(v_max.normal);
        if cos_angle < options.min_angle_cosine {
            continue;
        }

        let delta = v_max.position - v_min.position;
        if delta.length_squared() > options.max_edge_size * options.max_edge_size {
            continue;
        }

        let degree =
            vertex_triangle_counts[edge.min as usize] + vertex_triangle_counts[edge.max as usize];
        if degree > COLLAPSE_MAX_DEGREE {
            continue;
        }

        let (pos, residual) = qef::solve_vertex_pair(v_min, v_max);

        // The user-facing metric is the reciprocal of the QEF residual.
        // A residual of zero maps to +inf and a NaN stays NaN; both are
        // degenerate solves and the collapse is rejected outright.
        if !residual.is_finite() || residual <= 0.0 || !pos.is_finite() {
            continue;
        }
        let mut error = 1.0 / residual;

        // avoid vertices becoming a 'hub' for lots of edges by penalising
        // collapses which lead to a vertex with degree > 10
        let penalty = (degree - 10).max(0);
        error += penalty as f32 * (options.max_error * 0.1);

        if !error.is_finite() || error > options.max_error {
            continue;
        }

        collapse_valid.push(i);
        collapse_normal[i] = (v_min.normal + v_max.normal) * 0.5;
        collapse_position[i] = Vec4::new(pos.x, pos.y, pos.z, 1.0);

        if error < min_edge_cost[edge.min as usize] {
            min_edge_cost[edge.min as usize] = error;
            collapse_edge_id[edge.min as usize] = i as i32;
        }
        if error < min_edge_cost[edge.max as usize] {
            min_edge_cost[edge.max as usize] = error;
            collapse_edge_id[edge.max as usize] = i as i32;
        }

        valid_collapses += 1;
    }

    valid_collapses
}

/// Commit every candidate both of whose endpoints still claim it.
///
/// The two-sided consensus is what guarantees a vertex joins at most
/// one collapse per iteration.
fn collapse_edges(
    collapse_valid: &LinearBuffer<usize>,
    edges: &LinearBuffer<CandidateEdge>,
    collapse_edge_id: &LinearBuffer<i32>,
    collapse_position: &LinearBuffer<Vec4>,
    collapse_normal: &LinearBuffer<Vec4>,
    vertices: &mut LinearBuffer<MeshVertex>,
    collapse_target: &mut LinearBuffer<i32>,
) {
    for &i in collapse_valid.iter() {
        let edge = edges[i];
        if collapse_edge_id[edge.min as usize] == i as i32
            && collapse_edge_id[edge.max as usize] == i as i32
        {
            collapse_target[edge.max as usize] = edge.min as i32;
            vertices[edge.min as usize].position = collapse_position[i];
            vertices[edge.min as usize].normal = collapse_normal[i];
        }
    }
}

/// Remap triangle indices through `collapse_target`, drop the triangles
/// that became degenerate, and rebuild the per-vertex triangle counts.
fn remove_triangles(
    collapse_target: &LinearBuffer<i32>,
    triangles: &mut LinearBuffer<MeshTriangle>,
    tri_buffer: &mut LinearBuffer<MeshTriangle>,
    vertex_triangle_counts: &mut LinearBuffer<i32>,
    num_vertices: usize,
) {
    vertex_triangle_counts.resize_fill(num_vertices, 0);
    tri_buffer.clear();

    for idx in 0..triangles.len() {
        let mut tri = triangles[idx];
        for index in tri.indices.iter_mut() {
            let t = collapse_target[*index as usize];
            if t != -1 {
                *index = t as u32;
            }
        }

        let [a, b, c] = tri.indices;
        if a == b || a == c || b == c {
            continue;
        }

        for &index in &tri.indices {
            vertex_triangle_counts[index as usize] += 1;
        }
        tri_buffer.push(tri);
    }

    triangles.swap(tri_buffer);
}

/// Remap the surviving candidate edges, dropping self-loops and
/// restoring the `min < max` ordering. Collapsed max-endpoints no
/// longer appear anywhere in the edge list after this.
fn remove_edges(
    collapse_target: &LinearBuffer<i32>,
    edges: &mut LinearBuffer<CandidateEdge>,
    edge_buffer: &mut LinearBuffer<CandidateEdge>,
) {
    edge_buffer.clear();
    for edge in edges.iter() {
        let mut min = edge.min;
        let mut max = edge.max;

        let t = collapse_target[min as usize];
        if t != -1 {
            min = t as u32;
        }
        let t = collapse_target[max as usize];
        if t != -1 {
            max = t as u32;
        }

        if min != max {
            edge_buffer.push(CandidateEdge::new(min, max));
        }
    }
    edges.swap(edge_buffer);
}

/// Drop unreferenced vertices and rewrite triangle indices densely.
/// Vertices are copied verbatim, colour included.
fn compact_vertices(vertices: &LinearBuffer<MeshVertex>, mesh: &mut MeshBuffer) -> Vec<MeshVertex> {
    let mut vertex_used = LinearBuffer::new(vertices.len());
    vertex_used.resize_fill(vertices.len(), false);

    for tri in &mesh.triangles {
        for &index in &tri.indices {
            vertex_used[index as usize] = true;
        }
    }

    let mut remapped = LinearBuffer::new(vertices.len());
    remapped.resize_fill(vertices.len(), -1i32);

    let mut compacted = Vec::with_capacity(vertices.len());
    for i in 0..vertices.len() {
        if vertex_used[i] {
            remapped[i] = compacted.len() as i32;
            compacted.push(vertices[i]);
        }
    }

    for tri in mesh.triangles.iter_mut() {
        for index in tri.indices.iter_mut() {
            *index = remapped[*index as usize] as u32;
        }
    }

    compacted
}

// ── Entry point ─────────────────────────────────────────────────────

/// Simplify `mesh` in place.
///
/// `world_space_offset` is a convenience for callers working in a
/// shifted frame: it is subtracted from every vertex on entry and added
/// back on exit. Meshes below the safety floor (fewer than 100 vertices
/// or triangles) return unchanged; an iteration that finds no valid
/// collapse ends the loop early.
pub fn simplify_mesh(mesh: &mut MeshBuffer, world_space_offset: Vec4, options: &SimplifyOptions) {
    if mesh.triangle_count() < 100 || mesh.vertex_count() < 100 {
        return;
    }

    let num_vertices = mesh.vertex_count();
    let num_triangles = mesh.triangle_count();
    let edge_capacity = num_triangles * 3;

    let mut vertices: LinearBuffer<MeshVertex> = LinearBuffer::new(num_vertices);
    vertices.copy_from(&mesh.vertices);
    for i in 0..vertices.len() {
        vertices[i].position -= world_space_offset;
    }

    let mut triangles: LinearBuffer<MeshTriangle> = LinearBuffer::new(num_triangles);
    triangles.copy_from(&mesh.triangles);

    let mut edges: LinearBuffer<CandidateEdge> = LinearBuffer::new(edge_capacity);
    let mut edge_buffer: LinearBuffer<CandidateEdge> = LinearBuffer::new(edge_capacity);
    let mut tri_buffer: LinearBuffer<MeshTriangle> = LinearBuffer::new(num_triangles);

    let mut boundary_verts: LinearBuffer<bool> = LinearBuffer::new(num_vertices);
    let mut collapse_position: LinearBuffer<Vec4> = LinearBuffer::new(edge_capacity);
    let mut collapse_normal: LinearBuffer<Vec4> = LinearBuffer::new(edge_capacity);
    let mut collapse_valid: LinearBuffer<usize> = LinearBuffer::new(edge_capacity);
    let mut collapse_edge_id: LinearBuffer<i32> = LinearBuffer::new(num_vertices);
    let mut collapse_target: LinearBuffer<i32> = LinearBuffer::new(num_vertices);
    let mut min_edge_cost: LinearBuffer<f32> = LinearBuffer::new(num_vertices);
    let mut random_edges: LinearBuffer<usize> = LinearBuffer::new(edge_capacity);

    let mut vertex_triangle_counts: LinearBuffer<i32> = LinearBuffer::new(num_vertices);
    vertex_triangle_counts.resize_fill(num_vertices, 0);
    for tri in triangles.iter() {
        for &index in &tri.indices {
            vertex_triangle_counts[index as usize] += 1;
        }
    }

    let target_triangle_count = (num_triangles as f32 * options.target_percentage) as usize;

    let mut iterations = 0;
    while triangles.len() > target_triangle_count && iterations < options.max_iterations {
        iterations += 1;

        build_candidate_edges(
            &vertices,
            &triangles,
            &mut edges,
            &mut edge_buffer,
            &mut boundary_verts,
        );
        if edges.is_empty() {
            break;
        }

        collapse_edge_id.resize_fill(num_vertices, -1);
        collapse_target.resize_fill(num_vertices, -1);
        collapse_position.resize_fill(edges.len(), Vec4::ZERO);
        collapse_normal.resize_fill(edges.len(), Vec4::ZERO);
        collapse_valid.clear();

        let count_valid_collapses = find_valid_collapses(
            options,
            &edges,
            &vertices,
            &vertex_triangle_counts,
            &mut collapse_valid,
            &mut collapse_edge_id,
            &mut collapse_position,
            &mut collapse_normal,
            &mut min_edge_cost,
            &mut random_edges,
        );
        if count_valid_collapses == 0 {
            break;
        }

        collapse_edges(
            &collapse_valid,
            &edges,
            &collapse_edge_id,
            &collapse_position,
            &collapse_normal,
            &mut vertices,
            &mut collapse_target,
        );

        remove_triangles(
            &collapse_target,
            &mut triangles,
            &mut tri_buffer,
            &mut vertex_triangle_counts,
            num_vertices,
        );
        remove_edges(&collapse_target, &mut edges, &mut edge_buffer);
    }

    mesh.triangles = triangles.as_slice().to_vec();

    let mut compacted = compact_vertices(&vertices, mesh);
    for vertex in compacted.iter_mut() {
        vertex.position += world_space_offset;
    }
    mesh.vertices = compacted;
}
