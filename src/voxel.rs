//! Packed voxel and edge identifiers
//!
//! Voxel coordinates pack into a `u32` as `x:10 | y:10 | z:10 | unused:2`,
//! which covers grids up to 1024³. Edge IDs reuse the voxel layout with
//! the axis stored in the top two bits. All adjacency queries reduce to
//! integer additions against the precomputed tables below, so the mesh
//! generation stages never convert back to 3D coordinates.
//!
//! Author: Moroya Sakamoto

use glam::{IVec3, Vec4};

/// Side length of the dense voxel grid.
pub const VOXEL_GRID_SIZE: u32 = 128;

/// World-space offset that centres the grid on the origin.
pub const VOXEL_GRID_OFFSET: f32 = VOXEL_GRID_SIZE as f32 / 2.0;

/// Unit world-space step along each grid axis.
pub const AXIS_OFFSET: [Vec4; 3] = [
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
];

/// Coordinate offsets of the four voxels sharing the edge along `axis`
/// anchored at a base voxel. The offsets are *subtracted* from the edge's
/// base coordinate. The row order here fixes the vertex order used when
/// emitting quads, so it must not be reordered.
pub const EDGE_NODE_OFFSETS: [[IVec3; 4]; 3] = [
    [
        IVec3::new(0, 0, 0),
        IVec3::new(0, 0, 1),
        IVec3::new(0, 1, 0),
        IVec3::new(0, 1, 1),
    ],
    [
        IVec3::new(0, 0, 0),
        IVec3::new(1, 0, 0),
        IVec3::new(0, 0, 1),
        IVec3::new(1, 0, 1),
    ],
    [
        IVec3::new(0, 0, 0),
        IVec3::new(0, 1, 0),
        IVec3::new(1, 0, 0),
        IVec3::new(1, 1, 0),
    ],
];

// The two tables below are EDGE_NODE_OFFSETS pre-baked into the packed-ID
// arithmetic: expand an ID to coordinates, apply the offset, re-pack, and
// subtract the base ID. Keeping them as literals makes the adjacency a
// single integer add/sub at runtime.

/// Packed-ID deltas from an edge's base voxel ID to the four voxel IDs
/// sharing that edge (row-major: axis, then node index).
pub const ENCODED_EDGE_NODE_OFFSETS: [u32; 12] = [
    0x0000_0000,
    0x0010_0000,
    0x0000_0400,
    0x0010_0400,
    0x0000_0000,
    0x0000_0001,
    0x0010_0000,
    0x0010_0001,
    0x0000_0000,
    0x0000_0400,
    0x0000_0001,
    0x0000_0401,
];

/// Packed edge-ID deltas from a voxel ID to its 12 incident edges,
/// axis bits included.
pub const ENCODED_EDGE_OFFSETS: [u32; 12] = [
    0x0000_0000,
    0x0010_0000,
    0x0000_0400,
    0x0010_0400,
    0x4000_0000,
    0x4010_0000,
    0x4000_0001,
    0x4010_0001,
    0x8000_0000,
    0x8000_0400,
    0x8000_0001,
    0x8000_0401,
];

/// Pack integer voxel coordinates into a unique 32-bit ID.
#[inline(always)]
pub fn encode_voxel_id(idx_pos: IVec3) -> u32 {
    (idx_pos.x as u32 & 0x3ff) | ((idx_pos.y as u32 & 0x3ff) << 10) | ((idx_pos.z as u32 & 0x3ff) << 20)
}

/// Unpack a voxel ID back into integer coordinates.
#[inline(always)]
pub fn decode_voxel_id(id: u32) -> IVec3 {
    IVec3::new(
        (id & 0x3ff) as i32,
        ((id >> 10) & 0x3ff) as i32,
        ((id >> 20) & 0x3ff) as i32,
    )
}

/// Pack an edge identifier: the base voxel plus the axis in the top bits.
#[inline(always)]
pub fn encode_edge_id(axis: u32, x: u32, y: u32, z: u32) -> u32 {
    (x & 0x3ff) | ((y & 0x3ff) << 10) | ((z & 0x3ff) << 20) | (axis << 30)
}

/// Axis stored in an edge ID.
#[inline(always)]
pub fn edge_axis(id: u32) -> u32 {
    id >> 30
}

/// Strip the axis bits, leaving the base voxel ID.
#[inline(always)]
pub fn edge_base_voxel(id: u32) -> u32 {
    id & !0xc000_0000
}
