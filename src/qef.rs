//! Quadric Error Function solver
//!
//! Given surface samples (position, unit normal), finds the point that
//! minimizes the sum of squared distances to the sample planes:
//! `Σ (nᵢ · (x − pᵢ))²`. The normal equations reduce to a symmetric
//! 3×3 system AᵀA·x = Aᵀb which is diagonalized with a fixed number of
//! Jacobi sweeps; near-zero singular values are cut off in the
//! pseudo-inverse so flat sample sets stay stable. Accumulation happens
//! relative to the mass point (sample centroid) for conditioning, and
//! the minimizer is shifted back afterwards.
//!
//! Both the contouring vertex placement and the simplifier's collapse
//! scoring go through this solver; it is deterministic and carries no
//! hidden state.
//!
//! Author: Moroya Sakamoto

use crate::mesh::MeshVertex;
use glam::{Vec3, Vec4};

const SVD_NUM_SWEEPS: usize = 5;
const PSEUDO_INVERSE_THRESHOLD: f32 = 0.1;

/// Symmetric 3×3 matrix, upper triangle only.
#[derive(Debug, Clone, Copy, Default)]
struct SMat3 {
    m00: f32,
    m01: f32,
    m02: f32,
    m11: f32,
    m12: f32,
    m22: f32,
}

impl SMat3 {
    #[inline(always)]
    fn vmul(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.m00 * v.x + self.m01 * v.y + self.m02 * v.z,
            self.m01 * v.x + self.m11 * v.y + self.m12 * v.z,
            self.m02 * v.x + self.m12 * v.y + self.m22 * v.z,
        )
    }
}

// ── Jacobi eigendecomposition ───────────────────────────────────────

#[inline(always)]
fn givens_coeffs_sym(a_pp: f32, a_pq: f32, a_qq: f32) -> (f32, f32) {
    if a_pq == 0.0 {
        return (1.0, 0.0);
    }
    let tau = (a_qq - a_pp) / (2.0 * a_pq);
    let stt = (1.0 + tau * tau).sqrt();
    let tan = 1.0 / if tau >= 0.0 { tau + stt } else { tau - stt };
    let c = 1.0 / (1.0 + tan * tan).sqrt();
    (c, tan * c)
}

#[inline(always)]
fn rotate_xy(x: f32, y: f32, c: f32, s: f32) -> (f32, f32) {
    (c * x - s * y, s * x + c * y)
}

/// Congruence update of the two diagonal entries bracketing pivot `a`.
#[inline(always)]
fn rotateq_xy(x: f32, y: f32, a: f32, c: f32, s: f32) -> (f32, f32) {
    let cc = c * c;
    let ss = s * s;
    let mx = 2.0 * c * s * a;
    (cc * x - mx + ss * y, ss * x + mx + cc * y)
}

/// One Jacobi rotation per off-diagonal element, repeated for a fixed
/// number of sweeps. `v` accumulates the eigenvectors (as rows of
/// column-coefficients, i.e. `v[i][k]` is component i of eigenvector k).
fn svd_solve_sym(mut a: SMat3, b: Vec3) -> Vec3 {
    let mut v = [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..SVD_NUM_SWEEPS {
        // pivot (0,1)
        if a.m01 != 0.0 {
            let (c, s) = givens_coeffs_sym(a.m00, a.m01, a.m11);
            let (x, y) = rotateq_xy(a.m00, a.m11, a.m01, c, s);
            a.m00 = x;
            a.m11 = y;
            let (x, y) = rotate_xy(a.m02, a.m12, c, s);
            a.m02 = x;
            a.m12 = y;
            a.m01 = 0.0;
            for row in v.iter_mut() {
                let (x, y) = rotate_xy(row[0], row[1], c, s);
                row[0] = x;
                row[1] = y;
            }
        }
        // pivot (0,2)
        if a.m02 != 0.0 {
            let (c, s) = givens_coeffs_sym(a.m00, a.m02, a.m22);
            let (x, y) = rotateq_xy(a.m00, a.m22, a.m02, c, s);
            a.m00 = x;
            a.m22 = y;
            let (x, y) = rotate_xy(a.m01, a.m12, c, s);
            a.m01 = x;
            a.m12 = y;
            a.m02 = 0.0;
            for row in v.iter_mut() {
                let (x, y) = rotate_xy(row[0], row[2], c, s);
                row[0] = x;
                row[2] = y;
            }
        }
        // pivot (1,2)
        if a.m12 != 0.0 {
            let (c, s) = givens_coeffs_sym(a.m11, a.m12, a.m22);
            let (x, y) = rotateq_xy(a.m11, a.m22, a.m12, c, s);
            a.m11 = x;
            a.m22 = y;
            let (x, y) = rotate_xy(a.m01, a.m02, c, s);
            a.m01 = x;
            a.m02 = y;
            a.m12 = 0.0;
            for row in v.iter_mut() {
                let (x, y) = rotate_xy(row[1], row[2], c, s);
                row[1] = x;
                row[2] = y;
            }
        }
    }

    // Pseudo-inverse: drop directions whose singular value falls under
    // the cutoff instead of amplifying noise along them.
    let sigma = [a.m00, a.m11, a.m22];
    let inv = |x: f32| -> f32 {
        if x.abs() < PSEUDO_INVERSE_THRESHOLD {
            0.0
        } else {
            1.0 / x
        }
    };
    let d = [inv(sigma[0]), inv(sigma[1]), inv(sigma[2])];

    let mut out = Vec3::ZERO;
    for i in 0..3 {
        let mut row = 0.0;
        for j in 0..3 {
            let o_ij = v[i][0] * d[0] * v[j][0] + v[i][1] * d[1] * v[j][1] + v[i][2] * d[2] * v[j][2];
            row += o_ij * b[j];
        }
        out[i] = row;
    }
    out
}

// ── Entry points ────────────────────────────────────────────────────

/// Solve for the point minimizing `Σ (nᵢ · (x − pᵢ))²`.
///
/// Positions and normals are consumed as homogeneous vectors; only the
/// xyz parts participate. Returns the minimizer with `w = 1` and the
/// quadratic residual at the minimizer.
pub fn solve_from_points(positions: &[Vec4], normals: &[Vec4]) -> (Vec4, f32) {
    debug_assert!(!positions.is_empty());
    debug_assert_eq!(positions.len(), normals.len());

    let mut ata = SMat3::default();
    let mut atb = Vec3::ZERO;
    let mut accum = Vec4::ZERO;

    for (p4, n4) in positions.iter().zip(normals.iter()) {
        let p = Vec3::new(p4.x, p4.y, p4.z);
        let n = Vec3::new(n4.x, n4.y, n4.z);

        ata.m00 += n.x * n.x;
        ata.m01 += n.x * n.y;
        ata.m02 += n.x * n.z;
        ata.m11 += n.y * n.y;
        ata.m12 += n.y * n.z;
        ata.m22 += n.z * n.z;

        atb += n * p.dot(n);
        accum += Vec4::new(p.x, p.y, p.z, 1.0);
    }

    let mass_point = Vec3::new(accum.x, accum.y, accum.z) / accum.w;
    let atb = atb - ata.vmul(mass_point);

    let x = svd_solve_sym(ata, atb);

    let diff = atb - ata.vmul(x);
    let error = diff.dot(diff);

    ((x + mass_point).extend(1.0), error)
}

/// Collapse-scoring entry point: solve over the two endpoints of a
/// candidate edge. Returns the proposed position (`w = 1`) and the
/// residual the simplifier turns into its error metric.
#[inline]
pub fn solve_vertex_pair(a: &MeshVertex, b: &MeshVertex) -> (Vec4, f32) {
    solve_from_points(&[a.position, b.position], &[a.normal, b.normal])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_orthogonal_planes_meet_at_corner() {
        // Planes x=1, y=2, z=3 intersect at (1,2,3).
        let positions = [
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 2.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 3.0, 1.0),
        ];
        let normals = [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
        ];
        let (x, error) = solve_from_points(&positions, &normals);
        assert!((x.x - 1.0).abs() < 1e-3, "{:?}", x);
        assert!((x.y - 2.0).abs() < 1e-3, "{:?}", x);
        assert!((x.z - 3.0).abs() < 1e-3, "{:?}", x);
        assert!(error < 1e-4, "error {}", error);
        assert_eq!(x.w, 1.0);
    }

    #[test]
    fn test_coplanar_samples_fall_back_to_mass_point() {
        // All normals along +Z: the system is rank 1; the solution must
        // stay on the plane and, with the cutoff, at the centroid in xy.
        let positions = [
            Vec4::new(-1.0, 0.0, 0.5, 1.0),
            Vec4::new(1.0, 0.0, 0.5, 1.0),
            Vec4::new(0.0, 1.0, 0.5, 1.0),
        ];
        let normals = [Vec4::new(0.0, 0.0, 1.0, 0.0); 3];
        let (x, error) = solve_from_points(&positions, &normals);
        assert!((x.z - 0.5).abs() < 1e-3, "{:?}", x);
        assert!((x.x - 0.0).abs() < 1e-3, "{:?}", x);
        assert!((x.y - 1.0 / 3.0).abs() < 1e-3, "{:?}", x);
        assert!(error < 1e-4);
    }

    #[test]
    fn test_pair_solve_on_shared_plane() {
        use crate::mesh::MeshVertex;

        let a = MeshVertex {
            position: Vec4::new(0.0, 0.0, 1.0, 1.0),
            normal: Vec4::new(0.0, 0.0, 1.0, 0.0),
            colour: Vec4::ONE,
        };
        let b = MeshVertex {
            position: Vec4::new(1.0, 0.0, 1.0, 1.0),
            normal: Vec4::new(0.0, 0.0, 1.0, 0.0),
            colour: Vec4::ONE,
        };
        let (x, error) = solve_vertex_pair(&a, &b);
        // Both planes are z=1; any point on it is exact, and the mass
        // point pull puts the answer at the midpoint.
        assert!((x.z - 1.0).abs() < 1e-3);
        assert!((x.x - 0.5).abs() < 1e-3);
        assert!(error < 1e-4);
    }

    #[test]
    fn test_solver_is_deterministic() {
        let positions = [
            Vec4::new(0.3, 0.1, 0.0, 1.0),
            Vec4::new(0.0, 0.4, 0.2, 1.0),
            Vec4::new(0.2, 0.0, 0.5, 1.0),
        ];
        let normals = [
            Vec4::new(0.8, 0.6, 0.0, 0.0),
            Vec4::new(0.0, 0.6, 0.8, 0.0),
            Vec4::new(0.6, 0.0, 0.8, 0.0),
        ];
        let (x1, e1) = solve_from_points(&positions, &normals);
        let (x2, e2) = solve_from_points(&positions, &normals);
        assert_eq!(x1.to_array().map(f32::to_bits), x2.to_array().map(f32::to_bits));
        assert_eq!(e1.to_bits(), e2.to_bits());
    }
}
