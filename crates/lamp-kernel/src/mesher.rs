//! Boolean surface nets over an [`Occupancy`] lattice.
//!
//! One vertex per cell whose eight corners disagree, placed at the average
//! of the midpoints of its sign-changing edges. Every lattice edge that
//! changes sign is surrounded by four such cells, which are joined into a
//! quad wound so its normal points from the occupied end to the empty end.

use std::collections::HashMap;

use crate::lattice::Occupancy;
use crate::types::{KernelError, RenderMesh};

/// Cube corner offsets, bit `n` of a cell mask is corner `n`.
const CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Build a closed, outward-wound triangle mesh of the occupied region.
pub fn surface_nets(occ: &Occupancy) -> Result<RenderMesh, KernelError> {
    if occ.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "solid occupies no lattice points at this cell size".into(),
        });
    }
    let [nx, ny, nz] = occ.dims();
    let cell_key = |i: usize, j: usize, k: usize| (k * ny + j) * nx + i;

    let mut positions: Vec<[f64; 3]> = Vec::new();
    let mut cell_vertex: HashMap<usize, u32> = HashMap::new();

    for k in 0..nz.saturating_sub(1) {
        for j in 0..ny.saturating_sub(1) {
            for i in 0..nx.saturating_sub(1) {
                let mut mask = 0u8;
                for (n, &(dx, dy, dz)) in CORNERS.iter().enumerate() {
                    if occ.get(i + dx, j + dy, k + dz) {
                        mask |= 1 << n;
                    }
                }
                if mask == 0 || mask == 0xff {
                    continue;
                }
                let mut acc = [0.0; 3];
                let mut n = 0.0;
                for &(a, b) in &EDGES {
                    if (mask >> a & 1) == (mask >> b & 1) {
                        continue;
                    }
                    let (ax, ay, az) = CORNERS[a];
                    let (bx, by, bz) = CORNERS[b];
                    let pa = occ.position(i + ax, j + ay, k + az);
                    let pb = occ.position(i + bx, j + by, k + bz);
                    for c in 0..3 {
                        acc[c] += 0.5 * (pa[c] + pb[c]);
                    }
                    n += 1.0;
                }
                cell_vertex.insert(cell_key(i, j, k), positions.len() as u32);
                positions.push([acc[0] / n, acc[1] / n, acc[2] / n]);
            }
        }
    }

    let vertex = |i: usize, j: usize, k: usize| -> Result<u32, KernelError> {
        cell_vertex
            .get(&cell_key(i, j, k))
            .copied()
            .ok_or_else(|| KernelError::TessellationFailed {
                reason: format!("sign change next to inactive cell ({i}, {j}, {k})"),
            })
    };

    let mut indices: Vec<u32> = Vec::new();
    let mut quad = |q: [u32; 4]| {
        indices.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
    };

    // The padded border is never occupied, so every sign-changing edge has
    // all four surrounding cells inside the lattice.
    for k in 1..nz.saturating_sub(1) {
        for j in 1..ny.saturating_sub(1) {
            for i in 0..nx.saturating_sub(1) {
                let a = occ.get(i, j, k);
                if a == occ.get(i + 1, j, k) {
                    continue;
                }
                let c00 = vertex(i, j - 1, k - 1)?;
                let c10 = vertex(i, j, k - 1)?;
                let c11 = vertex(i, j, k)?;
                let c01 = vertex(i, j - 1, k)?;
                quad(if a {
                    [c00, c10, c11, c01]
                } else {
                    [c00, c01, c11, c10]
                });
            }
        }
    }
    for k in 1..nz.saturating_sub(1) {
        for j in 0..ny.saturating_sub(1) {
            for i in 1..nx.saturating_sub(1) {
                let a = occ.get(i, j, k);
                if a == occ.get(i, j + 1, k) {
                    continue;
                }
                let c00 = vertex(i - 1, j, k - 1)?;
                let c10 = vertex(i, j, k - 1)?;
                let c11 = vertex(i, j, k)?;
                let c01 = vertex(i - 1, j, k)?;
                quad(if a {
                    [c00, c01, c11, c10]
                } else {
                    [c00, c10, c11, c01]
                });
            }
        }
    }
    for k in 0..nz.saturating_sub(1) {
        for j in 1..ny.saturating_sub(1) {
            for i in 1..nx.saturating_sub(1) {
                let a = occ.get(i, j, k);
                if a == occ.get(i, j, k + 1) {
                    continue;
                }
                let c00 = vertex(i - 1, j - 1, k)?;
                let c10 = vertex(i, j - 1, k)?;
                let c11 = vertex(i, j, k)?;
                let c01 = vertex(i - 1, j, k)?;
                quad(if a {
                    [c00, c10, c11, c01]
                } else {
                    [c00, c01, c11, c10]
                });
            }
        }
    }

    let normals = vertex_normals(&positions, &indices);
    Ok(RenderMesh {
        vertices: positions
            .iter()
            .flat_map(|p| p.iter().map(|&c| c as f32))
            .collect(),
        normals,
        indices,
    })
}

/// Area-weighted vertex normals.
fn vertex_normals(positions: &[[f64; 3]], indices: &[u32]) -> Vec<f32> {
    let mut acc = vec![[0.0f64; 3]; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (positions[a], positions[b], positions[c]);
        let u = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
        let v = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        for idx in [a, b, c] {
            for axis in 0..3 {
                acc[idx][axis] += n[axis];
            }
        }
    }
    acc.iter()
        .flat_map(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            let n = if len > 0.0 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 0.0, 1.0]
            };
            n.map(|c| c as f32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Aabb;
    use std::collections::HashMap;

    fn occupancy(region: [f64; 6], cell: f64, inside: impl Fn([f64; 3]) -> bool + Sync) -> Occupancy {
        Occupancy::sample(&Aabb::from_array(region), cell, true, 8, u64::MAX, |_| true, inside)
            .unwrap()
    }

    fn signed_volume(mesh: &RenderMesh) -> f64 {
        let v = |i: u32| {
            let i = i as usize * 3;
            [
                mesh.vertices[i] as f64,
                mesh.vertices[i + 1] as f64,
                mesh.vertices[i + 2] as f64,
            ]
        };
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (v(t[0]), v(t[1]), v(t[2]));
                (a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                    + a[2] * (b[0] * c[1] - b[1] * c[0]))
                    / 6.0
            })
            .sum()
    }

    fn directed_edges_balance(mesh: &RenderMesh) -> bool {
        let mut count: HashMap<(u32, u32), i64> = HashMap::new();
        for t in mesh.indices.chunks_exact(3) {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *count.entry((a, b)).or_default() += 1;
                *count.entry((b, a)).or_default() -= 1;
            }
        }
        count.values().all(|&c| c == 0)
    }

    #[test]
    fn cube_mesh_is_closed_and_outward() {
        let occ = occupancy([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], 0.25, |p| {
            p.iter().all(|c| c.abs() <= 1.0)
        });
        let mesh = surface_nets(&occ).unwrap();
        assert!(mesh.triangle_count() > 0);
        assert!(directed_edges_balance(&mesh));
        let vol = signed_volume(&mesh);
        assert!(vol > 0.0, "inward winding, volume {vol}");
        // Faces sit half a cell outside the occupied points, corners are chamfered.
        assert!(vol > 8.0 && vol < 2.25f64.powi(3), "volume {vol}");
    }

    #[test]
    fn normals_point_away_from_centre() {
        let occ = occupancy([-2.0, -2.0, -2.0, 2.0, 2.0, 2.0], 0.2, |p| {
            p[0] * p[0] + p[1] * p[1] + p[2] * p[2] <= 2.25
        });
        let mesh = surface_nets(&occ).unwrap();
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        for (p, n) in mesh.vertices.chunks_exact(3).zip(mesh.normals.chunks_exact(3)) {
            let dot = p[0] * n[0] + p[1] * n[1] + p[2] * n[2];
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn empty_occupancy_fails() {
        let occ = occupancy([0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 0.5, |_| false);
        assert!(matches!(
            surface_nets(&occ),
            Err(KernelError::TessellationFailed { .. })
        ));
    }
}
