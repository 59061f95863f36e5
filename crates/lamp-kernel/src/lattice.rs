//! Occupancy sampling on a fixed global lattice.
//!
//! Lattice points sit at integer multiples of the cell size, independent of
//! the solid being sampled, so two solids sampled at the same cell size
//! agree point by point and volume identities hold exactly.

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::geom::Aabb;
use crate::types::KernelError;

#[derive(Debug, Clone)]
pub struct Occupancy {
    cell_size: f64,
    /// Lattice index of the first stored point along each axis.
    origin: [i64; 3],
    dims: [usize; 3],
    bits: Vec<u64>,
}

impl Occupancy {
    /// Sample `inside` at every lattice point of `region`, padded by one
    /// layer so the border is always empty when `region` bounds the solid.
    /// Blocks of `block` points per side for which `may_intersect` is false
    /// are skipped.
    pub fn sample<F, M>(
        region: &Aabb,
        cell_size: f64,
        pad: bool,
        block: usize,
        max_points: u64,
        may_intersect: M,
        inside: F,
    ) -> Result<Self, KernelError>
    where
        F: Fn([f64; 3]) -> bool + Sync,
        M: Fn(&Aabb) -> bool + Sync,
    {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(KernelError::Other {
                message: format!("cell size must be positive, got {cell_size}"),
            });
        }
        let h = cell_size;
        let extra = if pad { 1 } else { 0 };
        let mut origin = [0i64; 3];
        let mut dims = [0usize; 3];
        if !region.is_empty() {
            for a in 0..3 {
                let lo = (region.min[a] / h).ceil() as i64 - extra;
                let hi = (region.max[a] / h).floor() as i64 + extra;
                origin[a] = lo;
                dims[a] = (hi - lo + 1).max(0) as usize;
            }
        }
        let total = dims[0] as u64 * dims[1] as u64 * dims[2] as u64;
        if total > max_points {
            return Err(KernelError::Other {
                message: format!(
                    "lattice of {total} points exceeds the limit of {max_points}; use a larger cell size"
                ),
            });
        }

        let mut occ = Self {
            cell_size: h,
            origin,
            dims,
            bits: vec![0; (total as usize + 63) / 64],
        };
        if total == 0 {
            return Ok(occ);
        }

        let block = block.max(1);
        let [nx, ny, nz] = dims;
        let slabs: Vec<usize> = (0..nz).step_by(block).collect();
        let filled: Vec<Vec<usize>> = slabs
            .par_iter()
            .map(|&k0| {
                let k1 = (k0 + block).min(nz);
                let mut hits = Vec::new();
                for j0 in (0..ny).step_by(block) {
                    let j1 = (j0 + block).min(ny);
                    for i0 in (0..nx).step_by(block) {
                        let i1 = (i0 + block).min(nx);
                        let lo = occ.position(i0, j0, k0);
                        let hi = occ.position(i1 - 1, j1 - 1, k1 - 1);
                        let bounds = Aabb { min: lo, max: hi };
                        if !may_intersect(&bounds) {
                            continue;
                        }
                        for k in k0..k1 {
                            for j in j0..j1 {
                                for i in i0..i1 {
                                    if inside(occ.position(i, j, k)) {
                                        hits.push(occ.index(i, j, k));
                                    }
                                }
                            }
                        }
                    }
                }
                hits
            })
            .collect();
        for idx in filled.into_iter().flatten() {
            occ.bits[idx / 64] |= 1 << (idx % 64);
        }
        Ok(occ)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    /// World position of stored point `(i, j, k)`.
    pub fn position(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [
            (self.origin[0] + i as i64) as f64 * self.cell_size,
            (self.origin[1] + j as i64) as f64 * self.cell_size,
            (self.origin[2] + k as i64) as f64 * self.cell_size,
        ]
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> bool {
        if i >= self.dims[0] || j >= self.dims[1] || k >= self.dims[2] {
            return false;
        }
        let idx = self.index(i, j, k);
        self.bits[idx / 64] >> (idx % 64) & 1 == 1
    }

    /// Number of occupied lattice points.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Occupied points times the cell volume.
    pub fn volume(&self) -> f64 {
        self.count() as f64 * self.cell_size.powi(3)
    }

    /// Bounds of the occupied points, grown by half a cell on every side.
    pub fn bounding_box(&self) -> Option<[f64; 6]> {
        let mut bb = Aabb::empty();
        for k in 0..self.dims[2] {
            for j in 0..self.dims[1] {
                for i in 0..self.dims[0] {
                    if self.get(i, j, k) {
                        bb.include(self.position(i, j, k));
                    }
                }
            }
        }
        (!bb.is_empty()).then(|| bb.expanded(self.cell_size / 2.0).to_array())
    }

    /// Number of face-connected (6-neighbour) groups of occupied points.
    pub fn component_count(&self) -> usize {
        self.component_sizes().len()
    }

    /// Point counts of the face-connected groups, largest first.
    pub fn component_sizes(&self) -> Vec<usize> {
        let [nx, ny, nz] = self.dims;
        let mut seen = vec![0u64; (nx * ny * nz + 63) / 64];
        let mut visit = |idx: usize| {
            let fresh = seen[idx / 64] >> (idx % 64) & 1 == 0;
            seen[idx / 64] |= 1 << (idx % 64);
            fresh
        };
        let mut queue = VecDeque::new();
        let mut sizes = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    if !self.get(i, j, k) || !visit(self.index(i, j, k)) {
                        continue;
                    }
                    let mut size = 0;
                    queue.push_back((i, j, k));
                    while let Some((x, y, z)) = queue.pop_front() {
                        size += 1;
                        let neighbours = [
                            (x.wrapping_sub(1), y, z),
                            (x + 1, y, z),
                            (x, y.wrapping_sub(1), z),
                            (x, y + 1, z),
                            (x, y, z.wrapping_sub(1)),
                            (x, y, z + 1),
                        ];
                        for (a, b, c) in neighbours {
                            if self.get(a, b, c) && visit(self.index(a, b, c)) {
                                queue.push_back((a, b, c));
                            }
                        }
                    }
                    sizes.push(size);
                }
            }
        }
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }
}
