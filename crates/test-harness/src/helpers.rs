//! Helper functions: error type and mesh math.

use std::collections::HashMap;

use lamp_core::BuildError;
use lamp_kernel::{KernelError, RenderMesh};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("no solid named {name}")]
    NoSolid { name: String },

    #[error("pipeline stage needs {needs} first")]
    OutOfOrder { needs: &'static str },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Mesh Math Utilities ─────────────────────────────────────────────────────

/// Compute axis-aligned bounding box of a RenderMesh. Returns (min, max).
pub fn mesh_bounding_box(mesh: &RenderMesh) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for chunk in mesh.vertices.chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(chunk[i]);
            max[i] = max[i].max(chunk[i]);
        }
    }
    (min, max)
}

/// Signed volume of a triangle mesh by the divergence theorem.
///
/// Positive for a closed mesh wound outward.
pub fn mesh_signed_volume(mesh: &RenderMesh) -> f64 {
    let v = |i: u32| {
        let i = i as usize * 3;
        [
            mesh.vertices[i] as f64,
            mesh.vertices[i + 1] as f64,
            mesh.vertices[i + 2] as f64,
        ]
    };
    let six_v: f64 = mesh
        .indices
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (v(t[0]), v(t[1]), v(t[2]));
            a[0] * (b[1] * c[2] - b[2] * c[1]) + a[1] * (b[2] * c[0] - b[0] * c[2])
                + a[2] * (b[0] * c[1] - b[1] * c[0])
        })
        .sum();
    six_v / 6.0
}

/// Directed edges of the mesh that are not matched by a reverse edge.
///
/// Zero for a closed, consistently oriented mesh.
pub fn unmatched_edges(mesh: &RenderMesh) -> usize {
    let mut balance: HashMap<(u32, u32), i64> = HashMap::new();
    for t in mesh.indices.chunks_exact(3) {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            let (key, step) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
            *balance.entry(key).or_default() += step;
        }
    }
    balance.values().filter(|&&c| c != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> RenderMesh {
        RenderMesh {
            vertices: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0,
                0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
            ],
            normals: vec![0.0; 24],
            indices: vec![
                0, 2, 1, 0, 3, 2, // bottom
                4, 5, 6, 4, 6, 7, // top
                0, 1, 5, 0, 5, 4, // front
                2, 3, 7, 2, 7, 6, // back
                0, 4, 7, 0, 7, 3, // left
                1, 2, 6, 1, 6, 5, // right
            ],
        }
    }

    #[test]
    fn bounding_box_of_unit_cube_mesh() {
        let (min, max) = mesh_bounding_box(&unit_cube());
        assert_eq!(min, [0.0, 0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn outward_cube_has_positive_unit_volume() {
        let v = mesh_signed_volume(&unit_cube());
        assert!((v - 1.0).abs() < 1e-12, "volume {v}");
    }

    #[test]
    fn closed_cube_has_no_unmatched_edges() {
        assert_eq!(unmatched_edges(&unit_cube()), 0);
        let mut open = unit_cube();
        open.indices.truncate(30);
        assert!(unmatched_edges(&open) > 0);
    }
}
