//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a test collect all failures in one pass.

use lamp_kernel::{KernelBundle, KernelError, KernelIntrospect, KernelSolidHandle, RenderMesh};
use lamp_types::{Point2, Profile, Winding};
use serde::Serialize;

use crate::helpers::{mesh_signed_volume, unmatched_edges};

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }

    fn kernel_error(name: &str, err: KernelError) -> Self {
        Self::fail(name, format!("kernel error: {err}"))
    }
}

// ── Profile Oracles ─────────────────────────────────────────────────────────

/// Check that the loop returns to its start within `tolerance`.
pub fn check_profile_closure(profile: &Profile, tolerance: f64) -> OracleVerdict {
    let gap = profile.closure_gap();
    if gap <= tolerance {
        OracleVerdict::pass_val(
            "profile_closure",
            format!("{} closes with gap {:.2e} (tol {})", profile.name(), gap, tolerance),
            gap,
        )
    } else {
        OracleVerdict::fail_val(
            "profile_closure",
            format!("{} leaves a gap of {} (tol {})", profile.name(), gap, tolerance),
            gap,
        )
    }
}

/// Check that no two segments of the loop cross or touch.
pub fn check_profile_simple(profile: &Profile) -> OracleVerdict {
    match profile.self_intersection() {
        None => OracleVerdict::pass(
            "profile_simple",
            format!("{}: {} segments, no crossings", profile.name(), profile.segments().len()),
        ),
        Some((a, b)) => OracleVerdict::fail(
            "profile_simple",
            format!("{}: segments {} and {} intersect", profile.name(), a, b),
        ),
    }
}

/// Check the traversal direction of the loop.
pub fn check_profile_winding(profile: &Profile, expected: Winding) -> OracleVerdict {
    let actual = profile.winding();
    if actual == expected {
        OracleVerdict::pass_val(
            "profile_winding",
            format!("{} is {:?}", profile.name(), actual),
            profile.signed_area(),
        )
    } else {
        OracleVerdict::fail_val(
            "profile_winding",
            format!("{} is {:?}, expected {:?}", profile.name(), actual, expected),
            profile.signed_area(),
        )
    }
}

fn distance_to_polyline(poly: &[Point2], p: Point2) -> f64 {
    (0..poly.len())
        .map(|i| {
            let a = poly[i];
            let b = poly[(i + 1) % poly.len()];
            let d = [b[0] - a[0], b[1] - a[1]];
            let len2 = d[0] * d[0] + d[1] * d[1];
            let s = if len2 > 0.0 {
                (((p[0] - a[0]) * d[0] + (p[1] - a[1]) * d[1]) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (p[0] - a[0] - s * d[0]).hypot(p[1] - a[1] - s * d[1])
        })
        .fold(f64::INFINITY, f64::min)
}

/// Check that every point of `inner` lies inside `outer` at exactly
/// `thickness` from its boundary.
///
/// `step` sets the sampling density of both outlines; the outer outline is
/// sampled ten times finer so chord error stays below `tolerance`.
pub fn check_wall_thickness(
    inner: &Profile,
    outer: &Profile,
    thickness: f64,
    step: f64,
    tolerance: f64,
) -> OracleVerdict {
    let outer_poly = outer.discretize(step / 10.0);
    let mut worst = 0.0f64;
    let mut worst_at = [0.0; 2];
    for p in inner.discretize(step) {
        if !outer.contains(p) {
            return OracleVerdict::fail(
                "wall_thickness",
                format!("{} point {:?} lies outside {}", inner.name(), p, outer.name()),
            );
        }
        let err = (distance_to_polyline(&outer_poly, p) - thickness).abs();
        if err > worst {
            worst = err;
            worst_at = p;
        }
    }
    if worst <= tolerance {
        OracleVerdict::pass_val(
            "wall_thickness",
            format!(
                "{} around {} holds {} within {:.2e}",
                outer.name(),
                inner.name(),
                thickness,
                worst
            ),
            worst,
        )
    } else {
        OracleVerdict::fail_val(
            "wall_thickness",
            format!(
                "wall deviates by {:.4} at {:?} (tol {})",
                worst, worst_at, tolerance
            ),
            worst,
        )
    }
}

// ── Solid Oracles ───────────────────────────────────────────────────────────

/// Check that the solid occupies lattice points at `cell_size`.
pub fn check_positive_volume(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    cell_size: f64,
) -> OracleVerdict {
    match introspect.volume(solid, cell_size) {
        Ok(v) if v > 0.0 => OracleVerdict::pass_val(
            "positive_volume",
            format!("volume {:.1} at cell {}", v, cell_size),
            v,
        ),
        Ok(v) => OracleVerdict::fail_val(
            "positive_volume",
            format!("no lattice points inside at cell {}", cell_size),
            v,
        ),
        Err(e) => OracleVerdict::kernel_error("positive_volume", e),
    }
}

/// Check that the solid is one body.
///
/// Lattice sampling can isolate a few points inside features thinner than
/// a cell, so up to `max_stray` points outside the largest group are
/// tolerated; any larger second group is a detached piece.
pub fn check_single_body(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    cell_size: f64,
    max_stray: usize,
) -> OracleVerdict {
    let occupancy = match introspect.occupancy(solid, cell_size) {
        Ok(o) => o,
        Err(e) => return OracleVerdict::kernel_error("single_body", e),
    };
    let sizes = occupancy.component_sizes();
    let Some((&main, rest)) = sizes.split_first() else {
        return OracleVerdict::fail("single_body", "solid is empty".to_string());
    };
    let stray: usize = rest.iter().sum();
    if stray <= max_stray {
        OracleVerdict::pass_val(
            "single_body",
            format!(
                "{} points in the main body, {} stray in {} groups",
                main,
                stray,
                rest.len()
            ),
            sizes.len() as f64,
        )
    } else {
        OracleVerdict::fail_val(
            "single_body",
            format!(
                "{} groups: largest {}, next {:?}",
                sizes.len(),
                main,
                &rest[..rest.len().min(5)]
            ),
            sizes.len() as f64,
        )
    }
}

/// Check the sampled bounding box against `expected` within `tolerance`
/// on every side.
pub fn check_bounding_box(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    cell_size: f64,
    expected: [f64; 6],
    tolerance: f64,
) -> OracleVerdict {
    let actual = match introspect.bounding_box(solid, cell_size) {
        Ok(Some(b)) => b,
        Ok(None) => return OracleVerdict::fail("bounding_box", "solid is empty".to_string()),
        Err(e) => return OracleVerdict::kernel_error("bounding_box", e),
    };
    for i in 0..6 {
        if (actual[i] - expected[i]).abs() > tolerance {
            return OracleVerdict::fail(
                "bounding_box",
                format!(
                    "bound {}: expected {:.3}, got {:.3} (tol={})",
                    i, expected[i], actual[i], tolerance
                ),
            );
        }
    }
    OracleVerdict::pass(
        "bounding_box",
        format!(
            "({:.1},{:.1},{:.1}) -> ({:.1},{:.1},{:.1})",
            actual[0], actual[1], actual[2], actual[3], actual[4], actual[5],
        ),
    )
}

/// Check that subtracting `tool` from `before` removed exactly the part of
/// `before` inside `tool`, sampled at `cell_size` within `region`.
///
/// The removed volume is reported as the verdict's value.
pub fn check_cut_volume(
    kb: &mut dyn KernelBundle,
    before: &KernelSolidHandle,
    after: &KernelSolidHandle,
    tool: &KernelSolidHandle,
    region: [f64; 6],
    cell_size: f64,
) -> OracleVerdict {
    const NAME: &str = "cut_volume";
    let overlap = match kb.boolean_intersect(before, tool) {
        Ok(o) => o,
        Err(e) => return OracleVerdict::kernel_error(NAME, e),
    };
    let introspect = kb.as_introspect();
    let volumes = introspect
        .volume_within(before, region, cell_size)
        .and_then(|b| Ok((b, introspect.volume_within(after, region, cell_size)?)))
        .and_then(|(b, a)| Ok((b, a, introspect.volume_within(&overlap, region, cell_size)?)));
    let (before_v, after_v, removed) = match volumes {
        Ok(v) => v,
        Err(e) => return OracleVerdict::kernel_error(NAME, e),
    };
    let slack = 1e-9 * before_v.max(1.0);
    if removed > 0.0 && (before_v - removed - after_v).abs() <= slack {
        OracleVerdict::pass_val(
            NAME,
            format!("{:.3} - {:.3} = {:.3}", before_v, removed, after_v),
            removed,
        )
    } else {
        OracleVerdict::fail_val(
            NAME,
            format!(
                "before {:.3}, removed {:.3}, after {:.3}",
                before_v, removed, after_v
            ),
            removed,
        )
    }
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Check that the mesh is watertight: every directed edge is matched by the
/// same edge in the opposite direction.
pub fn check_watertight_mesh(mesh: &RenderMesh) -> OracleVerdict {
    let unmatched = unmatched_edges(mesh);
    if unmatched == 0 {
        OracleVerdict::pass(
            "watertight_mesh",
            format!("all edges of {} triangles paired", mesh.triangle_count()),
        )
    } else {
        OracleVerdict::fail_val(
            "watertight_mesh",
            format!(
                "{} unpaired edges in {} triangles",
                unmatched,
                mesh.triangle_count()
            ),
            unmatched as f64,
        )
    }
}

/// Check that the mesh encloses positive volume, i.e. is wound outward.
pub fn check_outward_winding(mesh: &RenderMesh) -> OracleVerdict {
    let v = mesh_signed_volume(mesh);
    if v > 0.0 {
        OracleVerdict::pass_val("outward_winding", format!("signed volume {:.1}", v), v)
    } else {
        OracleVerdict::fail_val(
            "outward_winding",
            format!("signed volume {:.1} is not positive", v),
            v,
        )
    }
}

/// Check that all index values are within bounds.
pub fn check_valid_indices(mesh: &RenderMesh) -> OracleVerdict {
    let vertex_count = mesh.vertex_count();
    let bad: Vec<(usize, u32)> = mesh
        .indices
        .iter()
        .enumerate()
        .filter(|(_, &idx)| idx as usize >= vertex_count)
        .map(|(i, &idx)| (i, idx))
        .collect();

    if bad.is_empty() && mesh.indices.len() % 3 == 0 {
        OracleVerdict::pass("valid_indices", format!("all indices < {}", vertex_count))
    } else {
        OracleVerdict::fail(
            "valid_indices",
            format!(
                "{} out-of-bounds indices (vertex_count={}), {} trailing: {:?}",
                bad.len(),
                vertex_count,
                mesh.indices.len() % 3,
                &bad[..bad.len().min(5)]
            ),
        )
    }
}

/// Check that all stored normals have approximately unit length.
pub fn check_unit_normals(mesh: &RenderMesh) -> OracleVerdict {
    let bad = mesh
        .normals
        .chunks_exact(3)
        .filter(|n| ((n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt() - 1.0).abs() > 0.01)
        .count();
    if bad == 0 && mesh.normals.len() == mesh.vertices.len() {
        OracleVerdict::pass(
            "unit_normals",
            format!("all {} normals are unit length", mesh.vertex_count()),
        )
    } else {
        OracleVerdict::fail(
            "unit_normals",
            format!(
                "{} of {} normals are not unit length",
                bad,
                mesh.normals.len() / 3
            ),
        )
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Closure, simplicity and winding of one profile.
pub fn run_profile_checks(profile: &Profile, tolerance: f64) -> Vec<OracleVerdict> {
    vec![
        check_profile_closure(profile, tolerance),
        check_profile_simple(profile),
        check_profile_winding(profile, Winding::Clockwise),
    ]
}

/// Run all mesh checks.
pub fn run_all_mesh_checks(mesh: &RenderMesh) -> Vec<OracleVerdict> {
    vec![
        check_valid_indices(mesh),
        check_watertight_mesh(mesh),
        check_outward_winding(mesh),
        check_unit_normals(mesh),
    ]
}

/// Volume and connectivity of a finished solid.
pub fn run_solid_checks(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    cell_size: f64,
    max_stray: usize,
) -> Vec<OracleVerdict> {
    vec![
        check_positive_volume(introspect, solid, cell_size),
        check_single_body(introspect, solid, cell_size, max_stray),
    ]
}
