//! Fixed-order construction of the lamp shell and the diffuser.
//!
//! Later stages select faces and edges of the solids the earlier stages
//! left behind, so the order below is part of the contract: the void is cut
//! from the support before the union, the end cap is taken from the united
//! shell, and the hole goes in after the fillet.

use std::f64::consts::PI;

use lamp_kernel::{KernelBundle, KernelId, KernelIntrospect, KernelSolidHandle, TopoKind};
use lamp_types::{DesignConstants, Profile};
use tracing::{debug, info, instrument, warn};

use crate::curve::SpiralCurve;
use crate::error::{AtStage, BuildError, Stage};
use crate::profiles::{support_extent, ProfileSet};
use crate::select;

/// Curve parameter ranges of every sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRanges {
    pub shell: (f64, f64),
    pub void: (f64, f64),
    pub diffuser: (f64, f64),
    pub cutout: (f64, f64),
    pub trim: (f64, f64),
}

impl SweepRanges {
    pub fn for_curve(curve: &SpiralCurve) -> Self {
        let end = curve.final_angle();
        Self {
            shell: (0.0, end),
            void: (-PI / 2.0, PI / 2.0),
            diffuser: (-PI / 4.0, end),
            cutout: (-PI / 2.0, end + PI / 16.0),
            trim: (-PI / 2.0, PI / 4.0),
        }
    }
}

/// The two finished solids of one run.
#[derive(Debug, Clone)]
pub struct LampSolids {
    pub shell: KernelSolidHandle,
    pub diffuser: KernelSolidHandle,
}

/// Run the whole pipeline for `constants`.
#[instrument(skip_all, fields(loops = constants.loops))]
pub fn generate(
    kb: &mut dyn KernelBundle,
    constants: &DesignConstants,
) -> Result<LampSolids, BuildError> {
    constants.validate()?;
    let curve = SpiralCurve::new(constants);
    let profiles = ProfileSet::build(constants, &curve, &*kb)?;
    info!(start = ?curve.start(), end = ?curve.end(), "profiles ready");

    let shell = build_lamp_shell(kb, constants, &curve, &profiles)?;
    let diffuser = build_diffuser(kb, &curve, &profiles)?;
    Ok(LampSolids { shell, diffuser })
}

/// Sample `range` of the curve and sweep `profile` along it.
fn sweep_along(
    kb: &mut dyn KernelBundle,
    curve: &SpiralCurve,
    profile: &Profile,
    (start, stop): (f64, f64),
    stage: Stage,
) -> Result<KernelSolidHandle, BuildError> {
    curve.check_range(start, stop)?;
    let path = kb.sample_path(&|t| curve.point(t), start, stop).at(stage)?;
    let solid = kb.sweep_profile(profile, &path).at(stage)?;
    debug!(profile = profile.name(), start, stop, ?solid, "swept");
    Ok(solid)
}

fn nearest_face(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    point: [f64; 3],
    stage: Stage,
) -> Result<KernelId, BuildError> {
    let faces = select::signatures(introspect, solid, TopoKind::Face);
    match select::nearest_to(faces.iter().map(|(id, sig)| (*id, sig)), point) {
        Ok(Some(face)) => Ok(face),
        Ok(None) => {
            warn!(%stage, ?point, "solid has no faces");
            Err(BuildError::Selection {
                stage,
                reason: format!("no face near {point:?}"),
            })
        }
        Err((a, b)) => {
            warn!(%stage, ?a, ?b, "ambiguous face selection");
            Err(BuildError::Selection {
                stage,
                reason: format!("faces {a:?} and {b:?} are equally near {point:?}"),
            })
        }
    }
}

/// Shell sweep, hollowed support block, end cap, rounded vertical edges
/// and the mounting hole.
#[instrument(skip_all)]
pub fn build_lamp_shell(
    kb: &mut dyn KernelBundle,
    c: &DesignConstants,
    curve: &SpiralCurve,
    profiles: &ProfileSet,
) -> Result<KernelSolidHandle, BuildError> {
    let body = build_shell_body(kb, c, curve, profiles)?;
    let hole = mounting_hole(kb, c, profiles)?;
    let shell = kb.boolean_subtract(&body, &hole).at(Stage::HoleCut)?;
    info!(?shell, "lamp shell built");
    Ok(shell)
}

/// Everything of the lamp shell except the mounting hole.
pub fn build_shell_body(
    kb: &mut dyn KernelBundle,
    c: &DesignConstants,
    curve: &SpiralCurve,
    profiles: &ProfileSet,
) -> Result<KernelSolidHandle, BuildError> {
    let ranges = SweepRanges::for_curve(curve);
    let start = curve.start();

    let base = sweep_along(kb, curve, &profiles.main, ranges.shell, Stage::ShellSweep)?;
    let void = sweep_along(kb, curve, &profiles.negative, ranges.void, Stage::VoidSweep)?;
    let support = kb
        .extrude_profile(&profiles.support, support_extent(c, start), false)
        .at(Stage::SupportBlock)?;
    let support = kb.boolean_subtract(&support, &void).at(Stage::SupportCut)?;
    let shell = kb.boolean_union(&base, &support).at(Stage::ShellUnion)?;
    info!(?shell, "support joined");

    let anchor = [c.width / 2.0, 0.0, start[2]];
    let face = nearest_face(kb.as_introspect(), &shell, anchor, Stage::EndCap)?;
    let cap = kb
        .extrude_face(&shell, face, [-c.width, 0.0, 0.0])
        .at(Stage::EndCap)?;
    let shell = kb.boolean_union(&shell, &cap).at(Stage::EndCap)?;
    info!(?face, ?shell, "end capped");

    let edges =
        select::edges_parallel_to(kb.as_introspect(), &shell, [0.0, 0.0, 1.0], c.fillet_radius);
    if edges.is_empty() {
        warn!(radius = c.fillet_radius, "no vertical edges to round");
        return Err(BuildError::Selection {
            stage: Stage::Fillet,
            reason: format!("no vertical edges longer than {}", c.fillet_radius),
        });
    }
    debug!(count = edges.len(), "vertical edges selected");
    let shell = kb
        .fillet_edges(&shell, &edges, c.fillet_radius)
        .at(Stage::Fillet)?;
    info!(?shell, rounded = edges.len(), "vertical edges rounded");
    Ok(shell)
}

/// The through-hole cylinder, `depth` above and below the coil's start
/// height on the axis.
pub fn mounting_hole(
    kb: &mut dyn KernelBundle,
    c: &DesignConstants,
    profiles: &ProfileSet,
) -> Result<KernelSolidHandle, BuildError> {
    kb.extrude_profile(&profiles.hole, [0.0, 0.0, c.depth], true)
        .at(Stage::HoleCut)
}

/// Diffuser shell with the slot cut along its top and the insertion end
/// squared off.
#[instrument(skip_all)]
pub fn build_diffuser(
    kb: &mut dyn KernelBundle,
    curve: &SpiralCurve,
    profiles: &ProfileSet,
) -> Result<KernelSolidHandle, BuildError> {
    let ranges = SweepRanges::for_curve(curve);

    let shell = sweep_along(
        kb,
        curve,
        &profiles.diffuser_shell,
        ranges.diffuser,
        Stage::DiffuserSweep,
    )?;
    let cutout = sweep_along(kb, curve, &profiles.cutout, ranges.cutout, Stage::CutoutSweep)?;
    let body = kb.boolean_subtract(&shell, &cutout).at(Stage::DiffuserCut)?;

    let trim = sweep_along(kb, curve, &profiles.trim, ranges.trim, Stage::TrimSweep)?;
    let diffuser = kb.boolean_subtract(&body, &trim).at(Stage::DiffuserTrim)?;
    info!(?diffuser, "diffuser built");
    Ok(diffuser)
}
