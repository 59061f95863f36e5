//! Cross-sections of the shell and the diffuser.
//!
//! Every swept section is drawn in the meridional plane through the top of
//! the coil, `u` pointing away from the axis and `v` up, and traced
//! clockwise. Dimensions derive from the design constants alone, except the
//! void and the support, which reach back to the coil's start point.

use lamp_kernel::Kernel;
use lamp_types::{trace, DesignConstants, Placement, Profile, ProfileError, Step, Winding};
use tracing::{debug, instrument};

use crate::curve::SpiralCurve;
use crate::error::{AtStage, BuildError, Stage};

/// Vertical shoulder of the shell below the top slab.
fn body_height(c: &DesignConstants) -> f64 {
    c.cross_section_height() - c.edge_height()
}

/// Floor of the recess between the lips.
fn recess_floor(c: &DesignConstants) -> f64 {
    -body_height(c) + c.lip_depth
}

/// Shell wall: a full-width top slab over a narrower body with a lip at
/// each lower corner.
pub fn main_profile(c: &DesignConstants, placement: Placement) -> Result<Profile, ProfileError> {
    let cs_w = c.cross_section_width();
    let edge = c.edge_height();
    let body = body_height(c);
    trace(
        "main",
        placement,
        [-cs_w / 2.0, c.cross_section_height() / 2.0],
        &[
            Step::Line(cs_w, 0.0),
            Step::Line(0.0, -edge),
            Step::Line(-c.diffuser_thickness, 0.0),
            Step::Line(0.0, -body),
            Step::Line(-c.lip_thickness, 0.0),
            Step::Line(0.0, c.lip_depth),
            Step::Line(-c.width, 0.0),
            Step::Line(0.0, -c.lip_depth),
            Step::Line(-c.lip_thickness, 0.0),
            Step::Line(0.0, body),
            Step::Line(-c.diffuser_thickness, 0.0),
            Step::Line(0.0, edge),
            Step::Close,
        ],
        c.tolerance,
    )
}

/// How far the void reaches inward from the section origin: past the axis
/// end of the support block.
fn void_reach(c: &DesignConstants, start: [f64; 3]) -> f64 {
    start[0] + c.lip_thickness + c.width / 2.0
}

/// Void that hollows the support block around the coil's first section.
///
/// A box from `-reach` to `2·width` across and `depth` below to `2·depth`
/// above the recess floor, minus the shell outline and a corridor from the
/// box's inner edge to the shell through the full body height. What the
/// void leaves of the support is the corridor, which becomes the hub arm,
/// and a continuation of the shell itself.
pub fn negative_profile(
    c: &DesignConstants,
    start: [f64; 3],
    placement: Placement,
) -> Result<Profile, ProfileError> {
    let half = c.cross_section_width() / 2.0;
    let edge = c.edge_height();
    let body = body_height(c);
    let floor = recess_floor(c);
    let reach = void_reach(c, start);
    let far = 2.0 * c.width;
    let top = floor + 2.0 * c.depth;
    trace(
        "negative",
        placement,
        [half, edge],
        &[
            Step::Line(-(half + reach), 0.0),
            Step::Line(0.0, top - edge),
            Step::Line(reach + far, 0.0),
            Step::Line(0.0, -3.0 * c.depth),
            Step::Line(-(reach + far), 0.0),
            Step::Line(0.0, c.depth),
            Step::Line(reach - (half - c.diffuser_thickness), 0.0),
            Step::Line(0.0, -c.lip_depth),
            Step::Line(c.lip_thickness, 0.0),
            Step::Line(0.0, c.lip_depth),
            Step::Line(c.width, 0.0),
            Step::Line(0.0, -c.lip_depth),
            Step::Line(c.lip_thickness, 0.0),
            Step::Line(0.0, body),
            Step::Line(c.diffuser_thickness, 0.0),
            Step::Close,
        ],
        c.tolerance,
    )
}

/// Support block section in the `YZ` plane at `x = width/2`, centred on
/// the coil's start height.
pub fn support_profile(c: &DesignConstants, start: [f64; 3]) -> Result<Profile, ProfileError> {
    Profile::rectangle(
        "support",
        Placement::yz([c.width / 2.0, 0.0, 0.0]),
        [0.0, start[2]],
        c.width + 2.0 * c.lip_thickness,
        1.8 * c.depth,
        c.tolerance,
    )
}

/// Extrusion of the support block: from `x = width/2` to just past the
/// coil's start.
pub fn support_extent(c: &DesignConstants, start: [f64; 3]) -> [f64; 3] {
    [start[0] + c.width / 2.0, 0.0, 0.0]
}

/// Key dimensions of the diffuser channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffuserDims {
    /// Inner width.
    pub width: f64,
    /// `v` of the open top.
    pub top: f64,
    /// Height of the straight sides.
    pub side: f64,
    /// `v` where the sides meet the bottom arc.
    pub bottom: f64,
    /// `v` of the lowest point of the arc.
    pub sag: f64,
}

impl DiffuserDims {
    pub fn new(c: &DesignConstants) -> Self {
        let width = c.cross_section_width() - 2.0 * c.diffuser_thickness + c.diffuser_tolerance;
        let top = (c.depth + c.lip_depth) / 2.0 - c.edge_height() - c.diffuser_gap;
        let side = body_height(c) - c.diffuser_gap + c.diffuser_tolerance;
        Self {
            width,
            top,
            side,
            bottom: top - side,
            sag: -side - c.diffuser_curve,
        }
    }
}

/// Diffuser channel interior: straight sides closed by an arc underneath.
pub fn diffuser_core(c: &DesignConstants, placement: Placement) -> Result<Profile, ProfileError> {
    let d = DiffuserDims::new(c);
    let half = d.width / 2.0;
    trace(
        "diffuser-core",
        placement,
        [-half, d.top],
        &[
            Step::Line(d.width, 0.0),
            Step::Line(0.0, -d.side),
            Step::Arc {
                via: [-half, d.sag - d.bottom],
                to: [-d.width, 0.0],
            },
            Step::Close,
        ],
        c.tolerance,
    )
}

/// Core plus the cap band that opens the slot along the shell's top.
pub fn cutout_profile(c: &DesignConstants, placement: Placement) -> Result<Profile, ProfileError> {
    let d = DiffuserDims::new(c);
    let half = d.width / 2.0;
    let band = 1.1 * c.diffuser_thickness;
    let cap_base = d.top - c.tolerance;
    trace(
        "cutout",
        placement,
        [-half - band, cap_base + band],
        &[
            Step::Line(d.width + 2.0 * band, 0.0),
            Step::Line(0.0, -band),
            Step::Line(-band, 0.0),
            Step::Line(0.0, d.bottom - cap_base),
            Step::Arc {
                via: [-half, d.sag - d.bottom],
                to: [-d.width, 0.0],
            },
            Step::Line(0.0, cap_base - d.bottom),
            Step::Line(-band, 0.0),
            Step::Close,
        ],
        c.tolerance,
    )
}

/// Squares off the diffuser's insertion end.
pub fn trim_profile(c: &DesignConstants, placement: Placement) -> Result<Profile, ProfileError> {
    let cs_w = c.cross_section_width();
    trace(
        "trim",
        placement,
        [-cs_w / 2.0, c.cross_section_height() / 2.0],
        &[
            Step::Line(cs_w - c.diffuser_thickness - c.diffuser_tolerance, 0.0),
            Step::Line(0.0, -c.depth - c.diffuser_tolerance),
            Step::Line(-2.0 * c.width, 0.0),
            Step::Close,
        ],
        c.tolerance,
    )
}

/// Mounting hole in the hub, on the axis at the coil's start height.
pub fn hole_profile(c: &DesignConstants, start: [f64; 3]) -> Result<Profile, ProfileError> {
    Profile::circle(
        "hole",
        Placement::xy([0.0, 0.0, start[2]]),
        [0.0, 0.0],
        c.hole_diameter / 2.0,
        c.tolerance,
    )
}

/// Every profile the assembler sweeps or extrudes.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub main: Profile,
    pub negative: Profile,
    pub support: Profile,
    pub diffuser_core: Profile,
    pub diffuser_shell: Profile,
    pub cutout: Profile,
    pub trim: Profile,
    pub hole: Profile,
}

impl ProfileSet {
    /// Build and verify all profiles. The diffuser shell is the core grown
    /// by the diffuser wall thickness with the kernel's offset.
    #[instrument(skip_all)]
    pub fn build<K: Kernel + ?Sized>(
        c: &DesignConstants,
        curve: &SpiralCurve,
        kernel: &K,
    ) -> Result<Self, BuildError> {
        let start = curve.start();
        let placement = Placement::meridional(start);

        let diffuser_core = diffuser_core(c, placement).at(Stage::Profiles)?;
        let diffuser_shell = kernel
            .offset_profile(&diffuser_core, c.diffuser_thickness)
            .at(Stage::Profiles)?
            .with_name("diffuser-shell");

        let set = Self {
            main: main_profile(c, placement).at(Stage::Profiles)?,
            negative: negative_profile(c, start, placement).at(Stage::Profiles)?,
            support: support_profile(c, start).at(Stage::Profiles)?,
            diffuser_core,
            diffuser_shell,
            cutout: cutout_profile(c, placement).at(Stage::Profiles)?,
            trim: trim_profile(c, placement).at(Stage::Profiles)?,
            hole: hole_profile(c, start).at(Stage::Profiles)?,
        };
        for profile in set.all() {
            profile.ensure_simple().at(Stage::Profiles)?;
            profile.ensure_winding(Winding::Clockwise).at(Stage::Profiles)?;
            debug!(
                profile = profile.name(),
                segments = profile.segments().len(),
                bounds = ?profile.bounds(),
                "profile built"
            );
        }
        Ok(set)
    }

    pub fn all(&self) -> [&Profile; 8] {
        [
            &self.main,
            &self.negative,
            &self.support,
            &self.diffuser_core,
            &self.diffuser_shell,
            &self.cutout,
            &self.trim,
            &self.hole,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lamp_kernel::{MockKernel, MockOp};
    use lamp_types::{Point2, Segment};
    use proptest::prelude::*;

    fn defaults() -> (DesignConstants, SpiralCurve) {
        let c = DesignConstants::default();
        let curve = SpiralCurve::new(&c);
        (c, curve)
    }

    fn set() -> ProfileSet {
        let (c, curve) = defaults();
        ProfileSet::build(&c, &curve, &MockKernel::new()).unwrap()
    }

    fn near(a: Point2, b: Point2) -> bool {
        (a[0] - b[0]).hypot(a[1] - b[1]) < 1e-9
    }

    fn distance_to_polyline(poly: &[Point2], p: Point2) -> f64 {
        (0..poly.len())
            .map(|i| {
                let a = poly[i];
                let b = poly[(i + 1) % poly.len()];
                let d = [b[0] - a[0], b[1] - a[1]];
                let len2 = d[0] * d[0] + d[1] * d[1];
                let s = (((p[0] - a[0]) * d[0] + (p[1] - a[1]) * d[1]) / len2).clamp(0.0, 1.0);
                (p[0] - a[0] - s * d[0]).hypot(p[1] - a[1] - s * d[1])
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn main_profile_closes_with_exact_size() {
        let (c, _) = defaults();
        let p = main_profile(&c, Placement::xz([0.0; 3])).unwrap();
        // The twelfth step lands on the start, so the close adds no edge.
        assert_eq!(p.segments().len(), 12);
        assert_eq!(p.closure_gap(), 0.0);
        assert_relative_eq!(p.width(), 31.2, epsilon = 1e-12);
        assert_relative_eq!(p.height(), 9.01, epsilon = 1e-12);
        assert!(p.contains([0.0, 0.0]));
        // Below the recess floor, between the lips.
        assert!(!p.contains([0.0, -4.0]));
        // Inside a lip.
        assert!(p.contains([13.5, -4.0]));
    }

    #[test]
    fn negative_profile_reaches_past_the_axis_end_of_the_support() {
        let (c, curve) = defaults();
        let start = curve.start();
        let p = negative_profile(&c, start, Placement::meridional(start)).unwrap();
        let b = p.bounds();
        // Inner edge lands on x = -(lip + width/2) in world terms.
        assert_relative_eq!(start[0] + b[0], -14.0, epsilon = 1e-9);
        assert_relative_eq!(b[2], 52.0, epsilon = 1e-9);
        assert_relative_eq!(b[1], -11.505, epsilon = 1e-9);
        assert_relative_eq!(b[3], 12.495, epsilon = 1e-9);
        // The shell and the corridor are outside the void, the rest inside.
        assert!(!p.contains([0.0, 0.0]));
        assert!(!p.contains([-30.0, 0.0]));
        assert!(p.contains([-30.0, 8.0]));
        assert!(p.contains([30.0, 0.0]));
        assert!(p.contains([0.0, -4.0]));
    }

    #[test]
    fn negative_profile_shares_the_shell_outline() {
        let (c, curve) = defaults();
        let placement = Placement::meridional(curve.start());
        let main = main_profile(&c, placement).unwrap();
        let negative = negative_profile(&c, curve.start(), placement).unwrap();
        // The right shoulder, both lips and the recess floor bound the void
        // too, traversed the other way.
        let shared = main
            .segments()
            .iter()
            .skip(1)
            .take(8)
            .filter(|m| {
                negative
                    .segments()
                    .iter()
                    .any(|n| near(n.start(), m.end()) && near(n.end(), m.start()))
            })
            .count();
        assert_eq!(shared, 8);
    }

    #[test]
    fn support_block_spans_hub_to_coil() {
        let (c, curve) = defaults();
        let start = curve.start();
        let p = support_profile(&c, start).unwrap();
        assert_relative_eq!(p.width(), 28.0, epsilon = 1e-12);
        assert_relative_eq!(p.height(), 14.4, epsilon = 1e-12);
        let origin = p.placement().to_world([0.0, 0.0]);
        let extent = support_extent(&c, start);
        assert_relative_eq!(origin[0], 13.0, epsilon = 1e-12);
        assert_relative_eq!(origin[0] + extent[0], start[0] + 26.0, epsilon = 1e-12);
        let centre = p.placement().to_world([0.0, start[2]]);
        assert_relative_eq!(centre[2], start[2], epsilon = 1e-12);
    }

    #[test]
    fn diffuser_dimensions() {
        let (c, _) = defaults();
        let d = DiffuserDims::new(&c);
        assert_relative_eq!(d.width, 28.1, epsilon = 1e-12);
        assert_relative_eq!(d.top, -0.605, epsilon = 1e-12);
        assert_relative_eq!(d.side, 4.005, epsilon = 1e-12);
        assert_relative_eq!(d.bottom, -4.61, epsilon = 1e-12);
        assert_relative_eq!(d.sag, -7.005, epsilon = 1e-12);
    }

    #[test]
    fn diffuser_core_has_an_arc_bottom() {
        let (c, _) = defaults();
        let p = diffuser_core(&c, Placement::xz([0.0; 3])).unwrap();
        assert_eq!(p.segments().len(), 4);
        assert!(matches!(p.segments()[2], Segment::Arc { .. }));
        let b = p.bounds();
        assert_relative_eq!(b[1], -7.005, epsilon = 1e-9);
        assert_relative_eq!(b[3], -0.605, epsilon = 1e-9);
        assert!(p.contains([0.0, -6.9]));
        assert!(!p.contains([13.9, -6.0]));
    }

    #[test]
    fn diffuser_shell_keeps_the_wall_thickness() {
        let profiles = set();
        let core = profiles.diffuser_core.discretize(0.05);
        let shell = profiles.diffuser_shell.discretize(0.01);
        for p in core {
            assert!(profiles.diffuser_shell.contains(p));
            let d = distance_to_polyline(&shell, p);
            assert!((d - 1.6).abs() < 5e-3, "wall {d} at {p:?}");
        }
    }

    #[test]
    fn shrinking_the_shell_gives_back_the_core() {
        let (c, _) = defaults();
        let profiles = set();
        let back = MockKernel::new()
            .offset_profile(&profiles.diffuser_shell, -c.diffuser_thickness)
            .unwrap();
        assert_relative_eq!(back.area(), profiles.diffuser_core.area(), epsilon = 1e-6);
        let core = profiles.diffuser_core.discretize(0.01);
        for p in back.discretize(0.05) {
            let d = distance_to_polyline(&core, p);
            assert!(d < 5e-3, "{d} off the core at {p:?}");
        }
    }

    #[test]
    fn cutout_opens_the_shell_top() {
        let profiles = set();
        let cutout = &profiles.cutout;
        let shell_top = profiles.diffuser_shell.bounds()[3];
        let b = cutout.bounds();
        assert!(b[3] > shell_top);
        assert!(b[2] > profiles.diffuser_shell.bounds()[2]);
        assert!(b[0] < profiles.diffuser_shell.bounds()[0]);
        // The core is inside the cutout.
        for p in profiles.diffuser_core.discretize(0.5) {
            let inset = [p[0] * 0.99, -0.61 + (p[1] + 0.61) * 0.99];
            assert!(cutout.contains(inset), "{inset:?}");
        }
    }

    #[test]
    fn trim_profile_shape() {
        let (c, _) = defaults();
        let p = trim_profile(&c, Placement::xz([0.0; 3])).unwrap();
        assert_eq!(p.segments().len(), 4);
        let b = p.bounds();
        assert_relative_eq!(b[2], 15.6 - 1.7, epsilon = 1e-9);
        assert_relative_eq!(b[0], 13.9 - 52.0, epsilon = 1e-9);
        assert_relative_eq!(b[1], 4.505 - 8.1, epsilon = 1e-9);
    }

    #[test]
    fn every_profile_is_simple_and_clockwise() {
        for p in set().all() {
            assert!(p.is_simple(), "{}", p.name());
            assert_eq!(p.winding(), Winding::Clockwise, "{}", p.name());
            assert!(p.closure_gap() <= 0.01, "{}", p.name());
        }
    }

    #[test]
    fn offset_failure_is_a_profile_stage_error() {
        let (c, curve) = defaults();
        let mut kernel = MockKernel::new();
        kernel.fail_on(MockOp::Offset, 1);
        let err = ProfileSet::build(&c, &curve, &kernel).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Profiles));
        assert!(matches!(err, BuildError::Kernel { .. }));
    }

    fn constants() -> impl Strategy<Value = DesignConstants> {
        (
            10.0f64..60.0,
            4.0f64..20.0,
            0.8f64..3.0,
            0.5f64..2.0,
            0.5f64..2.0,
            (10.0f64..60.0, 1.0f64..5.0, 0.2f64..0.8),
        )
            .prop_map(
                |(width, depth, diffuser_thickness, lip_thickness, lip_depth, (min_radius, curve, gap))| {
                    DesignConstants {
                        width,
                        depth,
                        diffuser_thickness,
                        lip_thickness,
                        lip_depth,
                        min_radius,
                        diffuser_curve: curve,
                        diffuser_gap: gap,
                        ..Default::default()
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn profiles_close_and_stay_simple(c in constants()) {
            prop_assume!(c.validate().is_ok());
            let curve = SpiralCurve::new(&c);
            let set = ProfileSet::build(&c, &curve, &MockKernel::new()).unwrap();
            for p in set.all() {
                prop_assert!(p.closure_gap() <= c.tolerance);
                prop_assert!(p.is_simple());
                prop_assert_eq!(p.winding(), Winding::Clockwise);
            }
            prop_assert!((set.main.width() - c.cross_section_width()).abs() < 1e-9);
            prop_assert!((set.main.height() - c.cross_section_height()).abs() < 1e-9);
        }
    }
}
