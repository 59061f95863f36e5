//! End-to-end scenarios on the implicit kernel.
//!
//! Real geometry, measured on the lattice. Cell sizes are chosen per test:
//! coarse for whole-lamp measurements, fine where a thin wall or a small
//! feature is the subject.

use std::f64::consts::PI;

use lamp_kernel::KernelIntrospect;
use lamp_types::DesignConstants;
use test_harness::assertions::{assert_all_passed, assert_close};
use test_harness::oracle::{check_bounding_box, check_cut_volume};
use test_harness::workflow::{DIFFUSER, LAMP};
use test_harness::LampBuilder;

/// Lattice spacing for whole-lamp measurements.
const CELL: f64 = 2.0;

#[test]
fn test_default_lamp_dimensions() {
    let mut m = LampBuilder::implicit();
    m.generate().unwrap();
    let c = m.constants().clone();
    let curve = *m.curve();
    let half_w = c.cross_section_width() / 2.0;
    let half_h = c.cross_section_height() / 2.0;

    let report = m.report(LAMP, CELL).unwrap();
    let [_, _, height] = report.size();
    assert_close(height, 2.0 * c.z_scale, 8.0, "lamp height").unwrap();

    // Bottom of the last section, outer wall of the widest turn. The hub
    // follows the coil upward before the start, so the top lies between
    // the first section's top and the support block's.
    let top = curve.start()[2] + half_h;
    let support_top = curve.start()[2] + 0.9 * c.depth;
    let bottom = curve.end()[2] - half_h;
    let widest = curve.radius(curve.final_angle());
    assert_close(widest, c.min_radius + 2.0 * c.radius_scale, 10.0, "widest turn").unwrap();
    let b = report.bounding_box;
    assert!(
        b[5] > top - CELL && b[5] < support_top + CELL,
        "top {} outside [{top}, {support_top}]",
        b[5]
    );
    assert_close(b[2], bottom, CELL, "bottom").unwrap();
    assert_close(b[3], widest + half_w, CELL, "outer radius").unwrap();
    assert!(report.faces > 0 && report.edges > 0);

    let solid = m.check_solid(LAMP, CELL, 100).unwrap();
    assert_all_passed(&solid, "default lamp solid").unwrap();
    let mesh = m.check_mesh(LAMP, CELL).unwrap();
    assert_all_passed(&mesh, "default lamp mesh").unwrap();
}

#[test]
fn test_diffuser_follows_the_coil() {
    let mut m = LampBuilder::implicit();
    let solids = m.generate().unwrap();
    let curve = *m.curve();
    let shell_floor = m.profiles().unwrap().diffuser_shell.bounds()[1];
    let report = m.report(DIFFUSER, CELL).unwrap();
    let lamp = m.report(LAMP, CELL).unwrap();
    assert!(report.volume > 0.0);
    assert!(report.volume < lamp.volume);
    // The diffuser sits under the shell's top slab; its rounded bottom hangs
    // below the shell at the last section.
    assert!(report.bounding_box[5] < lamp.bounding_box[5]);
    let bottom = curve.end()[2] + shell_floor;
    assert_close(report.bounding_box[2], bottom, CELL, "diffuser bottom").unwrap();
    assert!(report.bounding_box[2] < lamp.bounding_box[2]);
    let mid = curve.point(curve.final_angle() / 2.0);
    assert!(!m.kernel().contains_point(&solids.diffuser, [0.0, 0.0, mid[2]]));
}

#[test]
fn test_single_loop_is_closed_and_watertight() {
    let c = DesignConstants {
        loops: 1.0,
        ..Default::default()
    };
    let mut m = LampBuilder::implicit().with_constants(c);
    m.shell().unwrap();

    let solid = m.check_solid(LAMP, CELL, 100).unwrap();
    assert_all_passed(&solid, "single loop solid").unwrap();
    let mesh = m.check_mesh(LAMP, CELL).unwrap();
    assert_all_passed(&mesh, "single loop mesh").unwrap();

    let profiles = m.check_profiles().unwrap();
    assert_all_passed(&profiles, "single loop profiles").unwrap();
}

#[test]
fn test_hole_removes_one_cylinder() {
    let mut m = LampBuilder::implicit();
    let body = m.shell_body().unwrap();
    let hole = m.hole().unwrap();
    let lamp = m.shell().unwrap();
    let c = m.constants().clone();
    let z0 = m.curve().start()[2];
    let r = c.hole_diameter / 2.0;

    let region = [
        -r - 0.5,
        -r - 0.5,
        z0 - c.depth - 0.5,
        r + 0.5,
        r + 0.5,
        z0 + c.depth + 0.5,
    ];
    let verdict = check_cut_volume(m.kernel_mut(), &body, &lamp, &hole, region, 0.25);
    assert!(verdict.passed, "{}", verdict.detail);

    // The hub the hole passes through is as tall as the support corridor.
    let hub = c.cross_section_height() - c.lip_depth;
    let cylinder = PI * r * r * hub;
    let removed = verdict.value.unwrap();
    assert!(
        (removed - cylinder).abs() < 0.15 * cylinder,
        "removed {removed:.1}, expected about {cylinder:.1}"
    );

    let k = m.kernel();
    for dz in [-3.0, -1.0, 0.0, 2.0, 4.0] {
        let p = [0.0, 0.0, z0 + dz];
        assert!(k.contains_point(&body, p), "hub missing at {p:?}");
        assert!(!k.contains_point(&lamp, p), "hole missing at {p:?}");
    }
    assert!(!k.contains_point(&lamp, [r - 0.1, 0.0, z0]));
    assert!(k.contains_point(&lamp, [r + 0.2, 0.0, z0]));
}

#[test]
fn test_idempotent_generation() {
    let mut first = LampBuilder::implicit();
    let mut second = LampBuilder::implicit();
    first.generate().unwrap();
    second.generate().unwrap();
    // Twice on the same kernel as well.
    second.generate().unwrap();

    for name in [LAMP, DIFFUSER] {
        let a = first.report(name, 4.0).unwrap();
        let b = second.report(name, 4.0).unwrap();
        assert_eq!(a.volume, b.volume, "{name} volume");
        assert_eq!(a.bounding_box, b.bounding_box, "{name} bounds");

        let solid = second.solid(name).unwrap();
        let verdict = check_bounding_box(
            second.kernel().as_introspect(),
            &solid,
            4.0,
            a.bounding_box,
            0.0,
        );
        assert!(verdict.passed, "{}", verdict.detail);
    }
}

#[test]
fn test_diffuser_is_one_body() {
    let c = DesignConstants {
        loops: 1.0,
        ..Default::default()
    };
    let mut m = LampBuilder::implicit().with_constants(c);
    m.diffuser().unwrap();
    let verdicts = m.check_solid(DIFFUSER, 0.6, 8).unwrap();
    assert_all_passed(&verdicts, "diffuser").unwrap();
}
