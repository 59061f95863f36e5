//! Pipeline scenarios against MockKernel.
//!
//! Fast checks of stage order, naming and failure reporting through
//! LampBuilder; geometry is boxes only.

use lamp_core::{SolidReport, Stage};
use lamp_kernel::{MockKernel, MockOp};
use lamp_types::DesignConstants;
use test_harness::assertions::{assert_all_passed, assert_failed_at};
use test_harness::workflow::{BODY, DIFFUSER, HOLE, LAMP};
use test_harness::LampBuilder;

#[test]
fn test_profiles_pass_every_oracle() {
    let mut m = LampBuilder::mock();
    let verdicts = m.check_profiles().unwrap();
    // Three checks per profile plus the diffuser wall.
    assert_eq!(verdicts.len(), 8 * 3 + 1);
    assert_all_passed(&verdicts, "default profiles").unwrap();
}

#[test]
fn test_profiles_for_other_constants() {
    let c = DesignConstants {
        width: 40.0,
        depth: 12.0,
        diffuser_thickness: 2.0,
        lip_thickness: 1.5,
        min_radius: 50.0,
        loops: 2.0,
        ..Default::default()
    };
    let mut m = LampBuilder::mock().with_constants(c);
    let verdicts = m.check_profiles().unwrap();
    assert_all_passed(&verdicts, "wide profiles").unwrap();
}

#[test]
fn test_generate_stores_both_solids() {
    let mut m = LampBuilder::mock();
    let solids = m.generate().unwrap();
    assert_eq!(m.solid(LAMP).unwrap(), solids.shell);
    assert_eq!(m.solid(DIFFUSER).unwrap(), solids.diffuser);
    assert!(m.solid(BODY).is_err());

    let report = m.report(LAMP, 4.0).unwrap();
    assert_eq!(report.name, "lamp");
    assert!(report.volume > 0.0);
}

#[test]
fn test_summary_lists_stored_solids_by_name() {
    let mut m = LampBuilder::mock();
    m.generate().unwrap();
    let json = m.summary_json(4.0).unwrap();
    let reports: Vec<SolidReport> = serde_json::from_str(&json).unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, [DIFFUSER, LAMP]);
    assert!(reports.iter().all(|r| r.volume > 0.0 && r.faces == 6));
}

#[test]
fn test_stage_by_stage_solids_are_stored() {
    let mut m = LampBuilder::mock();
    m.shell_body().unwrap();
    m.hole().unwrap();
    let body = m.check_solid(BODY, 4.0, 0).unwrap();
    assert_all_passed(&body, "mock body").unwrap();
    let hole = m.check_solid(HOLE, 0.5, 0).unwrap();
    assert_all_passed(&hole, "mock hole").unwrap();
    assert!(m.solid(LAMP).is_err());
}

#[test]
fn test_mock_solids_tessellate_cleanly() {
    let mut m = LampBuilder::mock();
    m.generate().unwrap();
    for name in [LAMP, DIFFUSER] {
        let verdicts = m.check_mesh(name, 2.0).unwrap();
        assert_all_passed(&verdicts, name).unwrap();
    }
}

#[test]
fn test_injected_fillet_failure_is_reported() {
    let mut kernel = MockKernel::new();
    kernel.fail_on(MockOp::Fillet, 1);
    let mut m = LampBuilder::with_kernel(Box::new(kernel));
    let err = m.shell().map_err(|e| match e {
        test_harness::HarnessError::Build(b) => b,
        other => panic!("unexpected harness error {other}"),
    });
    let err = assert_failed_at(err, Stage::Fillet, "fillet").unwrap();
    assert!(err.to_string().contains("injected failure"));
    assert!(m.solid(LAMP).is_err());
}

#[test]
fn test_invalid_constants_are_rejected_before_any_kernel_call() {
    let c = DesignConstants {
        hole_diameter: 30.0,
        ..Default::default()
    };
    let mut m = LampBuilder::mock().with_constants(c);
    assert!(m.profiles().is_err());
    assert!(m.generate().is_err());
    assert!(m.solid(LAMP).is_err());
}
