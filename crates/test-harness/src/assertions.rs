//! Assertion helpers with diagnostic output.
//!
//! Every failure names the context it was raised in and carries expected
//! and actual values.

use lamp_core::{BuildError, Stage};

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Fail with every failed verdict listed, not just the first.
pub fn assert_all_passed(verdicts: &[OracleVerdict], ctx: &str) -> Result<(), HarnessError> {
    let failed: Vec<&OracleVerdict> = verdicts.iter().filter(|v| !v.passed).collect();
    match failed.as_slice() {
        [] => Ok(()),
        [only] => Err(HarnessError::OracleFailure {
            oracle: only.oracle_name.clone(),
            detail: format!("[{}] {}", ctx, only.detail),
        }),
        many => Err(HarnessError::OracleFailure {
            oracle: many
                .iter()
                .map(|v| v.oracle_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            detail: format!(
                "[{}] {}",
                ctx,
                many.iter()
                    .map(|v| v.detail.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        }),
    }
}

/// Assert `actual` is within `tol` of `expected`.
pub fn assert_close(actual: f64, expected: f64, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    if (actual - expected).abs() <= tol {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected {:.4} ± {}, got {:.4}",
                ctx, expected, tol, actual
            ),
        })
    }
}

/// Assert a build failed in `stage`.
pub fn assert_failed_at<T>(
    result: Result<T, BuildError>,
    stage: Stage,
    ctx: &str,
) -> Result<BuildError, HarnessError> {
    match result {
        Ok(_) => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected a failure in {}, build succeeded", ctx, stage),
        }),
        Err(err) if err.stage() == Some(stage) => Ok(err),
        Err(err) => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected a failure in {}, got: {}", ctx, stage, err),
        }),
    }
}
