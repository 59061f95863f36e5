//! Test harness for the spiral lamp pipeline.
//!
//! Provides programmatic tools for running the pipeline stage by stage,
//! verifying the solids it produces, and reporting failures with enough
//! detail to act on.
//!
//! # Key Components
//!
//! - [`LampBuilder`]: runs the pipeline on a chosen kernel and keeps every
//!   named solid
//! - [`oracle`]: verification functions returning pass/fail verdicts
//! - [`helpers`]: harness errors and mesh math
//! - [`assertions`]: assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use workflow::LampBuilder;
