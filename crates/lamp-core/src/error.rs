use std::fmt;

use lamp_kernel::KernelError;
use lamp_types::{ConstantsError, ProfileError};
use serde::{Deserialize, Serialize};

/// One step of the shell or diffuser pipeline, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Profiles,
    ShellSweep,
    VoidSweep,
    SupportBlock,
    SupportCut,
    ShellUnion,
    EndCap,
    Fillet,
    HoleCut,
    DiffuserSweep,
    CutoutSweep,
    DiffuserCut,
    TrimSweep,
    DiffuserTrim,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Profiles => "profiles",
            Stage::ShellSweep => "shell sweep",
            Stage::VoidSweep => "void sweep",
            Stage::SupportBlock => "support block",
            Stage::SupportCut => "support cut",
            Stage::ShellUnion => "shell union",
            Stage::EndCap => "end cap",
            Stage::Fillet => "fillet",
            Stage::HoleCut => "hole cut",
            Stage::DiffuserSweep => "diffuser sweep",
            Stage::CutoutSweep => "cutout sweep",
            Stage::DiffuserCut => "diffuser cut",
            Stage::TrimSweep => "trim sweep",
            Stage::DiffuserTrim => "diffuser trim",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that abort construction of a solid.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid design constants: {0}")]
    Constants(#[from] ConstantsError),

    #[error("curve range [{start:.4}, {stop:.4}] leaves the domain [{min:.4}, {max:.4}]")]
    CurveDomain {
        start: f64,
        stop: f64,
        min: f64,
        max: f64,
    },

    #[error("{stage} failed: {source}")]
    Profile {
        stage: Stage,
        #[source]
        source: ProfileError,
    },

    #[error("{stage} failed: {source}")]
    Kernel {
        stage: Stage,
        #[source]
        source: KernelError,
    },

    #[error("{stage} failed: {reason}")]
    Selection { stage: Stage, reason: String },
}

impl BuildError {
    /// The pipeline stage that failed, if the error came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BuildError::Profile { stage, .. }
            | BuildError::Kernel { stage, .. }
            | BuildError::Selection { stage, .. } => Some(*stage),
            BuildError::Constants(_) | BuildError::CurveDomain { .. } => None,
        }
    }
}

/// Tag a lower-level error with the stage it happened in.
pub trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, BuildError>;
}

impl<T> AtStage<T> for Result<T, KernelError> {
    fn at(self, stage: Stage) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Kernel { stage, source })
    }
}

impl<T> AtStage<T> for Result<T, ProfileError> {
    fn at(self, stage: Stage) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Profile { stage, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_is_reported() {
        let err: Result<(), KernelError> = Err(KernelError::EmptyResult {
            operation: "subtract".into(),
        });
        let err = err.at(Stage::HoleCut).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::HoleCut));
        assert_eq!(
            err.to_string(),
            "hole cut failed: subtract produced an empty solid"
        );
    }

    #[test]
    fn constants_errors_have_no_stage() {
        let err = BuildError::from(ConstantsError::NotPositive {
            field: "loops",
            value: 0.0,
        });
        assert_eq!(err.stage(), None);
    }
}
