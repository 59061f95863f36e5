pub mod assembler;
pub mod curve;
pub mod error;
pub mod profiles;
pub mod report;
pub mod select;

pub use assembler::{
    build_diffuser, build_lamp_shell, build_shell_body, generate, mounting_hole, LampSolids,
    SweepRanges,
};
pub use curve::SpiralCurve;
pub use error::{AtStage, BuildError, Stage};
pub use profiles::{DiffuserDims, ProfileSet};
pub use report::SolidReport;
pub use select::{edges_parallel_to, longer_than, nearest_to, parallel_to, Selectable};
