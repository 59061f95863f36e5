pub mod config;
pub mod fillet;
pub mod geom;
pub mod implicit_kernel;
pub mod lattice;
pub mod mesher;
pub mod mock_kernel;
pub mod offset;
pub mod path;
pub mod prism;
pub mod shape;
pub mod stl;
pub mod sweep;
pub mod topology;
pub mod traits;
pub mod types;

pub use config::KernelConfig;
pub use implicit_kernel::ImplicitKernel;
pub use lattice::Occupancy;
pub use mock_kernel::{MockCall, MockKernel, MockOp};
pub use stl::{ascii_stl, binary_stl, write_stl};
pub use traits::*;
pub use types::*;
