pub mod constants;
pub mod profile;
pub mod topo;
pub mod trace;

pub use constants::*;
pub use profile::*;
pub use topo::*;
pub use trace::*;
