use serde::{Deserialize, Serialize};

/// Tunables of the implicit kernel. Defaults suit millimetre-scale parts
/// with features no thinner than a tenth of a millimetre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Path samples per unit of curve parameter.
    pub path_samples_per_unit: f64,
    /// Distance of boundary probes from a face or edge.
    pub probe_epsilon: f64,
    /// Closure tolerance of profiles the kernel generates itself.
    pub profile_tolerance: f64,
    /// Upper bound on lattice points per occupancy query.
    pub max_lattice_points: u64,
    /// Side of the cubic blocks used to skip empty lattice regions.
    pub block_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            path_samples_per_unit: 48.0,
            probe_epsilon: 1e-3,
            profile_tolerance: 1e-6,
            max_lattice_points: 2_000_000_000,
            block_size: 8,
        }
    }
}
