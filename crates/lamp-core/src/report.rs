use std::fmt;

use lamp_kernel::{KernelError, KernelIntrospect, KernelSolidHandle};
use serde::{Deserialize, Serialize};

/// Measurements of one finished solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidReport {
    pub name: String,
    /// Lattice spacing the volume and bounds were sampled at.
    pub cell_size: f64,
    pub volume: f64,
    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub bounding_box: [f64; 6],
    pub faces: usize,
    pub edges: usize,
}

impl SolidReport {
    pub fn measure(
        introspect: &dyn KernelIntrospect,
        name: &str,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<Self, KernelError> {
        let occupancy = introspect.occupancy(solid, cell_size)?;
        let bounding_box = occupancy.bounding_box().ok_or_else(|| KernelError::EmptyResult {
            operation: format!("sampling {name}"),
        })?;
        Ok(Self {
            name: name.to_string(),
            cell_size,
            volume: occupancy.volume(),
            bounding_box,
            faces: introspect.list_faces(solid).len(),
            edges: introspect.list_edges(solid).len(),
        })
    }

    pub fn size(&self) -> [f64; 3] {
        let b = self.bounding_box;
        [b[3] - b[0], b[4] - b[1], b[5] - b[2]]
    }
}

impl fmt::Display for SolidReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [sx, sy, sz] = self.size();
        write!(
            f,
            "{}: volume {:.0} mm³, size {:.1} × {:.1} × {:.1} mm, {} faces, {} edges (cell {} mm)",
            self.name, self.volume, sx, sy, sz, self.faces, self.edges, self.cell_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamp_kernel::{Kernel, MockKernel};
    use lamp_types::{Placement, Profile};

    #[test]
    fn measures_an_extruded_block() {
        let mut kernel = MockKernel::new();
        // Offset from the lattice so exactly 8 × 4 × 2 points fall inside.
        let rect = Profile::rectangle(
            "block",
            Placement::xy([0.0, 0.0, 0.1]),
            [2.1, 1.1],
            4.0,
            2.0,
            1e-9,
        )
        .unwrap();
        let solid = kernel.extrude_profile(&rect, [0.0, 0.0, 1.0], false).unwrap();
        let report = SolidReport::measure(&kernel, "block", &solid, 0.5).unwrap();
        assert_eq!(report.faces, 6);
        assert_eq!(report.edges, 12);
        assert!((report.volume - 8.0).abs() < 1e-9);
        let size = report.size();
        assert!((size[0] - 4.0).abs() < 1e-9);
        assert!((size[1] - 2.0).abs() < 1e-9);
        assert!((size[2] - 1.0).abs() < 1e-9);
        assert!(report.to_string().starts_with("block: volume 8 mm³"));
    }
}
