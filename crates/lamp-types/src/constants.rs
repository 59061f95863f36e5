use serde::{Deserialize, Serialize};

/// Fixed configuration record for one generation run.
///
/// All lengths are in millimetres. Every downstream profile and solid is a
/// pure function of these values; nothing here is mutated once a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConstants {
    /// Width of the channel between the two lips (the core width).
    pub width: f64,
    /// Depth of the channel recess.
    pub depth: f64,
    /// Wall thickness of the diffuser insert.
    pub diffuser_thickness: f64,
    /// Thickness of each retaining lip.
    pub lip_thickness: f64,
    /// Height of each retaining lip.
    pub lip_depth: f64,
    /// Smallest radius the spiral centreline may reach.
    pub min_radius: f64,
    /// Radial scale of the envelope blend.
    pub radius_scale: f64,
    /// Vertical scale of the envelope blend.
    pub z_scale: f64,
    /// Diameter of the vertical through-hole in the hub.
    pub hole_diameter: f64,
    /// Closure and fit tolerance.
    pub tolerance: f64,
    /// Extra clearance given to the diffuser.
    pub diffuser_tolerance: f64,
    /// Gap between the shell underside and the diffuser top.
    pub diffuser_gap: f64,
    /// Extra depth of the diffuser's curved bottom.
    pub diffuser_curve: f64,
    /// Radius used to round vertical edges of the shell.
    pub fillet_radius: f64,
    /// Number of coil turns.
    pub loops: f64,
    /// Spread of the error-function envelope.
    pub spread: f64,
}

impl Default for DesignConstants {
    fn default() -> Self {
        Self {
            width: 26.0,
            depth: 8.0,
            diffuser_thickness: 1.6,
            lip_thickness: 1.0,
            lip_depth: 1.0,
            min_radius: 30.0,
            radius_scale: 75.0,
            z_scale: 75.0,
            hole_diameter: 6.0,
            tolerance: 0.01,
            diffuser_tolerance: 0.1,
            diffuser_gap: 0.6,
            diffuser_curve: 3.0,
            fillet_radius: 4.0,
            loops: 3.0,
            spread: 1.2,
        }
    }
}

/// A constants record that cannot produce valid geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstantsError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("inconsistent constants: {reason}")]
    Inconsistent { reason: String },
}

impl DesignConstants {
    /// Total width of the shell cross-section.
    pub fn cross_section_width(&self) -> f64 {
        2.0 * self.lip_thickness + 2.0 * self.diffuser_thickness + self.width
    }

    /// Total height of the shell cross-section.
    pub fn cross_section_height(&self) -> f64 {
        self.depth + self.lip_depth + self.tolerance
    }

    /// Height of the outer shoulder above the diffuser slot.
    pub fn edge_height(&self) -> f64 {
        self.cross_section_height() / 2.0
    }

    /// Check that every value is usable before any geometry is built.
    pub fn validate(&self) -> Result<(), ConstantsError> {
        let positive = [
            ("width", self.width),
            ("depth", self.depth),
            ("diffuser_thickness", self.diffuser_thickness),
            ("lip_thickness", self.lip_thickness),
            ("lip_depth", self.lip_depth),
            ("min_radius", self.min_radius),
            ("radius_scale", self.radius_scale),
            ("z_scale", self.z_scale),
            ("hole_diameter", self.hole_diameter),
            ("tolerance", self.tolerance),
            ("fillet_radius", self.fillet_radius),
            ("loops", self.loops),
            ("spread", self.spread),
        ];
        let non_negative = [
            ("diffuser_tolerance", self.diffuser_tolerance),
            ("diffuser_gap", self.diffuser_gap),
            ("diffuser_curve", self.diffuser_curve),
        ];

        for &(field, value) in positive.iter().chain(non_negative.iter()) {
            if !value.is_finite() {
                return Err(ConstantsError::NotFinite { field, value });
            }
        }
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConstantsError::NotPositive { field, value });
            }
        }
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConstantsError::Negative { field, value });
            }
        }

        let side_height = self.cross_section_height() - self.edge_height() - self.diffuser_gap
            + self.diffuser_tolerance;
        if side_height <= 0.0 {
            return Err(ConstantsError::Inconsistent {
                reason: format!(
                    "diffuser side height {:.3} leaves no room below the gap",
                    side_height
                ),
            });
        }
        if self.hole_diameter >= self.width {
            return Err(ConstantsError::Inconsistent {
                reason: format!(
                    "hole diameter {} does not fit inside hub width {}",
                    self.hole_diameter, self.width
                ),
            });
        }
        if self.tolerance >= self.lip_depth.min(self.lip_thickness) {
            return Err(ConstantsError::Inconsistent {
                reason: format!(
                    "tolerance {} is not smaller than the lip dimensions",
                    self.tolerance
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        DesignConstants::default().validate().unwrap();
    }

    #[test]
    fn derived_cross_section_dimensions() {
        let c = DesignConstants::default();
        assert!((c.cross_section_width() - 31.2).abs() < 1e-12);
        assert!((c.cross_section_height() - 9.01).abs() < 1e-12);
        assert!((c.edge_height() - 4.505).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_loops() {
        let c = DesignConstants {
            loops: 0.0,
            ..Default::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConstantsError::NotPositive {
                field: "loops",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_nan() {
        let c = DesignConstants {
            depth: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConstantsError::NotFinite { field: "depth", .. })
        ));
    }

    #[test]
    fn rejects_oversized_hole() {
        let c = DesignConstants {
            hole_diameter: 30.0,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConstantsError::Inconsistent { .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: DesignConstants = serde_json::from_str(r#"{ "loops": 1.0 }"#).unwrap();
        assert_eq!(c.loops, 1.0);
        assert_eq!(c.width, 26.0);
        assert_eq!(c.hole_diameter, 6.0);
    }
}
