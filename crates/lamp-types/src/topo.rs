use serde::{Deserialize, Serialize};

/// The kind of topological entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoKind {
    Vertex,
    Edge,
    Face,
}

/// Geometric signature of a topological entity.
/// Used by the finishing queries to pick faces and edges by geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoSignature {
    /// Surface or curve type (planar, swept, line, arc, curve, point).
    pub surface_type: Option<String>,
    /// Surface area (for faces).
    pub area: Option<f64>,
    /// Centroid position [x, y, z].
    pub centroid: Option<[f64; 3]>,
    /// Outward-pointing normal at centroid (for faces).
    pub normal: Option<[f64; 3]>,
    /// Unit tangent of a straight edge, or the chord direction of a curved one.
    pub direction: Option<[f64; 3]>,
    /// Axis-aligned bounding box [min_x, min_y, min_z, max_x, max_y, max_z].
    pub bbox: Option<[f64; 6]>,
    /// Edge length (for edges).
    pub length: Option<f64>,
}

impl TopoSignature {
    pub fn empty() -> Self {
        Self {
            surface_type: None,
            area: None,
            centroid: None,
            normal: None,
            direction: None,
            bbox: None,
            length: None,
        }
    }

    /// Whether this signature describes a straight edge.
    pub fn is_line(&self) -> bool {
        self.surface_type.as_deref() == Some("line")
    }
}
