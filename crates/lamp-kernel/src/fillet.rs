//! Constant-radius rounding of straight edges.
//!
//! A rounded edge is modelled as the edge's base shape minus (convex) or
//! plus (concave) a "cusp": the sliver between the two faces, the chord
//! through the tangent points, and the rolling-ball cylinder.

use crate::geom::{arr, unit, v3, Aabb, Vec3};
use crate::types::KernelError;

#[derive(Debug, Clone)]
pub struct Cusp {
    start: Vec3,
    dir: Vec3,
    length: f64,
    nu1: Vec3,
    nu2: Vec3,
    /// Cylinder axis offset from the edge, perpendicular to it.
    center: Vec3,
    tangent1: Vec3,
    /// Unit vector from the cylinder axis towards the edge.
    toward_edge: Vec3,
    radius: f64,
    bbox: Aabb,
}

impl Cusp {
    /// Cusp along the segment `start..end` between two faces with outward
    /// wedge normals `nu1` and `nu2` (the face normals for a convex edge,
    /// their negations for a concave one).
    pub fn new(
        start: [f64; 3],
        end: [f64; 3],
        nu1: [f64; 3],
        nu2: [f64; 3],
        radius: f64,
    ) -> Result<Self, KernelError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KernelError::FilletFailed {
                reason: format!("radius must be positive, got {radius}"),
            });
        }
        let start = v3(start);
        let axis = v3(end) - start;
        let length = axis.norm();
        if length < 1e-12 {
            return Err(KernelError::FilletFailed {
                reason: "edge has zero length".into(),
            });
        }
        let dir = axis / length;
        let flatten = |n: [f64; 3]| {
            let n = v3(n);
            unit(n - dir * n.dot(&dir))
        };
        let nu1 = flatten(nu1);
        let nu2 = flatten(nu2);
        let cos = nu1.dot(&nu2);
        if nu1.norm() < 0.5 || nu2.norm() < 0.5 || cos > 1.0 - 1e-9 || cos < -1.0 + 1e-6 {
            return Err(KernelError::FilletFailed {
                reason: "adjacent faces do not form a sharp edge".into(),
            });
        }

        let center = -(nu1 + nu2) * (radius / (1.0 + cos));
        let tangent1 = center + nu1 * radius;
        let tangent2 = center + nu2 * radius;
        let toward_edge = unit(nu1 + nu2);
        let bbox = Aabb::from_points(
            [Vec3::zeros(), tangent1, tangent2]
                .iter()
                .flat_map(|o| [arr(&(start + o)), arr(&(start + axis + o))]),
        )
        .expanded(1e-9);

        Ok(Self {
            start,
            dir,
            length,
            nu1,
            nu2,
            center,
            tangent1,
            toward_edge,
            radius,
            bbox,
        })
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    /// Offsets of the two tangent lines from the edge.
    pub fn tangent_offsets(&self) -> (Vec3, Vec3) {
        (self.tangent1, self.center + self.nu2 * self.radius)
    }

    /// Point on the rounding surface at fractions `along` the edge and
    /// `across` from the first tangent line to the second, with the unit
    /// direction from the cylinder axis to it.
    pub fn blend_point(&self, along: f64, across: f64) -> ([f64; 3], [f64; 3]) {
        let (t1, t2) = self.tangent_offsets();
        let a = (t1 - self.center) / self.radius;
        let b = (t2 - self.center) / self.radius;
        let radial = unit(a * (1.0 - across) + b * across);
        let p = self.start + self.dir * (along * self.length) + self.center + radial * self.radius;
        (arr(&p), arr(&radial))
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn contains(&self, q: [f64; 3]) -> bool {
        let w = v3(q) - self.start;
        let along = w.dot(&self.dir);
        if along < 0.0 || along > self.length {
            return false;
        }
        let w = w - self.dir * along;
        if w.dot(&self.nu1) > 0.0 || w.dot(&self.nu2) > 0.0 {
            return false;
        }
        if (w - self.tangent1).dot(&self.toward_edge) <= 0.0 {
            return false;
        }
        (w - self.center).norm() > self.radius
    }
}
