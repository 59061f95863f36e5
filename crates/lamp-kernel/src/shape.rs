//! Constructive solid geometry tree evaluated by point membership.

use std::sync::Arc;

use crate::fillet::Cusp;
use crate::geom::Aabb;
use crate::prism::{FaceExtrusion, Prism};
use crate::sweep::Sweep;

#[derive(Debug, Clone)]
pub enum Shape {
    Sweep(Sweep),
    Prism(Prism),
    FaceExtrusion(FaceExtrusion),
    Cusp(Cusp),
    Union(Arc<Shape>, Arc<Shape>),
    Difference(Arc<Shape>, Arc<Shape>),
    Intersection(Arc<Shape>, Arc<Shape>),
}

impl Shape {
    pub fn contains(&self, q: [f64; 3]) -> bool {
        match self {
            Shape::Sweep(s) => s.bbox().contains_point(q) && s.contains(q),
            Shape::Prism(p) => p.bbox().contains_point(q) && p.contains(q),
            Shape::FaceExtrusion(f) => f.bbox().contains_point(q) && f.contains(q),
            Shape::Cusp(c) => c.bbox().contains_point(q) && c.contains(q),
            Shape::Union(a, b) => a.contains(q) || b.contains(q),
            Shape::Difference(a, b) => a.contains(q) && !b.contains(q),
            Shape::Intersection(a, b) => a.contains(q) && b.contains(q),
        }
    }

    /// Conservative bounds of the solid.
    pub fn bbox(&self) -> Aabb {
        match self {
            Shape::Sweep(s) => s.bbox(),
            Shape::Prism(p) => p.bbox(),
            Shape::FaceExtrusion(f) => f.bbox(),
            Shape::Cusp(c) => c.bbox(),
            Shape::Union(a, b) => a.bbox().union(&b.bbox()),
            Shape::Difference(a, _) => a.bbox(),
            Shape::Intersection(a, b) => a.bbox().intersection(&b.bbox()),
        }
    }

    /// False only when no point of `region` can be inside the solid.
    pub fn may_intersect(&self, region: &Aabb) -> bool {
        match self {
            Shape::Sweep(s) => s.may_intersect(region),
            Shape::Prism(p) => p.bbox().intersects(region),
            Shape::FaceExtrusion(f) => f.bbox().intersects(region),
            Shape::Cusp(c) => c.bbox().intersects(region),
            Shape::Union(a, b) => a.may_intersect(region) || b.may_intersect(region),
            Shape::Difference(a, _) => a.may_intersect(region),
            Shape::Intersection(a, b) => a.may_intersect(region) && b.may_intersect(region),
        }
    }
}
