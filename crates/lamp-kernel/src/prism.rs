//! Straight extrusions: a profile pushed along a vector, and a face of an
//! existing solid pushed the same way.

use std::sync::Arc;

use lamp_types::{Placement, Point2, Profile, Segment, Winding};

use crate::geom::{arr, unit, v3, Aabb, Vec3};
use crate::shape::Shape;
use crate::types::KernelError;

#[derive(Debug, Clone)]
pub struct Prism {
    profile: Profile,
    vector: Vec3,
    /// Extrusion parameter range, `[0, 1]` or `[-1, 1]` when symmetric.
    lo: f64,
    hi: f64,
    /// `vector · normal` of the profile plane.
    denom: f64,
    outward: f64,
    bbox: Aabb,
}

impl Prism {
    pub fn new(profile: Profile, vector: [f64; 3], symmetric: bool) -> Result<Self, KernelError> {
        let v = v3(vector);
        if vector.iter().any(|c| !c.is_finite()) || v.norm() < 1e-12 {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("invalid extrusion vector {vector:?}"),
            });
        }
        let normal = v3(profile.placement().normal());
        let denom = v.dot(&normal);
        if denom.abs() < 1e-9 * v.norm() {
            return Err(KernelError::ExtrudeFailed {
                reason: format!(
                    "extrusion vector lies in the plane of profile '{}'",
                    profile.name()
                ),
            });
        }
        profile
            .ensure_simple()
            .map_err(|e| KernelError::ExtrudeFailed {
                reason: e.to_string(),
            })?;

        let (lo, hi) = if symmetric { (-1.0, 1.0) } else { (0.0, 1.0) };
        let outward = match profile.winding() {
            Winding::Clockwise => 1.0,
            Winding::CounterClockwise => -1.0,
        };
        let step = (profile.perimeter() / 128.0).max(1e-3);
        let outline = profile.discretize(step);
        let placement = *profile.placement();
        let bbox = Aabb::from_points(outline.iter().flat_map(|&p| {
            let base = v3(placement.to_world(p));
            [arr(&(base + v * lo)), arr(&(base + v * hi))]
        }))
        .expanded(1e-9);

        Ok(Self {
            profile,
            vector: v,
            lo,
            hi,
            denom,
            outward,
            bbox,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn vector(&self) -> Vec3 {
        self.vector
    }

    pub fn lambda_range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    /// Foot of `q` on the profile plane along the extrusion vector, when
    /// `q` lies within the extrusion range and above the outline.
    pub fn project(&self, q: [f64; 3]) -> Option<[f64; 3]> {
        let placement = self.profile.placement();
        let (_, h) = placement.to_local(q);
        let lambda = h / self.denom;
        if lambda < self.lo || lambda > self.hi {
            return None;
        }
        let foot = v3(q) - self.vector * lambda;
        let foot = arr(&foot);
        let (uv, _) = placement.to_local(foot);
        self.profile.contains(uv).then_some(foot)
    }

    pub fn contains(&self, q: [f64; 3]) -> bool {
        self.project(q).is_some()
    }

    /// World point of outline point `uv` at extrusion parameter `lambda`.
    pub fn point(&self, uv: Point2, lambda: f64) -> [f64; 3] {
        let base = v3(self.profile.placement().to_world(uv));
        arr(&(base + self.vector * lambda))
    }

    /// Outward unit normal of the side face swept by `seg` at `s`.
    pub fn side_normal(&self, seg: &Segment, s: f64) -> [f64; 3] {
        let placement = self.profile.placement();
        let (u, v) = (v3(placement.u_axis), v3(placement.v_axis));
        let t = seg.tangent_at(s);
        let ln = seg.left_normal_at(s);
        let tangent = u * t[0] + v * t[1];
        let hint = (u * ln[0] + v * ln[1]) * self.outward;
        let mut n = unit(tangent.cross(&self.vector));
        if n.dot(&hint) < 0.0 {
            n = -n;
        }
        arr(&n)
    }

    /// Outward unit normal of the far (`top`) or near cap.
    pub fn cap_normal(&self, top: bool) -> [f64; 3] {
        let n = v3(self.profile.placement().normal()) * self.denom.signum();
        arr(&if top { n } else { -n })
    }
}

/// A planar face of `base` extruded along a vector.
///
/// The face region is the part of the outline where the base solid's
/// boundary actually passes with the recorded outward normal, so faces
/// trimmed by earlier booleans extrude only what is left of them.
#[derive(Debug, Clone)]
pub struct FaceExtrusion {
    prism: Prism,
    normal: Vec3,
    base: Arc<Shape>,
    eps: f64,
}

impl FaceExtrusion {
    pub fn new(
        outline: Profile,
        normal: [f64; 3],
        base: Arc<Shape>,
        vector: [f64; 3],
        eps: f64,
    ) -> Result<Self, KernelError> {
        Ok(Self {
            prism: Prism::new(outline, vector, false)?,
            normal: unit(v3(normal)),
            base,
            eps,
        })
    }

    pub fn prism(&self) -> &Prism {
        &self.prism
    }

    pub fn bbox(&self) -> Aabb {
        self.prism.bbox()
    }

    pub fn contains(&self, q: [f64; 3]) -> bool {
        match self.prism.project(q) {
            Some(foot) => on_face(&self.base, foot, &self.normal, self.eps),
            None => false,
        }
    }
}

/// Whether `p` lies on a boundary of `shape` whose outward normal is `n`.
pub(crate) fn on_face(shape: &Shape, p: [f64; 3], n: &Vec3, eps: f64) -> bool {
    let p = v3(p);
    shape.contains(arr(&(p - n * eps))) && !shape.contains(arr(&(p + n * eps)))
}

/// Samples per side of the grid that locates a face's surviving region.
const REGION_GRID: usize = 64;

/// Clip `outline` to the bounding rectangle of the face region that is
/// still on the boundary.
///
/// The region is located on a grid over the outline's bounds; its extreme
/// samples are then pushed outward by bisection and the rectangle grown by
/// one grid cell, so a region that is sheared or tilted against the
/// outline's axes still lies wholly inside it.
pub(crate) fn trimmed_outline(
    outline: &Profile,
    tolerance: f64,
    on_face: impl Fn([f64; 3]) -> bool,
) -> Result<Profile, KernelError> {
    let placement = *outline.placement();
    let inside = |uv: Point2| outline.contains(uv) && on_face(placement.to_world(uv));
    let b = outline.bounds();
    let cell = [
        (b[2] - b[0]) / REGION_GRID as f64,
        (b[3] - b[1]) / REGION_GRID as f64,
    ];

    // Extreme inside samples towards -u, -v, +u and +v.
    const FURTHER: [fn(Point2, Point2) -> bool; 4] = [
        |p, q| p[0] < q[0],
        |p, q| p[1] < q[1],
        |p, q| p[0] > q[0],
        |p, q| p[1] > q[1],
    ];
    let mut extremes: [Option<Point2>; 4] = [None; 4];
    for i in 0..REGION_GRID {
        for j in 0..REGION_GRID {
            let p = [
                b[0] + cell[0] * (i as f64 + 0.5),
                b[1] + cell[1] * (j as f64 + 0.5),
            ];
            if !inside(p) {
                continue;
            }
            for (slot, further) in extremes.iter_mut().zip(FURTHER) {
                if slot.map_or(true, |q| further(p, q)) {
                    *slot = Some(p);
                }
            }
        }
    }
    let [Some(lo_u), Some(lo_v), Some(hi_u), Some(hi_v)] = extremes else {
        return Err(KernelError::ExtrudeFailed {
            reason: format!("face '{}' has no surviving region", outline.name()),
        });
    };

    let reach = |from: Point2, dir: Point2, max: f64| {
        let at = |s: f64| [from[0] + dir[0] * s, from[1] + dir[1] * s];
        let (mut good, mut bad) = (0.0, max);
        if inside(at(bad)) {
            return bad;
        }
        for _ in 0..40 {
            let mid = (good + bad) / 2.0;
            if inside(at(mid)) {
                good = mid;
            } else {
                bad = mid;
            }
        }
        good
    };
    let rect = [
        (lo_u[0] - reach(lo_u, [-1.0, 0.0], lo_u[0] - b[0]) - cell[0]).max(b[0]),
        (lo_v[1] - reach(lo_v, [0.0, -1.0], lo_v[1] - b[1]) - cell[1]).max(b[1]),
        (hi_u[0] + reach(hi_u, [1.0, 0.0], b[2] - hi_u[0]) + cell[0]).min(b[2]),
        (hi_v[1] + reach(hi_v, [0.0, 1.0], b[3] - hi_v[1]) + cell[1]).min(b[3]),
    ];

    let step = (outline.perimeter() / 256.0).max(1e-3);
    let clipped = clip_to_rect(&outline.discretize(step), rect);
    let mut pts: Vec<Point2> = Vec::with_capacity(clipped.len());
    for p in clipped {
        if pts
            .last()
            .map_or(true, |q: &Point2| (p[0] - q[0]).hypot(p[1] - q[1]) > tolerance)
        {
            pts.push(p);
        }
    }
    while pts.len() > 1 {
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        if (first[0] - last[0]).hypot(first[1] - last[1]) > tolerance {
            break;
        }
        pts.pop();
    }
    let pts = drop_collinear(pts);
    if pts.len() < 3 {
        return Err(KernelError::ExtrudeFailed {
            reason: format!("face '{}' trims to nothing", outline.name()),
        });
    }
    let segments = (0..pts.len())
        .map(|i| Segment::Line {
            from: pts[i],
            to: pts[(i + 1) % pts.len()],
        })
        .collect();
    Profile::from_segments(outline.name(), placement, segments, tolerance).map_err(|e| {
        KernelError::ExtrudeFailed {
            reason: e.to_string(),
        }
    })
}

/// Sutherland–Hodgman clip of a closed polygon to `[u0, v0, u1, v1]`.
fn clip_to_rect(poly: &[Point2], rect: [f64; 4]) -> Vec<Point2> {
    let edges: [(usize, f64, bool); 4] = [
        (0, rect[0], true),
        (0, rect[2], false),
        (1, rect[1], true),
        (1, rect[3], false),
    ];
    let mut out = poly.to_vec();
    for (axis, bound, keep_above) in edges {
        let input = std::mem::take(&mut out);
        let n = input.len();
        let keep = |p: &Point2| {
            if keep_above {
                p[axis] >= bound
            } else {
                p[axis] <= bound
            }
        };
        for i in 0..n {
            let cur = input[i];
            let prev = input[(i + n - 1) % n];
            let cross = |a: Point2, b: Point2| {
                let s = (bound - a[axis]) / (b[axis] - a[axis]);
                [a[0] + (b[0] - a[0]) * s, a[1] + (b[1] - a[1]) * s]
            };
            match (keep(&prev), keep(&cur)) {
                (true, true) => out.push(cur),
                (true, false) => out.push(cross(prev, cur)),
                (false, true) => {
                    out.push(cross(prev, cur));
                    out.push(cur);
                }
                (false, false) => {}
            }
        }
    }
    out
}

fn drop_collinear(pts: Vec<Point2>) -> Vec<Point2> {
    let n = pts.len();
    if n < 4 {
        return pts;
    }
    (0..n)
        .filter(|&i| {
            let a = pts[(i + n - 1) % n];
            let b = pts[i];
            let c = pts[(i + 1) % n];
            let cross = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
            let scale = (b[0] - a[0]).hypot(b[1] - a[1]) * (c[0] - b[0]).hypot(c[1] - b[1]);
            cross.abs() > 1e-9 * scale.max(1e-12)
        })
        .map(|i| pts[i])
        .collect()
}

/// Placement of a prism cap at extrusion parameter `lambda`.
pub(crate) fn shifted(placement: &Placement, by: Vec3) -> Placement {
    let o = v3(placement.origin) + by;
    Placement::new(arr(&o), placement.u_axis, placement.v_axis)
}
