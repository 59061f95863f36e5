//! Profile swept along a sampled path in the meridional frame.
//!
//! At azimuth `φ` the section is the profile placed with `u` along the
//! radial direction and `v` along `+Z`, offset by the path's radius and
//! height there. A world point is inside when some azimuth `θ + kπ` in the
//! sweep's range puts it inside that section; odd `k` reach the mirrored
//! half of a section that crosses the axis.

use std::f64::consts::PI;
use std::sync::Arc;

use lamp_types::{Point2, Profile, Segment, Winding};
use tracing::debug;

use crate::geom::{unit, v3, Aabb, Vec3};
use crate::path::SampledPath;
use crate::types::KernelError;

/// Samples grouped into one culling box.
const CHUNK: usize = 8;

#[derive(Debug, Clone)]
pub struct Sweep {
    profile: Profile,
    path: Arc<SampledPath>,
    /// `[u_min, v_min, u_max, v_max]` of the profile.
    bounds: [f64; 4],
    /// `+1` when the left normal of the outline points outward.
    outward: f64,
    phi0: f64,
    phi1: f64,
    chunks: Vec<Aabb>,
    bbox: Aabb,
}

impl Sweep {
    pub fn new(profile: Profile, path: Arc<SampledPath>) -> Result<Self, KernelError> {
        if !path.is_monotonic() {
            return Err(KernelError::SweepFailed {
                reason: "path azimuth must increase strictly".into(),
            });
        }
        profile
            .ensure_simple()
            .map_err(|e| KernelError::SweepFailed {
                reason: e.to_string(),
            })?;

        let bounds = profile.bounds();
        let outward = match profile.winding() {
            Winding::Clockwise => 1.0,
            Winding::CounterClockwise => -1.0,
        };
        let (phi0, phi1) = path.azimuth_range();
        let chunks = chunk_boxes(&path, bounds);
        let bbox = chunks.iter().fold(Aabb::empty(), |acc, c| acc.union(c));

        let sweep = Self {
            profile,
            path,
            bounds,
            outward,
            phi0,
            phi1,
            chunks,
            bbox,
        };
        sweep.check_turn_overlap()?;
        debug!(
            profile = sweep.profile.name(),
            phi0,
            phi1,
            chunks = sweep.chunks.len(),
            "sweep built"
        );
        Ok(sweep)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn path(&self) -> &SampledPath {
        &self.path
    }

    pub fn azimuth_range(&self) -> (f64, f64) {
        (self.phi0, self.phi1)
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    pub fn may_intersect(&self, region: &Aabb) -> bool {
        self.bbox.intersects(region) && self.chunks.iter().any(|c| c.intersects(region))
    }

    pub fn contains(&self, q: [f64; 3]) -> bool {
        let [u_min, v_min, u_max, v_max] = self.bounds;
        let rho = q[0].hypot(q[1]);
        let theta = q[1].atan2(q[0]);
        let k_lo = ((self.phi0 - theta) / PI).ceil() as i64;
        let k_hi = ((self.phi1 - theta) / PI).floor() as i64;

        for k in k_lo..=k_hi {
            let sign = if k.rem_euclid(2) == 0 { 1.0 } else { -1.0 };
            let phi = theta + k as f64 * PI;
            let (r, z) = self.path.at(phi);
            let u = sign * rho - r;
            if u < u_min || u > u_max {
                continue;
            }
            let v = q[2] - z;
            if v < v_min || v > v_max {
                continue;
            }
            if self.profile.contains([u, v]) {
                return true;
            }
        }
        false
    }

    /// World position of section point `uv` at azimuth `phi`.
    pub fn world(&self, phi: f64, uv: Point2) -> [f64; 3] {
        let (r, z) = self.path.at(phi);
        let (s, c) = phi.sin_cos();
        [(r + uv[0]) * c, (r + uv[0]) * s, z + uv[1]]
    }

    /// Unit direction in which section point `uv` travels at `phi`.
    pub fn travel_direction(&self, phi: f64, uv: Point2) -> [f64; 3] {
        let (r, _) = self.path.at(phi);
        let (dr, dz) = self.path.slope(phi);
        let (e_r, e_phi) = frame(phi);
        let d = unit(e_r * dr + e_phi * (r + uv[0]) + Vec3::z() * dz);
        [d.x, d.y, d.z]
    }

    /// Outward unit normal of the side face swept by `seg` at parameter `s`.
    pub fn side_normal(&self, phi: f64, seg: &Segment, s: f64) -> [f64; 3] {
        let (r, _) = self.path.at(phi);
        let (dr, dz) = self.path.slope(phi);
        let (e_r, e_phi) = frame(phi);
        let uv = seg.point_at(s);
        let t = seg.tangent_at(s);
        let ln = seg.left_normal_at(s);

        let d_phi = e_r * dr + e_phi * (r + uv[0]) + Vec3::z() * dz;
        let d_s = e_r * t[0] + Vec3::z() * t[1];
        let hint = (e_r * ln[0] + Vec3::z() * ln[1]) * self.outward;
        let mut n = unit(d_phi.cross(&d_s));
        if n.dot(&hint) < 0.0 {
            n = -n;
        }
        if n.norm() < 0.5 {
            n = unit(hint);
        }
        [n.x, n.y, n.z]
    }

    /// Outward unit normal of the start or end cap at section point `uv`.
    pub fn cap_normal(&self, at_end: bool, uv: Point2) -> [f64; 3] {
        let phi = if at_end { self.phi1 } else { self.phi0 };
        let (r, _) = self.path.at(phi);
        let (_, e_phi) = frame(phi);
        let side = if r + uv[0] >= 0.0 { 1.0 } else { -1.0 };
        let n = if at_end { e_phi * side } else { -e_phi * side };
        [n.x, n.y, n.z]
    }

    /// Sections whole turns apart must not overlap, otherwise consecutive
    /// turns would fuse. Half-turn pairs may meet across the axis.
    fn check_turn_overlap(&self) -> Result<(), KernelError> {
        let poly = self
            .profile
            .discretize((self.profile.perimeter() / 256.0).max(1e-4));
        let [u_min, v_min, u_max, v_max] = self.bounds;
        let k_max = ((self.phi1 - self.phi0) / PI).floor() as i64;

        for k in (2..=k_max).step_by(2) {
            for i in 0..self.path.len() {
                let phi = self.path.azimuth(i);
                let phi_b = phi + k as f64 * PI;
                if phi_b > self.phi1 {
                    break;
                }
                let (ra, za) = (self.path.radius(i), self.path.height(i));
                let (rb, zb) = self.path.at(phi_b);
                let (bu0, bu1) = (rb + u_min - ra, rb + u_max - ra);
                let (bv0, bv1) = (zb - za + v_min, zb - za + v_max);
                if bu0 >= u_max || bu1 <= u_min || bv0 >= v_max || bv1 <= v_min {
                    continue;
                }
                let mapped: Vec<Point2> = poly
                    .iter()
                    .map(|p| [rb + p[0] - ra, zb + p[1] - za])
                    .collect();
                if polygons_overlap(&poly, &mapped) {
                    return Err(KernelError::SweepFailed {
                        reason: format!(
                            "profile '{}' overlaps itself {} turns apart near azimuth {:.3}",
                            self.profile.name(),
                            k / 2,
                            phi
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// `(e_r, e_φ)` at azimuth `phi`.
pub(crate) fn frame(phi: f64) -> (Vec3, Vec3) {
    let (s, c) = phi.sin_cos();
    (v3([c, s, 0.0]), v3([-s, c, 0.0]))
}

fn chunk_boxes(path: &SampledPath, bounds: [f64; 4]) -> Vec<Aabb> {
    let [u_min, v_min, u_max, v_max] = bounds;
    let last = path.len() - 1;
    let mut out = Vec::with_capacity(last / CHUNK + 1);
    let mut first = 0;
    while first < last {
        let end = (first + CHUNK).min(last);
        let mut bb = Aabb::empty();
        let mut rho_max: f64 = 0.0;
        for i in first..=end {
            let (s, c) = path.azimuth(i).sin_cos();
            let r = path.radius(i);
            let z = path.height(i);
            for u in [u_min, u_max] {
                let rho = r + u;
                rho_max = rho_max.max(rho.abs());
                for v in [v_min, v_max] {
                    bb.include([rho * c, rho * s, z + v]);
                }
            }
        }
        let span = path.azimuth(end) - path.azimuth(first);
        let bulge = if span < PI {
            rho_max * (1.0 - (span / 2.0).cos())
        } else {
            rho_max
        };
        out.push(bb.expanded(bulge + 1e-6 * (1.0 + rho_max)));
        first = end;
    }
    out
}

// ── Polygon overlap ─────────────────────────────────────────────────────────

fn cross(a: Point2, b: Point2) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

fn sub(a: Point2, b: Point2) -> Point2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn proper_cross(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> bool {
    const EPS: f64 = 1e-9;
    let d1 = cross(sub(q2, q1), sub(p1, q1));
    let d2 = cross(sub(q2, q1), sub(p2, q1));
    let d3 = cross(sub(p2, p1), sub(q1, p1));
    let d4 = cross(sub(p2, p1), sub(q2, p1));
    ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
}

fn point_in_polygon(poly: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let u = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
            if u > p[0] {
                inside = !inside;
            }
        }
    }
    inside
}

fn distance_to_outline(poly: &[Point2], p: Point2) -> f64 {
    let n = poly.len();
    (0..n)
        .map(|i| {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            let ab = sub(b, a);
            let len2 = ab[0] * ab[0] + ab[1] * ab[1];
            let s = if len2 > 0.0 {
                ((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len2
            } else {
                0.0
            };
            let s = s.clamp(0.0, 1.0);
            (p[0] - a[0] - s * ab[0]).hypot(p[1] - a[1] - s * ab[1])
        })
        .fold(f64::INFINITY, f64::min)
}

/// Whether two simple polygons share interior area. Touching outlines do
/// not count.
pub(crate) fn polygons_overlap(a: &[Point2], b: &[Point2]) -> bool {
    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        for j in 0..nb {
            if proper_cross(a[i], a[(i + 1) % na], b[j], b[(j + 1) % nb]) {
                return true;
            }
        }
    }
    // Vertices and edge midpoints; midpoints catch outlines that only meet
    // along shared edges.
    let inside_other = |from: &[Point2], other: &[Point2]| {
        let n = from.len();
        (0..n)
            .flat_map(|i| {
                let a = from[i];
                let b = from[(i + 1) % n];
                [a, [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]]
            })
            .any(|p| distance_to_outline(other, p) > 1e-7 && point_in_polygon(other, p))
    };
    inside_other(b, a) || inside_other(a, b)
}
