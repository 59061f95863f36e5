//! Closed planar cross-sections built from straight and three-point-arc segments.
//!
//! Coordinates are `(u, v)` in the profile's own plane, `v` pointing up.
//! A profile is always a single closed loop; constructors verify continuity
//! and closure so downstream code never sees an open outline.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// A point in a profile plane.
pub type Point2 = [f64; 2];

/// Orientation of a closed loop in its `(u, v)` plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Errors raised while constructing or validating a profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("profile '{name}' has no segments")]
    Empty { name: String },

    #[error("profile '{name}': segment {index} is degenerate")]
    Degenerate { name: String, index: usize },

    #[error("profile '{name}': segment {index} starts {gap:.6} away from the previous end")]
    Discontinuous { name: String, index: usize, gap: f64 },

    #[error("profile '{name}' does not close: gap {gap:.6} exceeds tolerance {tolerance}")]
    NotClosed {
        name: String,
        gap: f64,
        tolerance: f64,
    },

    #[error("profile '{name}' self-intersects between segments {first} and {second}")]
    SelfIntersecting {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("profile '{name}' winds {actual:?}, expected {expected:?}")]
    WindingMismatch {
        name: String,
        expected: Winding,
        actual: Winding,
    },
}

// ── Placement ───────────────────────────────────────────────────────────────

/// Embedding of a profile plane in 3D.
///
/// `u_axis` and `v_axis` are orthonormal; the plane normal is `u × v`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub origin: [f64; 3],
    pub u_axis: [f64; 3],
    pub v_axis: [f64; 3],
}

impl Placement {
    pub fn new(origin: [f64; 3], u_axis: [f64; 3], v_axis: [f64; 3]) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }

    /// Horizontal plane: `u = +X`, `v = +Y`, normal `+Z`.
    pub fn xy(origin: [f64; 3]) -> Self {
        Self::new(origin, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }

    /// Front plane: `u = +X`, `v = +Z`, normal `-Y`.
    pub fn xz(origin: [f64; 3]) -> Self {
        Self::new(origin, [1.0, 0.0, 0.0], [0.0, 0.0, 1.0])
    }

    /// Side plane: `u = +Y`, `v = +Z`, normal `+X`.
    pub fn yz(origin: [f64; 3]) -> Self {
        Self::new(origin, [0.0, 1.0, 0.0], [0.0, 0.0, 1.0])
    }

    /// Vertical half-plane through the Z axis and `origin`: `u` points
    /// radially outward, `v = +Z`. Falls back to `+X` on the axis itself.
    pub fn meridional(origin: [f64; 3]) -> Self {
        let rho = origin[0].hypot(origin[1]);
        let u_axis = if rho > 1e-12 {
            [origin[0] / rho, origin[1] / rho, 0.0]
        } else {
            [1.0, 0.0, 0.0]
        };
        Self::new(origin, u_axis, [0.0, 0.0, 1.0])
    }

    pub fn normal(&self) -> [f64; 3] {
        let u = self.u_axis;
        let v = self.v_axis;
        [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ]
    }

    /// Map a plane point to world coordinates.
    pub fn to_world(&self, p: Point2) -> [f64; 3] {
        [
            self.origin[0] + p[0] * self.u_axis[0] + p[1] * self.v_axis[0],
            self.origin[1] + p[0] * self.u_axis[1] + p[1] * self.v_axis[1],
            self.origin[2] + p[0] * self.u_axis[2] + p[1] * self.v_axis[2],
        ]
    }

    /// Map a world point to `((u, v), n)` where `n` is the signed distance
    /// along the plane normal.
    pub fn to_local(&self, q: [f64; 3]) -> (Point2, f64) {
        let d = [
            q[0] - self.origin[0],
            q[1] - self.origin[1],
            q[2] - self.origin[2],
        ];
        let n = self.normal();
        (
            [dot3(d, self.u_axis), dot3(d, self.v_axis)],
            dot3(d, n),
        )
    }
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

// ── Segments ────────────────────────────────────────────────────────────────

/// Circle underlying an arc segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCircle {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    /// Signed angular extent; positive is counter-clockwise.
    pub sweep: f64,
}

impl ArcCircle {
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        [
            self.center[0] + self.radius * angle.cos(),
            self.center[1] + self.radius * angle.sin(),
        ]
    }

    /// Whether `angle` lies on the arc's angular span.
    pub fn spans(&self, angle: f64) -> bool {
        if self.sweep >= 0.0 {
            (angle - self.start_angle).rem_euclid(TAU) <= self.sweep
        } else {
            (self.start_angle - angle).rem_euclid(TAU) <= -self.sweep
        }
    }
}

/// One piece of a profile outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Segment {
    Line { from: Point2, to: Point2 },
    /// Circular arc from `from` through `via` to `to`.
    Arc { from: Point2, via: Point2, to: Point2 },
}

impl Segment {
    pub fn start(&self) -> Point2 {
        match *self {
            Segment::Line { from, .. } | Segment::Arc { from, .. } => from,
        }
    }

    pub fn end(&self) -> Point2 {
        match *self {
            Segment::Line { to, .. } | Segment::Arc { to, .. } => to,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Segment::Line { .. })
    }

    /// The circle through an arc's three points, or `None` for lines and
    /// collinear arcs.
    pub fn circle(&self) -> Option<ArcCircle> {
        let (a, b, c) = match *self {
            Segment::Arc { from, via, to } => (from, via, to),
            Segment::Line { .. } => return None,
        };
        let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
        if d.abs() < 1e-12 {
            return None;
        }
        let a2 = a[0] * a[0] + a[1] * a[1];
        let b2 = b[0] * b[0] + b[1] * b[1];
        let c2 = c[0] * c[0] + c[1] * c[1];
        let center = [
            (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d,
            (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d,
        ];
        let radius = dist(center, a);
        let start_angle = (a[1] - center[1]).atan2(a[0] - center[0]);
        let end_angle = (c[1] - center[1]).atan2(c[0] - center[0]);
        let turn = cross2(sub(b, a), sub(c, b));
        let sweep = if turn > 0.0 {
            (end_angle - start_angle).rem_euclid(TAU)
        } else {
            -(start_angle - end_angle).rem_euclid(TAU)
        };
        Some(ArcCircle {
            center,
            radius,
            start_angle,
            sweep,
        })
    }

    /// Point at normalized parameter `s` in `[0, 1]`.
    pub fn point_at(&self, s: f64) -> Point2 {
        match *self {
            Segment::Line { from, to } => lerp(from, to, s),
            Segment::Arc { from, to, .. } => match self.circle() {
                Some(c) => c.point_at_angle(c.start_angle + s * c.sweep),
                None => lerp(from, to, s),
            },
        }
    }

    /// Unit direction of travel at parameter `s`.
    pub fn tangent_at(&self, s: f64) -> Point2 {
        match *self {
            Segment::Line { from, to } => normalize(sub(to, from)),
            Segment::Arc { from, to, .. } => match self.circle() {
                Some(c) => {
                    let angle = c.start_angle + s * c.sweep;
                    let sign = c.sweep.signum();
                    [-angle.sin() * sign, angle.cos() * sign]
                }
                None => normalize(sub(to, from)),
            },
        }
    }

    /// Unit normal to the left of travel. For a clockwise loop this points
    /// out of the enclosed region.
    pub fn left_normal_at(&self, s: f64) -> Point2 {
        let t = self.tangent_at(s);
        [-t[1], t[0]]
    }

    pub fn length(&self) -> f64 {
        match *self {
            Segment::Line { from, to } => dist(from, to),
            Segment::Arc { from, to, .. } => match self.circle() {
                Some(c) => c.radius * c.sweep.abs(),
                None => dist(from, to),
            },
        }
    }

    /// The same segment traversed in the opposite direction.
    pub fn reversed(&self) -> Segment {
        match *self {
            Segment::Line { from, to } => Segment::Line { from: to, to: from },
            Segment::Arc { from, via, to } => Segment::Arc {
                from: to,
                via,
                to: from,
            },
        }
    }

    /// Points along the segment from its start (inclusive) to its end
    /// (exclusive), no further apart than `max_step`.
    pub fn discretize(&self, max_step: f64) -> Vec<Point2> {
        match *self {
            Segment::Line { from, .. } => vec![from],
            Segment::Arc { from, .. } => {
                let n = ((self.length() / max_step.max(1e-6)).ceil() as usize).max(4);
                (0..n)
                    .map(|i| {
                        if i == 0 {
                            from
                        } else {
                            self.point_at(i as f64 / n as f64)
                        }
                    })
                    .collect()
            }
        }
    }

    /// `[u_min, v_min, u_max, v_max]`.
    pub fn bounds(&self) -> [f64; 4] {
        let a = self.start();
        let b = self.end();
        let mut bb = [a[0].min(b[0]), a[1].min(b[1]), a[0].max(b[0]), a[1].max(b[1])];
        if let Some(c) = self.circle() {
            for k in 0..4 {
                let angle = k as f64 * PI / 2.0;
                if c.spans(angle) {
                    let p = c.point_at_angle(angle);
                    bb[0] = bb[0].min(p[0]);
                    bb[1] = bb[1].min(p[1]);
                    bb[2] = bb[2].max(p[0]);
                    bb[3] = bb[3].max(p[1]);
                }
            }
        }
        bb
    }

    /// Whether `p` lies strictly inside the region between an arc and its
    /// chord. Always false for lines.
    fn in_circular_segment(&self, p: Point2) -> bool {
        let (from, via, to) = match *self {
            Segment::Arc { from, via, to } => (from, via, to),
            Segment::Line { .. } => return false,
        };
        let c = match self.circle() {
            Some(c) => c,
            None => return false,
        };
        if dist(p, c.center) >= c.radius {
            return false;
        }
        let chord = sub(to, from);
        let mut side_p = cross2(chord, sub(p, from));
        if side_p == 0.0 {
            // On the chord: nudge upward to match the crossing rule in `contains`.
            side_p = chord[0] - chord[1] * 1e-3;
        }
        let side_arc = cross2(chord, sub(via, from));
        side_p * side_arc > 0.0
    }
}

// ── Profile ─────────────────────────────────────────────────────────────────

/// A single closed, named cross-section loop placed in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    name: String,
    placement: Placement,
    segments: Vec<Segment>,
}

impl Profile {
    /// Build a profile from consecutive segments, verifying continuity and
    /// closure within `tolerance`.
    pub fn from_segments(
        name: &str,
        placement: Placement,
        segments: Vec<Segment>,
        tolerance: f64,
    ) -> Result<Self, ProfileError> {
        if segments.is_empty() {
            return Err(ProfileError::Empty {
                name: name.to_string(),
            });
        }
        for (index, seg) in segments.iter().enumerate() {
            let degenerate = seg.length() <= tolerance
                || (!seg.is_line() && seg.circle().is_none());
            if degenerate {
                return Err(ProfileError::Degenerate {
                    name: name.to_string(),
                    index,
                });
            }
            if index > 0 {
                let gap = dist(segments[index - 1].end(), seg.start());
                if gap > tolerance {
                    return Err(ProfileError::Discontinuous {
                        name: name.to_string(),
                        index,
                        gap,
                    });
                }
            }
        }
        let profile = Self {
            name: name.to_string(),
            placement,
            segments,
        };
        let gap = profile.closure_gap();
        if gap > tolerance {
            return Err(ProfileError::NotClosed {
                name: name.to_string(),
                gap,
                tolerance,
            });
        }
        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// The same outline embedded with a different placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn start(&self) -> Point2 {
        self.segments[0].start()
    }

    /// Distance between the last segment's end and the first segment's start.
    pub fn closure_gap(&self) -> f64 {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => dist(last.end(), first.start()),
            _ => f64::INFINITY,
        }
    }

    /// `[u_min, v_min, u_max, v_max]`.
    pub fn bounds(&self) -> [f64; 4] {
        self.segments.iter().fold(
            [
                f64::INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
            ],
            |acc, seg| {
                let b = seg.bounds();
                [
                    acc[0].min(b[0]),
                    acc[1].min(b[1]),
                    acc[2].max(b[2]),
                    acc[3].max(b[3]),
                ]
            },
        )
    }

    pub fn width(&self) -> f64 {
        let b = self.bounds();
        b[2] - b[0]
    }

    pub fn height(&self) -> f64 {
        let b = self.bounds();
        b[3] - b[1]
    }

    pub fn perimeter(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Enclosed area, positive for counter-clockwise loops.
    pub fn signed_area(&self) -> f64 {
        self.segments
            .iter()
            .map(|seg| {
                let a = seg.start();
                let b = seg.end();
                let chord = (a[0] * b[1] - b[0] * a[1]) / 2.0;
                let bulge = match seg.circle() {
                    Some(c) => {
                        let phi = c.sweep.abs();
                        c.sweep.signum() * c.radius * c.radius * (phi - phi.sin()) / 2.0
                    }
                    None => 0.0,
                };
                chord + bulge
            })
            .sum()
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn winding(&self) -> Winding {
        if self.signed_area() < 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    /// Fail unless the loop winds the expected way.
    pub fn ensure_winding(&self, expected: Winding) -> Result<(), ProfileError> {
        let actual = self.winding();
        if actual == expected {
            Ok(())
        } else {
            Err(ProfileError::WindingMismatch {
                name: self.name.clone(),
                expected,
                actual,
            })
        }
    }

    /// The same loop traversed in the opposite direction.
    pub fn reversed(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            placement: self.placement,
            segments: self.segments.iter().rev().map(Segment::reversed).collect(),
        }
    }

    /// Even-odd point membership. Arcs are handled exactly: a point flips
    /// parity once per chord crossing and once per circular segment it
    /// lies in.
    pub fn contains(&self, p: Point2) -> bool {
        let mut inside = false;
        for seg in &self.segments {
            let a = seg.start();
            let b = seg.end();
            if (a[1] > p[1]) != (b[1] > p[1]) {
                let u = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                if u > p[0] {
                    inside = !inside;
                }
            }
            if !seg.is_line() && seg.in_circular_segment(p) {
                inside = !inside;
            }
        }
        inside
    }

    /// Outline as a polyline (closing point not repeated).
    pub fn discretize(&self, max_step: f64) -> Vec<Point2> {
        self.segments
            .iter()
            .flat_map(|seg| seg.discretize(max_step))
            .collect()
    }

    /// First pair of segments that cross, touch away from their shared
    /// vertex, or fold back onto each other.
    pub fn self_intersection(&self) -> Option<(usize, usize)> {
        let step = (self.perimeter() / 512.0).max(1e-3);
        let polylines: Vec<Vec<Point2>> = self
            .segments
            .iter()
            .map(|seg| {
                let mut pts = seg.discretize(step);
                pts.push(seg.end());
                pts
            })
            .collect();
        let boxes: Vec<[f64; 4]> = self.segments.iter().map(Segment::bounds).collect();
        let n = self.segments.len();

        for i in 0..n {
            for j in (i + 1)..n {
                if !boxes_overlap(boxes[i], boxes[j], 1e-9) {
                    continue;
                }
                let next = j == i + 1;
                let wrap = i == 0 && j == n - 1;
                if polylines_intersect(&polylines[i], &polylines[j], next, wrap) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    pub fn is_simple(&self) -> bool {
        self.self_intersection().is_none()
    }

    /// Fail if the loop is not simple.
    pub fn ensure_simple(&self) -> Result<(), ProfileError> {
        match self.self_intersection() {
            None => Ok(()),
            Some((first, second)) => Err(ProfileError::SelfIntersecting {
                name: self.name.clone(),
                first,
                second,
            }),
        }
    }
}

// ── 2D helpers ──────────────────────────────────────────────────────────────

pub(crate) fn sub(a: Point2, b: Point2) -> Point2 {
    [a[0] - b[0], a[1] - b[1]]
}

pub(crate) fn dist(a: Point2, b: Point2) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn cross2(a: Point2, b: Point2) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

fn lerp(a: Point2, b: Point2, s: f64) -> Point2 {
    [a[0] + (b[0] - a[0]) * s, a[1] + (b[1] - a[1]) * s]
}

fn normalize(a: Point2) -> Point2 {
    let len = a[0].hypot(a[1]);
    if len > 1e-15 {
        [a[0] / len, a[1] / len]
    } else {
        [0.0, 0.0]
    }
}

fn boxes_overlap(a: [f64; 4], b: [f64; 4], eps: f64) -> bool {
    a[0] <= b[2] + eps && b[0] <= a[2] + eps && a[1] <= b[3] + eps && b[1] <= a[3] + eps
}

/// Closed-segment intersection test, touching included.
fn edges_touch(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> bool {
    const EPS: f64 = 1e-9;
    let d1 = cross2(sub(q2, q1), sub(p1, q1));
    let d2 = cross2(sub(q2, q1), sub(p2, q1));
    let d3 = cross2(sub(p2, p1), sub(q1, p1));
    let d4 = cross2(sub(p2, p1), sub(q2, p1));
    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return true;
    }
    let on = |a: Point2, b: Point2, p: Point2, d: f64| {
        d.abs() <= EPS
            && p[0] >= a[0].min(b[0]) - EPS
            && p[0] <= a[0].max(b[0]) + EPS
            && p[1] >= a[1].min(b[1]) - EPS
            && p[1] <= a[1].max(b[1]) + EPS
    };
    on(q1, q2, p1, d1) || on(q1, q2, p2, d2) || on(p1, p2, q1, d3) || on(p1, p2, q2, d4)
}

/// Whether two polylines meet anywhere other than a vertex they legitimately
/// share. `next` means `b` starts where `a` ends; `wrap` means `a` starts
/// where `b` ends.
fn polylines_intersect(a: &[Point2], b: &[Point2], next: bool, wrap: bool) -> bool {
    let na = a.len() - 1;
    let nb = b.len() - 1;
    for i in 0..na {
        for j in 0..nb {
            let shares_next = next && i == na - 1 && j == 0;
            let shares_wrap = wrap && i == 0 && j == nb - 1;
            if shares_next || shares_wrap {
                // Consecutive pieces may only meet at the shared vertex;
                // flag them when they fold back along each other.
                let (p1, p2, q1, q2) = (a[i], a[i + 1], b[j], b[j + 1]);
                let da = sub(p2, p1);
                let db = sub(q2, q1);
                let parallel = cross2(normalize(da), normalize(db)).abs() < 1e-9;
                let opposed = da[0] * db[0] + da[1] * db[1] < 0.0;
                if parallel && opposed {
                    return true;
                }
                continue;
            }
            if edges_touch(a[i], a[i + 1], b[j], b[j + 1]) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Profile {
        let s = side;
        Profile::from_segments(
            "square",
            Placement::xy([0.0; 3]),
            vec![
                Segment::Line { from: [0.0, 0.0], to: [0.0, s] },
                Segment::Line { from: [0.0, s], to: [s, s] },
                Segment::Line { from: [s, s], to: [s, 0.0] },
                Segment::Line { from: [s, 0.0], to: [0.0, 0.0] },
            ],
            1e-9,
        )
        .unwrap()
    }

    fn disc(r: f64) -> Profile {
        Profile::from_segments(
            "disc",
            Placement::xy([0.0; 3]),
            vec![
                Segment::Arc { from: [r, 0.0], via: [0.0, -r], to: [-r, 0.0] },
                Segment::Arc { from: [-r, 0.0], via: [0.0, r], to: [r, 0.0] },
            ],
            1e-9,
        )
        .unwrap()
    }

    #[test]
    fn square_is_clockwise_with_expected_area() {
        let sq = square(2.0);
        assert_eq!(sq.winding(), Winding::Clockwise);
        assert_relative_eq!(sq.signed_area(), -4.0, epsilon = 1e-12);
        assert_eq!(sq.reversed().winding(), Winding::CounterClockwise);
    }

    #[test]
    fn disc_area_and_bounds_are_exact() {
        let d = disc(3.0);
        assert_eq!(d.winding(), Winding::Clockwise);
        assert_relative_eq!(d.area(), PI * 9.0, epsilon = 1e-9);
        let b = d.bounds();
        assert_relative_eq!(b[0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(b[3], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn disc_membership_is_exact_near_the_rim() {
        let d = disc(3.0);
        assert!(d.contains([0.0, 0.0]));
        assert!(d.contains([2.999, 0.01]));
        assert!(d.contains([0.0, -2.999]));
        assert!(!d.contains([2.13, 2.13]));
        assert!(!d.contains([0.0, 3.001]));
    }

    #[test]
    fn arc_tangent_follows_travel_direction() {
        let seg = Segment::Arc {
            from: [1.0, 0.0],
            via: [0.0, 1.0],
            to: [-1.0, 0.0],
        };
        let t = seg.tangent_at(0.0);
        assert_relative_eq!(t[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t[1], 1.0, epsilon = 1e-12);
        let mid = seg.point_at(0.5);
        assert_relative_eq!(mid[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn open_outline_is_rejected() {
        let err = Profile::from_segments(
            "open",
            Placement::xy([0.0; 3]),
            vec![
                Segment::Line { from: [0.0, 0.0], to: [1.0, 0.0] },
                Segment::Line { from: [1.0, 0.0], to: [1.0, 1.0] },
            ],
            0.01,
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::NotClosed { .. }));
    }

    #[test]
    fn bow_tie_is_not_simple() {
        let bow = Profile::from_segments(
            "bow",
            Placement::xy([0.0; 3]),
            vec![
                Segment::Line { from: [0.0, 0.0], to: [1.0, 1.0] },
                Segment::Line { from: [1.0, 1.0], to: [1.0, 0.0] },
                Segment::Line { from: [1.0, 0.0], to: [0.0, 1.0] },
                Segment::Line { from: [0.0, 1.0], to: [0.0, 0.0] },
            ],
            1e-9,
        )
        .unwrap();
        assert_eq!(bow.self_intersection(), Some((0, 2)));
        assert!(square(1.0).is_simple());
        assert!(disc(1.0).is_simple());
    }

    #[test]
    fn fold_back_is_not_simple() {
        let spike = Profile::from_segments(
            "spike",
            Placement::xy([0.0; 3]),
            vec![
                Segment::Line { from: [0.0, 0.0], to: [0.0, 1.0] },
                Segment::Line { from: [0.0, 1.0], to: [2.0, 1.0] },
                Segment::Line { from: [2.0, 1.0], to: [1.0, 1.0] },
                Segment::Line { from: [1.0, 1.0], to: [0.0, 0.0] },
            ],
            1e-9,
        )
        .unwrap();
        assert!(!spike.is_simple());
    }

    #[test]
    fn placement_round_trip() {
        let pl = Placement::meridional([3.0, 4.0, 2.0]);
        let w = pl.to_world([1.0, -1.0]);
        assert_relative_eq!(w[0], 3.6, epsilon = 1e-12);
        assert_relative_eq!(w[1], 4.8, epsilon = 1e-12);
        assert_relative_eq!(w[2], 1.0, epsilon = 1e-12);
        let (uv, n) = pl.to_local(w);
        assert_relative_eq!(uv[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(uv[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(n, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn named_planes_have_expected_normals() {
        assert_eq!(Placement::xz([0.0; 3]).normal(), [0.0, -1.0, 0.0]);
        assert_eq!(Placement::yz([0.0; 3]).normal(), [1.0, 0.0, 0.0]);
        assert_eq!(Placement::xy([0.0; 3]).normal(), [0.0, 0.0, 1.0]);
    }
}
