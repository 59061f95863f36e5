//! Planar offset of closed profiles.
//!
//! Every segment moves along its outward normal by the offset distance.
//! Where the moved pieces open a gap (a convex corner when growing) the gap
//! is bridged by a round arc about the original vertex; where they overlap
//! two straight pieces are trimmed at their intersection. Arcs shrunk to
//! nothing are dropped.

use lamp_types::{Point2, Profile, Segment, Winding};
use tracing::debug;

use crate::types::KernelError;

pub fn offset_profile(
    profile: &Profile,
    distance: f64,
    tolerance: f64,
) -> Result<Profile, KernelError> {
    if !distance.is_finite() {
        return Err(KernelError::OffsetFailed {
            reason: format!("distance must be finite, got {distance}"),
        });
    }
    if distance == 0.0 {
        return Ok(profile.clone());
    }
    let winding = profile.winding();
    // Left normals point outward on clockwise loops.
    let d = match winding {
        Winding::Clockwise => distance,
        Winding::CounterClockwise => -distance,
    };
    let fail = |reason: String| KernelError::OffsetFailed { reason };

    let originals = profile.segments();
    let n = originals.len();
    let (source, mut pieces): (Vec<usize>, Vec<Segment>) = originals
        .iter()
        .enumerate()
        .filter_map(|(i, seg)| shift(seg, d, tolerance).map(|m| (i, m)))
        .unzip();
    let count = pieces.len();
    if count < 2 {
        return Err(fail(format!(
            "profile '{}' collapses at offset {distance}",
            profile.name()
        )));
    }

    let mut joins: Vec<Option<Segment>> = vec![None; count];
    for k in 0..count {
        let next = (k + 1) % count;
        let (i, j) = (source[k], source[next]);
        let end = pieces[k].end();
        let start = pieces[next].start();
        if dist(end, start) <= tolerance {
            pieces[next] = with_start(&pieces[next], end);
            continue;
        }
        if j != (i + 1) % n {
            return Err(fail(format!(
                "offset of '{}' leaves a gap after a collapsed segment",
                profile.name()
            )));
        }

        let vertex = originals[i].end();
        let t_in = originals[i].tangent_at(1.0);
        let t_out = originals[j].tangent_at(0.0);
        let turn = t_in[0] * t_out[1] - t_in[1] * t_out[0];
        if d * turn < 0.0 {
            let n_in = originals[i].left_normal_at(1.0);
            let n_out = originals[j].left_normal_at(0.0);
            let bis = [n_in[0] + n_out[0], n_in[1] + n_out[1]];
            let len = bis[0].hypot(bis[1]);
            if len < 1e-9 {
                return Err(fail(format!("profile '{}' folds back", profile.name())));
            }
            let via = [vertex[0] + d * bis[0] / len, vertex[1] + d * bis[1] / len];
            joins[k] = Some(Segment::Arc {
                from: end,
                via,
                to: start,
            });
        } else {
            match (pieces[k], pieces[next]) {
                (Segment::Line { from: a0, to: a1 }, Segment::Line { from: b0, to: b1 }) => {
                    let x = line_intersection(a0, a1, b0, b1).ok_or_else(|| {
                        fail(format!("parallel pieces of '{}' cannot meet", profile.name()))
                    })?;
                    pieces[k] = Segment::Line { from: a0, to: x };
                    pieces[next] = Segment::Line { from: x, to: b1 };
                }
                _ => {
                    return Err(fail(format!(
                        "concave corner of '{}' next to a curved segment",
                        profile.name()
                    )))
                }
            }
        }
    }

    // A straight piece trimmed past its own length runs backwards.
    for (piece, &i) in pieces.iter().zip(&source) {
        if let Segment::Line { from, to } = *piece {
            let (a, b) = (originals[i].start(), originals[i].end());
            let along = (to[0] - from[0]) * (b[0] - a[0]) + (to[1] - from[1]) * (b[1] - a[1]);
            if along <= 0.0 {
                return Err(fail(format!(
                    "profile '{}' collapses at offset {distance}",
                    profile.name()
                )));
            }
        }
    }

    let segments: Vec<Segment> = pieces
        .into_iter()
        .zip(joins)
        .flat_map(|(piece, join)| std::iter::once(piece).chain(join))
        .collect();
    let result = Profile::from_segments(profile.name(), *profile.placement(), segments, tolerance)
        .map_err(|e| fail(e.to_string()))?;
    result.ensure_simple().map_err(|e| fail(e.to_string()))?;
    if result.winding() != winding {
        return Err(fail(format!("offset of '{}' turns inside out", profile.name())));
    }
    debug!(
        profile = profile.name(),
        distance,
        segments = result.segments().len(),
        "offset profile"
    );
    Ok(result)
}

/// Move a segment by `d` along its left normal. `None` when an arc shrinks
/// to a point.
fn shift(seg: &Segment, d: f64, tolerance: f64) -> Option<Segment> {
    match (*seg, seg.circle()) {
        (Segment::Arc { from, via, to }, Some(c)) => {
            let sign = c.sweep.signum();
            if c.radius - sign * d <= tolerance {
                return None;
            }
            let moved = |p: Point2| {
                let k = 1.0 - sign * d / c.radius;
                [
                    c.center[0] + (p[0] - c.center[0]) * k,
                    c.center[1] + (p[1] - c.center[1]) * k,
                ]
            };
            Some(Segment::Arc {
                from: moved(from),
                via: moved(via),
                to: moved(to),
            })
        }
        _ => {
            let nl = seg.left_normal_at(0.0);
            let (a, b) = (seg.start(), seg.end());
            Some(Segment::Line {
                from: [a[0] + d * nl[0], a[1] + d * nl[1]],
                to: [b[0] + d * nl[0], b[1] + d * nl[1]],
            })
        }
    }
}

fn with_start(seg: &Segment, p: Point2) -> Segment {
    match *seg {
        Segment::Line { to, .. } => Segment::Line { from: p, to },
        Segment::Arc { via, to, .. } => Segment::Arc { from: p, via, to },
    }
}

fn dist(a: Point2, b: Point2) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Crossing of the infinite lines through `a0 a1` and `b0 b1`.
fn line_intersection(a0: Point2, a1: Point2, b0: Point2, b1: Point2) -> Option<Point2> {
    let da = [a1[0] - a0[0], a1[1] - a0[1]];
    let db = [b1[0] - b0[0], b1[1] - b0[1]];
    let den = da[0] * db[1] - da[1] * db[0];
    if den.abs() < 1e-12 * (da[0].hypot(da[1]) * db[0].hypot(db[1])).max(1e-300) {
        return None;
    }
    let s = ((b0[0] - a0[0]) * db[1] - (b0[1] - a0[1]) * db[0]) / den;
    Some([a0[0] + s * da[0], a0[1] + s * da[1]])
}
