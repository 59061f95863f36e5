//! Immutable outline builder: a start point plus an ordered list of relative
//! moves, turned into a verified closed [`Profile`].

use crate::profile::{dist, Placement, Point2, Profile, ProfileError, Segment};

/// One relative move of the outline cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Straight line by `(du, dv)`.
    Line(f64, f64),
    /// Three-point arc; `via` and `to` are relative to the cursor.
    Arc { via: Point2, to: Point2 },
    /// Straight line back to the start point, skipped if already there.
    Close,
}

/// Trace `steps` from `start` and return the closed profile.
///
/// The cursor must end within `tolerance` of `start`; the final segment is
/// then snapped onto the start point so the stored loop closes exactly.
pub fn trace(
    name: &str,
    placement: Placement,
    start: Point2,
    steps: &[Step],
    tolerance: f64,
) -> Result<Profile, ProfileError> {
    let mut cursor = start;
    let mut segments = Vec::with_capacity(steps.len());

    for step in steps {
        match *step {
            Step::Line(du, dv) => {
                let to = [cursor[0] + du, cursor[1] + dv];
                segments.push(Segment::Line { from: cursor, to });
                cursor = to;
            }
            Step::Arc { via, to } => {
                let via = [cursor[0] + via[0], cursor[1] + via[1]];
                let to = [cursor[0] + to[0], cursor[1] + to[1]];
                segments.push(Segment::Arc {
                    from: cursor,
                    via,
                    to,
                });
                cursor = to;
            }
            Step::Close => {
                if dist(cursor, start) > tolerance {
                    segments.push(Segment::Line {
                        from: cursor,
                        to: start,
                    });
                }
                cursor = start;
            }
        }
    }

    let gap = dist(cursor, start);
    if gap > tolerance {
        return Err(ProfileError::NotClosed {
            name: name.to_string(),
            gap,
            tolerance,
        });
    }
    if let Some(last) = segments.last_mut() {
        *last = match *last {
            Segment::Line { from, .. } => Segment::Line { from, to: start },
            Segment::Arc { from, via, .. } => Segment::Arc {
                from,
                via,
                to: start,
            },
        };
    }

    Profile::from_segments(name, placement, segments, tolerance)
}

impl Profile {
    /// Axis-aligned rectangle centred on `center`, traced clockwise from its
    /// top-left corner.
    pub fn rectangle(
        name: &str,
        placement: Placement,
        center: Point2,
        width: f64,
        height: f64,
        tolerance: f64,
    ) -> Result<Profile, ProfileError> {
        trace(
            name,
            placement,
            [center[0] - width / 2.0, center[1] + height / 2.0],
            &[
                Step::Line(width, 0.0),
                Step::Line(0.0, -height),
                Step::Line(-width, 0.0),
                Step::Line(0.0, height),
            ],
            tolerance,
        )
    }

    /// Full circle as two clockwise half arcs.
    pub fn circle(
        name: &str,
        placement: Placement,
        center: Point2,
        radius: f64,
        tolerance: f64,
    ) -> Result<Profile, ProfileError> {
        let r = radius;
        trace(
            name,
            placement,
            [center[0] + r, center[1]],
            &[
                Step::Arc {
                    via: [-r, -r],
                    to: [-2.0 * r, 0.0],
                },
                Step::Arc {
                    via: [r, r],
                    to: [2.0 * r, 0.0],
                },
            ],
            tolerance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Winding;
    use approx::assert_relative_eq;

    #[test]
    fn explicit_return_closes() {
        let p = trace(
            "l-shape",
            Placement::xy([0.0; 3]),
            [0.0, 0.0],
            &[
                Step::Line(0.0, 2.0),
                Step::Line(1.0, 0.0),
                Step::Line(0.0, -1.0),
                Step::Line(1.0, 0.0),
                Step::Line(0.0, -1.0),
                Step::Line(-2.0, 0.0),
            ],
            1e-9,
        )
        .unwrap();
        assert_eq!(p.segments().len(), 6);
        assert_eq!(p.closure_gap(), 0.0);
        assert_relative_eq!(p.area(), 3.0, epsilon = 1e-12);
        assert_eq!(p.winding(), Winding::Clockwise);
    }

    #[test]
    fn missing_return_is_a_closure_error() {
        let err = trace(
            "open",
            Placement::xy([0.0; 3]),
            [0.0, 0.0],
            &[Step::Line(1.0, 0.0), Step::Line(0.0, 1.0)],
            0.01,
        )
        .unwrap_err();
        match err {
            ProfileError::NotClosed { gap, .. } => {
                assert_relative_eq!(gap, 2f64.sqrt(), epsilon = 1e-12)
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn small_gap_within_tolerance_is_snapped() {
        let p = trace(
            "nearly",
            Placement::xy([0.0; 3]),
            [0.0, 0.0],
            &[
                Step::Line(1.0, 0.0),
                Step::Line(0.0, -1.0),
                Step::Line(-1.0, 0.0),
                Step::Line(0.0, 0.995),
            ],
            0.01,
        )
        .unwrap();
        assert_eq!(p.closure_gap(), 0.0);
    }

    #[test]
    fn close_step_adds_final_edge() {
        let p = trace(
            "tri",
            Placement::xy([0.0; 3]),
            [0.0, 0.0],
            &[Step::Line(2.0, 0.0), Step::Line(0.0, -2.0), Step::Close],
            1e-9,
        )
        .unwrap();
        assert_eq!(p.segments().len(), 3);
        assert_relative_eq!(p.area(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rectangle_and_circle_are_clockwise() {
        let rect = Profile::rectangle("r", Placement::yz([0.0; 3]), [0.0, 5.0], 4.0, 2.0, 1e-9)
            .unwrap();
        assert_eq!(rect.winding(), Winding::Clockwise);
        let b = rect.bounds();
        assert_relative_eq!(b[1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(b[3], 6.0, epsilon = 1e-12);

        let circle = Profile::circle("c", Placement::xy([0.0; 3]), [1.0, 1.0], 3.0, 1e-9)
            .unwrap();
        assert_eq!(circle.winding(), Winding::Clockwise);
        assert!(circle.contains([1.0, 1.0]));
        assert!(!circle.contains([4.1, 1.0]));
    }
}
