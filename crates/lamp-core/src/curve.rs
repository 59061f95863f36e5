//! The spiral centreline.
//!
//! An error-function blend `e(t)` eases from about `+1` at the top of the
//! coil to about `-1` after the last loop. Height follows `e` directly and
//! the radius follows `1 - e`, so the coil widens smoothly as it descends
//! and never drops below the minimum radius.

use std::f64::consts::{PI, TAU};

use lamp_types::DesignConstants;
use libm::erf;

use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralCurve {
    min_radius: f64,
    radius_scale: f64,
    z_scale: f64,
    loops: f64,
    spread: f64,
}

impl SpiralCurve {
    pub fn new(constants: &DesignConstants) -> Self {
        Self {
            min_radius: constants.min_radius,
            radius_scale: constants.radius_scale,
            z_scale: constants.z_scale,
            loops: constants.loops,
            spread: constants.spread,
        }
    }

    /// Parameter of the last loop's end, `2π·loops`.
    pub fn final_angle(&self) -> f64 {
        TAU * self.loops
    }

    /// Parameters the pipeline may evaluate: half a turn beyond either end.
    pub fn domain(&self) -> (f64, f64) {
        (-PI, self.final_angle() + PI)
    }

    pub fn in_domain(&self, t: f64) -> bool {
        let (lo, hi) = self.domain();
        t >= lo && t <= hi
    }

    /// Envelope blend `e(t)`, strictly decreasing in `t`.
    pub fn blend(&self, t: f64) -> f64 {
        let s = self.spread;
        -erf(2.0 * s * t / self.final_angle() - s)
    }

    pub fn radius(&self, t: f64) -> f64 {
        self.min_radius + self.radius_scale * (1.0 - self.blend(t))
    }

    pub fn height(&self, t: f64) -> f64 {
        self.z_scale * self.blend(t)
    }

    pub fn point(&self, t: f64) -> [f64; 3] {
        debug_assert!(self.in_domain(t), "curve evaluated outside its domain at {t}");
        let r = self.radius(t);
        let (s, c) = t.sin_cos();
        [r * c, r * s, self.height(t)]
    }

    /// Top of the coil, where every cross-section is anchored.
    pub fn start(&self) -> [f64; 3] {
        self.point(0.0)
    }

    pub fn end(&self) -> [f64; 3] {
        self.point(self.final_angle())
    }

    /// `(min, max)` radius over the domain.
    pub fn radius_bounds(&self) -> (f64, f64) {
        let (lo, hi) = self.domain();
        (self.radius(lo), self.radius(hi))
    }

    /// `(min, max)` height over the domain.
    pub fn height_bounds(&self) -> (f64, f64) {
        let (lo, hi) = self.domain();
        (self.height(hi), self.height(lo))
    }

    /// Fail unless `[start, stop]` is a forward range inside the domain.
    pub fn check_range(&self, start: f64, stop: f64) -> Result<(), BuildError> {
        let (min, max) = self.domain();
        if start < stop && self.in_domain(start) && self.in_domain(stop) {
            Ok(())
        } else {
            Err(BuildError::CurveDomain {
                start,
                stop,
                min,
                max,
            })
        }
    }
}
