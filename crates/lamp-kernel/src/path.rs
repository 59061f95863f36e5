//! Sampled sweep paths.
//!
//! A path is stored in cylindrical form: unwrapped azimuth, radius and
//! height per sample. Sweeps look sections up by azimuth, so the azimuth
//! must increase strictly along the path.

use std::f64::consts::{PI, TAU};

use tracing::debug;

use crate::types::KernelError;

#[derive(Debug, Clone)]
pub struct SampledPath {
    params: Vec<f64>,
    azimuth: Vec<f64>,
    radius: Vec<f64>,
    height: Vec<f64>,
}

impl SampledPath {
    /// Sample `curve` over `[start, stop]` at `per_unit` samples per unit of
    /// parameter (at least 16 samples in total).
    pub fn sample(
        curve: &dyn Fn(f64) -> [f64; 3],
        start: f64,
        stop: f64,
        per_unit: f64,
    ) -> Result<Self, KernelError> {
        if !(start.is_finite() && stop.is_finite()) || stop <= start {
            return Err(KernelError::SweepFailed {
                reason: format!("invalid path range [{start}, {stop}]"),
            });
        }
        let n = (((stop - start) * per_unit).ceil() as usize).max(16);
        let mut params = Vec::with_capacity(n + 1);
        let mut azimuth = Vec::with_capacity(n + 1);
        let mut radius = Vec::with_capacity(n + 1);
        let mut height = Vec::with_capacity(n + 1);

        for i in 0..=n {
            let t = start + (stop - start) * i as f64 / n as f64;
            let p = curve(t);
            if p.iter().any(|c| !c.is_finite()) {
                return Err(KernelError::SweepFailed {
                    reason: format!("path is not finite at t = {t}"),
                });
            }
            let rho = p[0].hypot(p[1]);
            if rho < 1e-9 {
                return Err(KernelError::SweepFailed {
                    reason: format!("path touches the Z axis at t = {t}"),
                });
            }
            let raw = p[1].atan2(p[0]);
            let phi = match azimuth.last() {
                None => raw,
                Some(&prev) => prev + wrap_angle(raw - prev),
            };
            params.push(t);
            azimuth.push(phi);
            radius.push(rho);
            height.push(p[2]);
        }

        debug!(
            samples = params.len(),
            start,
            stop,
            turns = (azimuth[n] - azimuth[0]) / TAU,
            "path sampled"
        );
        Ok(Self {
            params,
            azimuth,
            radius,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn param(&self, i: usize) -> f64 {
        self.params[i]
    }

    pub fn azimuth(&self, i: usize) -> f64 {
        self.azimuth[i]
    }

    pub fn radius(&self, i: usize) -> f64 {
        self.radius[i]
    }

    pub fn height(&self, i: usize) -> f64 {
        self.height[i]
    }

    pub fn point(&self, i: usize) -> [f64; 3] {
        let (s, c) = self.azimuth[i].sin_cos();
        [self.radius[i] * c, self.radius[i] * s, self.height[i]]
    }

    /// `(first, last)` unwrapped azimuth.
    pub fn azimuth_range(&self) -> (f64, f64) {
        (self.azimuth[0], self.azimuth[self.len() - 1])
    }

    /// Whether the azimuth increases strictly from sample to sample.
    pub fn is_monotonic(&self) -> bool {
        self.azimuth.windows(2).all(|w| w[1] > w[0])
    }

    /// Largest azimuth step between consecutive samples.
    pub fn max_step(&self) -> f64 {
        self.azimuth
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0, f64::max)
    }

    /// Index `i` of the sample interval `[i, i + 1]` holding `phi`, clamped.
    fn interval(&self, phi: f64) -> usize {
        let last = self.len() - 1;
        match self.azimuth.partition_point(|&a| a <= phi) {
            0 => 0,
            k if k > last => last - 1,
            k => k - 1,
        }
    }

    /// Radius and height of the path at azimuth `phi`, linearly
    /// interpolated between samples and clamped to the ends.
    pub fn at(&self, phi: f64) -> (f64, f64) {
        let i = self.interval(phi);
        let (a0, a1) = (self.azimuth[i], self.azimuth[i + 1]);
        let s = ((phi - a0) / (a1 - a0)).clamp(0.0, 1.0);
        (
            self.radius[i] + (self.radius[i + 1] - self.radius[i]) * s,
            self.height[i] + (self.height[i + 1] - self.height[i]) * s,
        )
    }

    /// `(dr/dφ, dz/dφ)` of the interpolated path at `phi`.
    pub fn slope(&self, phi: f64) -> (f64, f64) {
        let i = self.interval(phi);
        let da = self.azimuth[i + 1] - self.azimuth[i];
        (
            (self.radius[i + 1] - self.radius[i]) / da,
            (self.height[i + 1] - self.height[i]) / da,
        )
    }

    /// Total 3D length of the sampled polyline.
    pub fn length(&self) -> f64 {
        (1..self.len())
            .map(|i| {
                let a = self.point(i - 1);
                let b = self.point(i);
                ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2) + (b[2] - a[2]).powi(2)).sqrt()
            })
            .sum()
    }
}

/// Wrap an angle difference into `(-π, π]`.
fn wrap_angle(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI {
        w + TAU
    } else {
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn helix(t: f64) -> [f64; 3] {
        [10.0 * t.cos(), 10.0 * t.sin(), 2.0 * t]
    }

    #[test]
    fn helix_unwraps_past_a_full_turn() {
        let path = SampledPath::sample(&helix, 0.0, 3.0 * TAU, 16.0).unwrap();
        assert!(path.is_monotonic());
        let (a0, a1) = path.azimuth_range();
        assert_relative_eq!(a0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(a1, 3.0 * TAU, epsilon = 1e-9);
        let (r, z) = path.at(7.0);
        assert_relative_eq!(r, 10.0, epsilon = 1e-9);
        assert_relative_eq!(z, 14.0, epsilon = 1e-9);
        let (dr, dz) = path.slope(7.0);
        assert_relative_eq!(dr, 0.0, epsilon = 1e-9);
        assert_relative_eq!(dz, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn lookup_clamps_outside_the_range() {
        let path = SampledPath::sample(&helix, 0.0, PI, 16.0).unwrap();
        let (_, z) = path.at(-1.0);
        assert_relative_eq!(z, 0.0, epsilon = 1e-12);
        let (_, z) = path.at(10.0);
        assert_relative_eq!(z, 2.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn reversed_travel_is_not_monotonic() {
        let back = |t: f64| helix(-t);
        let path = SampledPath::sample(&back, 0.0, 1.0, 16.0).unwrap();
        assert!(!path.is_monotonic());
    }

    #[test]
    fn axis_crossing_is_rejected() {
        let line = |t: f64| [t, 0.0, 0.0];
        assert!(matches!(
            SampledPath::sample(&line, -1.0, 1.0, 8.0),
            Err(KernelError::SweepFailed { .. })
        ));
    }

    #[test]
    fn empty_range_is_rejected() {
        assert!(SampledPath::sample(&helix, 1.0, 1.0, 8.0).is_err());
    }

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(0.25), 0.25, epsilon = 1e-12);
    }
}
