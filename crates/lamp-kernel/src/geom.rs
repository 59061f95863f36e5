//! Small 3D helpers shared by the primitives.

use nalgebra::Vector3;

pub type Vec3 = Vector3<f64>;

pub fn v3(p: [f64; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

pub fn arr(v: &Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Unit vector, or zero for a (near) zero input.
pub fn unit(v: Vec3) -> Vec3 {
    let n = v.norm();
    if n > 1e-15 {
        v / n
    } else {
        Vec3::zeros()
    }
}

/// Two unit vectors spanning the plane perpendicular to `d`.
pub fn perpendicular_basis(d: &Vec3) -> (Vec3, Vec3) {
    let helper = if d.x.abs() < 0.9 {
        Vec3::x()
    } else {
        Vec3::y()
    };
    let b1 = unit(d.cross(&helper));
    let b2 = unit(d.cross(&b1));
    (b1, b2)
}

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            min: [b[0], b[1], b[2]],
            max: [b[3], b[4], b[5]],
        }
    }

    pub fn from_points<I: IntoIterator<Item = [f64; 3]>>(points: I) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include(p);
        }
        bb
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn include(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    pub fn intersection(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].max(other.min[i]);
            out.max[i] = out.max[i].min(other.max[i]);
        }
        out
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn expanded(&self, margin: f64) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Aabb {
            min: [
                self.min[0] - margin,
                self.min[1] - margin,
                self.min[2] - margin,
            ],
            max: [
                self.max[0] + margin,
                self.max[1] + margin,
                self.max[2] + margin,
            ],
        }
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min[0], self.min[1], self.min[2], self.max[0], self.max[1], self.max[2],
        ]
    }
}
