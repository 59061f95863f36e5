//! Geometric queries that pick faces and edges for finishing operations.
//!
//! Plain predicates over anything that can report a test vector, a length
//! and a centre, composed with ordinary iterator filtering.

use lamp_kernel::{KernelId, KernelIntrospect, KernelSolidHandle, TopoKind, TopoSignature};

/// Angular tolerance of the parallel test, in radians.
pub const PARALLEL_TOLERANCE: f64 = 1e-4;

/// Geometry a query can look at.
pub trait Selectable {
    /// Normal of a planar face or direction of a straight edge; `None` for
    /// anything curved.
    fn test_vector(&self) -> Option<[f64; 3]>;
    fn length(&self) -> Option<f64>;
    fn center(&self) -> Option<[f64; 3]>;
}

impl Selectable for TopoSignature {
    fn test_vector(&self) -> Option<[f64; 3]> {
        match self.surface_type.as_deref() {
            Some("planar") => self.normal,
            Some("line") => self.direction,
            _ => None,
        }
    }

    fn length(&self) -> Option<f64> {
        self.length
    }

    fn center(&self) -> Option<[f64; 3]> {
        self.centroid
    }
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Test vector parallel or antiparallel to `dir`.
pub fn parallel_to<T: Selectable>(dir: [f64; 3]) -> impl Fn(&T) -> bool {
    move |item| {
        let Some(v) = item.test_vector() else {
            return false;
        };
        let (nv, nd) = (norm(v), norm(dir));
        if nv < 1e-12 || nd < 1e-12 {
            return false;
        }
        let cross = [
            v[1] * dir[2] - v[2] * dir[1],
            v[2] * dir[0] - v[0] * dir[2],
            v[0] * dir[1] - v[1] * dir[0],
        ];
        (norm(cross) / (nv * nd)).asin() < PARALLEL_TOLERANCE
    }
}

/// Strictly longer than `min`.
pub fn longer_than<T: Selectable>(min: f64) -> impl Fn(&T) -> bool {
    move |item| item.length().is_some_and(|l| l > min)
}

/// The item whose centre is closest to `point`. Ties within `1e-9` make the
/// query ambiguous and yield `Err` with both candidates.
pub fn nearest_to<'a, K: Copy + 'a, T: Selectable + 'a>(
    items: impl IntoIterator<Item = (K, &'a T)>,
    point: [f64; 3],
) -> Result<Option<K>, (K, K)> {
    let mut ranked: Vec<(f64, K)> = items
        .into_iter()
        .filter_map(|(key, item)| {
            let c = item.center()?;
            Some((norm([c[0] - point[0], c[1] - point[1], c[2] - point[2]]), key))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    match ranked.as_slice() {
        [] => Ok(None),
        [(_, only)] => Ok(Some(*only)),
        [(d0, first), (d1, second), ..] => {
            if d1 - d0 <= 1e-9 {
                Err((*first, *second))
            } else {
                Ok(Some(*first))
            }
        }
    }
}

/// Signatures of every entity of `kind` on `solid`.
pub fn signatures(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    kind: TopoKind,
) -> Vec<(KernelId, TopoSignature)> {
    introspect.compute_all_signatures(solid, kind)
}

/// Straight edges parallel to `dir` and longer than `min_length`.
pub fn edges_parallel_to(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    dir: [f64; 3],
    min_length: f64,
) -> Vec<KernelId> {
    let parallel = parallel_to(dir);
    let long = longer_than(min_length);
    signatures(introspect, solid, TopoKind::Edge)
        .into_iter()
        .filter(|(_, sig)| parallel(sig) && long(sig))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        vector: Option<[f64; 3]>,
        length: f64,
        center: [f64; 3],
    }

    impl Selectable for Item {
        fn test_vector(&self) -> Option<[f64; 3]> {
            self.vector
        }
        fn length(&self) -> Option<f64> {
            Some(self.length)
        }
        fn center(&self) -> Option<[f64; 3]> {
            Some(self.center)
        }
    }

    fn item(vector: Option<[f64; 3]>, length: f64, center: [f64; 3]) -> Item {
        Item {
            vector,
            length,
            center,
        }
    }

    #[test]
    fn parallel_accepts_both_senses() {
        let z = parallel_to::<Item>([0.0, 0.0, 1.0]);
        assert!(z(&item(Some([0.0, 0.0, 2.0]), 1.0, [0.0; 3])));
        assert!(z(&item(Some([0.0, 0.0, -1.0]), 1.0, [0.0; 3])));
        assert!(!z(&item(Some([0.0, 0.01, 1.0]), 1.0, [0.0; 3])));
        assert!(!z(&item(None, 1.0, [0.0; 3])));
    }

    #[test]
    fn length_filter_is_strict() {
        let long = longer_than::<Item>(4.0);
        assert!(long(&item(None, 4.5, [0.0; 3])));
        assert!(!long(&item(None, 4.0, [0.0; 3])));
        assert!(!long(&item(None, 1.0, [0.0; 3])));
    }

    #[test]
    fn nearest_picks_closest_centre() {
        let items = [
            item(None, 1.0, [10.0, 0.0, 0.0]),
            item(None, 1.0, [1.0, 1.0, 0.0]),
            item(None, 1.0, [0.0, 5.0, 0.0]),
        ];
        let pick = nearest_to(items.iter().enumerate(), [0.0; 3]).unwrap();
        assert_eq!(pick, Some(1));
        let none: [(usize, &Item); 0] = [];
        assert_eq!(nearest_to(none, [0.0; 3]).unwrap(), None);
    }

    #[test]
    fn equidistant_candidates_are_ambiguous() {
        let items = [
            item(None, 1.0, [1.0, 0.0, 0.0]),
            item(None, 1.0, [-1.0, 0.0, 0.0]),
        ];
        assert!(nearest_to(items.iter().enumerate(), [0.0; 3]).is_err());
    }

    #[test]
    fn signature_vectors_follow_entity_type() {
        let planar = TopoSignature {
            surface_type: Some("planar".into()),
            normal: Some([0.0, 0.0, 1.0]),
            ..TopoSignature::empty()
        };
        let swept = TopoSignature {
            surface_type: Some("swept".into()),
            normal: Some([0.0, 0.0, 1.0]),
            ..TopoSignature::empty()
        };
        let line = TopoSignature {
            surface_type: Some("line".into()),
            direction: Some([1.0, 0.0, 0.0]),
            length: Some(3.0),
            ..TopoSignature::empty()
        };
        assert_eq!(planar.test_vector(), Some([0.0, 0.0, 1.0]));
        assert_eq!(swept.test_vector(), None);
        assert_eq!(line.test_vector(), Some([1.0, 0.0, 0.0]));
        assert_eq!(Selectable::length(&line), Some(3.0));
    }
}
