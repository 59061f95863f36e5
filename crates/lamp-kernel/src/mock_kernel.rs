//! MockKernel, a deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Every solid is an axis-aligned box derived from the bounds of its inputs,
//! with a synthetic 8/12/6 topology. Each call is appended to an operation
//! log, and any call can be made to fail so pipeline ordering and failure
//! attribution are testable without real geometry.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::geom::Aabb;
use crate::lattice::Occupancy;
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// Kernel operations as recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    SamplePath,
    Sweep,
    Extrude,
    ExtrudeFace,
    Offset,
    Union,
    Subtract,
    Intersect,
    Fillet,
    Tessellate,
}

/// One logged kernel call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub op: MockOp,
    /// Profile name for profile operations, empty otherwise.
    pub detail: String,
}

#[derive(Debug, Clone)]
struct MockVertex {
    id: KernelId,
    position: [f64; 3],
}

#[derive(Debug, Clone)]
struct MockEdge {
    id: KernelId,
    start: [f64; 3],
    end: [f64; 3],
}

#[derive(Debug, Clone)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    normal: [f64; 3],
    /// Bounds of the face rectangle.
    bounds: Aabb,
}

#[derive(Debug, Clone)]
struct MockSolid {
    bounds: Aabb,
    vertices: Vec<MockVertex>,
    edges: Vec<MockEdge>,
    faces: Vec<MockFace>,
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    paths: HashMap<u64, Aabb>,
    solids: HashMap<u64, MockSolid>,
    log: RefCell<Vec<MockCall>>,
    counts: RefCell<HashMap<MockOp, usize>>,
    failures: Vec<(MockOp, usize)>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            paths: HashMap::new(),
            solids: HashMap::new(),
            log: RefCell::new(Vec::new()),
            counts: RefCell::new(HashMap::new()),
            failures: Vec::new(),
        }
    }

    /// Make the `nth` call (1-based) of `op` fail.
    pub fn fail_on(&mut self, op: MockOp, nth: usize) {
        self.failures.push((op, nth));
    }

    /// Every call made so far, in order.
    pub fn log(&self) -> Vec<MockCall> {
        self.log.borrow().clone()
    }

    /// The operations of [`MockKernel::log`] without details.
    pub fn ops(&self) -> Vec<MockOp> {
        self.log.borrow().iter().map(|c| c.op).collect()
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    /// Log a call and return the injected failure, if any.
    fn record(&self, op: MockOp, detail: &str) -> Result<(), KernelError> {
        self.log.borrow_mut().push(MockCall {
            op,
            detail: detail.to_string(),
        });
        let mut counts = self.counts.borrow_mut();
        let n = counts.entry(op).or_insert(0);
        *n += 1;
        if !self.failures.contains(&(op, *n)) {
            return Ok(());
        }
        let reason = format!("injected failure on call {} of {:?}", n, op);
        Err(match op {
            MockOp::SamplePath | MockOp::Sweep => KernelError::SweepFailed { reason },
            MockOp::Extrude | MockOp::ExtrudeFace => KernelError::ExtrudeFailed { reason },
            MockOp::Offset => KernelError::OffsetFailed { reason },
            MockOp::Union | MockOp::Subtract | MockOp::Intersect => {
                KernelError::BooleanFailed { reason }
            }
            MockOp::Fillet => KernelError::FilletFailed { reason },
            MockOp::Tessellate => KernelError::TessellationFailed { reason },
        })
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids.get(&handle.id()).ok_or(KernelError::EntityNotFound {
            id: KernelId(handle.id()),
        })
    }

    /// Store a box solid spanning `bounds` with fresh ids.
    fn make_box_solid(&mut self, bounds: Aabb) -> KernelSolidHandle {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        let positions = [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];
        let vertices: Vec<MockVertex> = positions
            .iter()
            .map(|&position| MockVertex {
                id: self.alloc_id(),
                position,
            })
            .collect();

        // 4 bottom, 4 top, 4 vertical
        let edge_pairs = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        let edges: Vec<MockEdge> = edge_pairs
            .iter()
            .map(|&(s, e)| MockEdge {
                id: self.alloc_id(),
                start: positions[s],
                end: positions[e],
            })
            .collect();

        // bottom, top, front (y0), back (y1), left (x0), right (x1)
        let face_defs: [([usize; 4], [f64; 3], [usize; 4]); 6] = [
            ([0, 1, 2, 3], [0.0, 0.0, -1.0], [0, 1, 2, 3]),
            ([4, 5, 6, 7], [0.0, 0.0, 1.0], [4, 5, 6, 7]),
            ([0, 9, 4, 8], [0.0, -1.0, 0.0], [0, 1, 5, 4]),
            ([2, 11, 6, 10], [0.0, 1.0, 0.0], [2, 3, 7, 6]),
            ([3, 8, 7, 11], [-1.0, 0.0, 0.0], [0, 3, 7, 4]),
            ([1, 10, 5, 9], [1.0, 0.0, 0.0], [1, 2, 6, 5]),
        ];
        let faces: Vec<MockFace> = face_defs
            .iter()
            .map(|(edge_idx, normal, corner_idx)| MockFace {
                id: self.alloc_id(),
                edges: edge_idx.iter().map(|&i| edges[i].id).collect(),
                normal: *normal,
                bounds: Aabb::from_points(corner_idx.iter().map(|&i| positions[i])),
            })
            .collect();

        let handle = self.alloc_handle();
        self.solids.insert(
            handle,
            MockSolid {
                bounds,
                vertices,
                edges,
                faces,
            },
        );
        KernelSolidHandle(handle)
    }

    fn all_faces(&self) -> impl Iterator<Item = &MockFace> {
        self.solids.values().flat_map(|s| s.faces.iter())
    }

    fn all_edges(&self) -> impl Iterator<Item = &MockEdge> {
        self.solids.values().flat_map(|s| s.edges.iter())
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds of a profile's outline in world coordinates.
fn profile_world_bounds(profile: &Profile) -> Aabb {
    let b = profile.bounds();
    let placement = profile.placement();
    Aabb::from_points(
        [[b[0], b[1]], [b[2], b[1]], [b[2], b[3]], [b[0], b[3]]]
            .into_iter()
            .map(|uv| placement.to_world(uv)),
    )
}

fn translated(b: &Aabb, v: [f64; 3]) -> Aabb {
    Aabb {
        min: [b.min[0] + v[0], b.min[1] + v[1], b.min[2] + v[2]],
        max: [b.max[0] + v[0], b.max[1] + v[1], b.max[2] + v[2]],
    }
}

fn signature_of_face(face: &MockFace) -> TopoSignature {
    let e = face.bounds.extent();
    let area = e[0] * e[1] + e[1] * e[2] + e[0] * e[2];
    let b = face.bounds.to_array();
    TopoSignature {
        surface_type: Some("planar".to_string()),
        area: Some(area),
        centroid: Some([
            (b[0] + b[3]) / 2.0,
            (b[1] + b[4]) / 2.0,
            (b[2] + b[5]) / 2.0,
        ]),
        normal: Some(face.normal),
        bbox: Some(b),
        ..TopoSignature::empty()
    }
}

fn signature_of_edge(edge: &MockEdge) -> TopoSignature {
    let d = [
        edge.end[0] - edge.start[0],
        edge.end[1] - edge.start[1],
        edge.end[2] - edge.start[2],
    ];
    let length = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
    let direction = (length > 1e-12).then(|| [d[0] / length, d[1] / length, d[2] / length]);
    TopoSignature {
        surface_type: Some("line".to_string()),
        centroid: Some([
            (edge.start[0] + edge.end[0]) / 2.0,
            (edge.start[1] + edge.end[1]) / 2.0,
            (edge.start[2] + edge.end[2]) / 2.0,
        ]),
        direction,
        bbox: Some(Aabb::from_points([edge.start, edge.end]).to_array()),
        length: Some(length),
        ..TopoSignature::empty()
    }
}

impl Kernel for MockKernel {
    fn sample_path(
        &mut self,
        curve: &dyn Fn(f64) -> [f64; 3],
        start: f64,
        stop: f64,
    ) -> Result<KernelPathHandle, KernelError> {
        self.record(MockOp::SamplePath, "")?;
        if !(stop > start) {
            return Err(KernelError::SweepFailed {
                reason: format!("invalid path range [{start}, {stop}]"),
            });
        }
        let bounds =
            Aabb::from_points((0..=64).map(|i| curve(start + (stop - start) * i as f64 / 64.0)));
        let handle = self.alloc_handle();
        self.paths.insert(handle, bounds);
        Ok(KernelPathHandle(handle))
    }

    fn sweep_profile(
        &mut self,
        profile: &Profile,
        path: &KernelPathHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Sweep, profile.name())?;
        let path_bounds = *self.paths.get(&path.id()).ok_or(KernelError::EntityNotFound {
            id: KernelId(path.id()),
        })?;
        let b = profile.bounds();
        let reach = b.iter().fold(0.0f64, |m, c| m.max(c.abs()));
        Ok(self.make_box_solid(path_bounds.expanded(reach)))
    }

    fn extrude_profile(
        &mut self,
        profile: &Profile,
        vector: [f64; 3],
        symmetric: bool,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Extrude, profile.name())?;
        let base = profile_world_bounds(profile);
        let far = translated(&base, vector);
        let near = if symmetric {
            translated(&base, [-vector[0], -vector[1], -vector[2]])
        } else {
            base
        };
        Ok(self.make_box_solid(near.union(&far)))
    }

    fn extrude_face(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
        vector: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::ExtrudeFace, "")?;
        let bounds = self
            .solid(solid)?
            .faces
            .iter()
            .find(|f| f.id == face)
            .map(|f| f.bounds)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        Ok(self.make_box_solid(bounds.union(&translated(&bounds, vector))))
    }

    fn offset_profile(&self, profile: &Profile, distance: f64) -> Result<Profile, KernelError> {
        self.record(MockOp::Offset, profile.name())?;
        crate::offset::offset_profile(profile, distance, 1e-6)
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Union, "")?;
        let bounds = self.solid(a)?.bounds.union(&self.solid(b)?.bounds);
        Ok(self.make_box_solid(bounds))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Subtract, "")?;
        self.solid(b)?;
        let bounds = self.solid(a)?.bounds;
        Ok(self.make_box_solid(bounds))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Intersect, "")?;
        let bounds = self.solid(a)?.bounds.intersection(&self.solid(b)?.bounds);
        if bounds.is_empty() {
            return Err(KernelError::EmptyResult {
                operation: "boolean intersect".into(),
            });
        }
        Ok(self.make_box_solid(bounds))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Fillet, "")?;
        let s = self.solid(solid)?;
        if edges.is_empty() || radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: format!("{} edges at radius {radius}", edges.len()),
            });
        }
        if let Some(&missing) = edges.iter().find(|id| !s.edges.iter().any(|e| e.id == **id)) {
            return Err(KernelError::EntityNotFound { id: missing });
        }
        let bounds = s.bounds;
        Ok(self.make_box_solid(bounds))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        _cell_size: f64,
    ) -> Result<RenderMesh, KernelError> {
        self.record(MockOp::Tessellate, "")?;
        let s = self.solid(solid)?;
        let vertices = s
            .vertices
            .iter()
            .flat_map(|v| v.position.map(|c| c as f32))
            .collect();
        let center = s.bounds.to_array();
        let c = [
            (center[0] + center[3]) / 2.0,
            (center[1] + center[4]) / 2.0,
            (center[2] + center[5]) / 2.0,
        ];
        let normals = s
            .vertices
            .iter()
            .flat_map(|v| {
                let d = [v.position[0] - c[0], v.position[1] - c[1], v.position[2] - c[2]];
                let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt().max(1e-12);
                d.map(|x| (x / len) as f32)
            })
            .collect();
        // Two outward triangles per face over the corner numbering above.
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Ok(RenderMesh {
            vertices,
            normals,
            indices,
        })
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.all_faces()
            .find(|f| f.id == face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        self.all_faces()
            .filter(|f| f.edges.contains(&edge))
            .map(|f| f.id)
            .collect()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let found = match kind {
            TopoKind::Face => self.all_faces().find(|f| f.id == entity).map(signature_of_face),
            TopoKind::Edge => self.all_edges().find(|e| e.id == entity).map(signature_of_edge),
            TopoKind::Vertex => self
                .solids
                .values()
                .flat_map(|s| s.vertices.iter())
                .find(|v| v.id == entity)
                .map(|v| TopoSignature {
                    surface_type: Some("point".to_string()),
                    centroid: Some(v.position),
                    ..TopoSignature::empty()
                }),
        };
        found.unwrap_or_else(TopoSignature::empty)
    }

    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let ids = match kind {
            TopoKind::Face => self.list_faces(solid),
            TopoKind::Edge => self.list_edges(solid),
            TopoKind::Vertex => self.list_vertices(solid),
        };
        ids.into_iter()
            .map(|id| (id, self.compute_signature(id, kind)))
            .collect()
    }

    fn contains_point(&self, solid: &KernelSolidHandle, point: [f64; 3]) -> bool {
        self.solids
            .get(&solid.id())
            .map_or(false, |s| s.bounds.contains_point(point))
    }

    fn occupancy(
        &self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<Occupancy, KernelError> {
        let bounds = self.solid(solid)?.bounds;
        Occupancy::sample(&bounds, cell_size, true, 8, u64::MAX, |_| true, |p| {
            bounds.contains_point(p)
        })
    }

    fn occupancy_within(
        &self,
        solid: &KernelSolidHandle,
        region: [f64; 6],
        cell_size: f64,
    ) -> Result<Occupancy, KernelError> {
        let bounds = self.solid(solid)?.bounds;
        let region = Aabb::from_array(region).intersection(&bounds);
        Occupancy::sample(&region, cell_size, false, 8, u64::MAX, |_| true, |p| {
            bounds.contains_point(p)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamp_types::Placement;

    fn square(name: &str) -> Profile {
        Profile::rectangle(name, Placement::xy([0.0; 3]), [0.5, 0.5], 1.0, 1.0, 1e-9).unwrap()
    }

    #[test]
    fn test_euler_formula_box() {
        let mut mk = MockKernel::new();
        let h = mk.extrude_profile(&square("sq"), [0.0, 0.0, 2.0], false).unwrap();
        let v = mk.list_vertices(&h).len() as i64;
        let e = mk.list_edges(&h).len() as i64;
        let f = mk.list_faces(&h).len() as i64;
        assert_eq!(v - e + f, 2);
        for face in mk.list_faces(&h) {
            for edge in mk.face_edges(face) {
                assert!(mk.edge_faces(edge).contains(&face));
            }
        }
    }

    #[test]
    fn test_boxes_follow_input_bounds() {
        let mut mk = MockKernel::new();
        let a = mk.extrude_profile(&square("a"), [0.0, 0.0, 2.0], false).unwrap();
        let b = mk.extrude_profile(&square("b"), [0.0, 0.0, 1.0], true).unwrap();
        let u = mk.boolean_union(&a, &b).unwrap();
        assert!(mk.contains_point(&u, [0.5, 0.5, -0.5]));
        assert!(mk.contains_point(&u, [0.5, 0.5, 1.5]));
        let i = mk.boolean_intersect(&a, &b).unwrap();
        assert!(!mk.contains_point(&i, [0.5, 0.5, 1.5]));
        let v = mk.volume(&i, 0.25).unwrap();
        assert!(v > 0.0);
    }

    #[test]
    fn test_log_records_calls_in_order() {
        let mut mk = MockKernel::new();
        let curve = |t: f64| [10.0 * t.cos(), 10.0 * t.sin(), -t];
        let path = mk.sample_path(&curve, 0.0, 1.0).unwrap();
        let s = mk.sweep_profile(&square("main"), &path).unwrap();
        let c = mk.extrude_profile(&square("hole"), [0.0, 0.0, 1.0], true).unwrap();
        mk.boolean_subtract(&s, &c).unwrap();
        assert_eq!(
            mk.ops(),
            vec![MockOp::SamplePath, MockOp::Sweep, MockOp::Extrude, MockOp::Subtract]
        );
        assert_eq!(mk.log()[1].detail, "main");
    }

    #[test]
    fn test_fail_on_nth_call() {
        let mut mk = MockKernel::new();
        mk.fail_on(MockOp::Extrude, 2);
        assert!(mk.extrude_profile(&square("a"), [0.0, 0.0, 1.0], false).is_ok());
        let err = mk.extrude_profile(&square("b"), [0.0, 0.0, 1.0], false).unwrap_err();
        assert!(matches!(err, KernelError::ExtrudeFailed { .. }));
        assert!(mk.extrude_profile(&square("c"), [0.0, 0.0, 1.0], false).is_ok());
    }

    #[test]
    fn test_tessellated_box_is_outward() {
        let mut mk = MockKernel::new();
        let h = mk.extrude_profile(&square("sq"), [0.0, 0.0, 1.0], false).unwrap();
        let mesh = mk.tessellate(&h, 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        let v = |i: u32| {
            let i = i as usize * 3;
            [
                mesh.vertices[i] as f64,
                mesh.vertices[i + 1] as f64,
                mesh.vertices[i + 2] as f64,
            ]
        };
        let volume: f64 = mesh
            .indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (v(t[0]), v(t[1]), v(t[2]));
                (a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                    + a[2] * (b[0] * c[1] - b[1] * c[0]))
                    / 6.0
            })
            .sum();
        assert!((volume - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fillet_unknown_edge() {
        let mut mk = MockKernel::new();
        let h = mk.extrude_profile(&square("sq"), [0.0, 0.0, 1.0], false).unwrap();
        let err = mk.fillet_edges(&h, &[KernelId(9999)], 0.1).unwrap_err();
        assert_eq!(err, KernelError::EntityNotFound { id: KernelId(9999) });
    }
}
