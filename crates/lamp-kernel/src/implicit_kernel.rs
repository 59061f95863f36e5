//! ImplicitKernel: solids as immutable constructive trees with exact point
//! membership.
//!
//! Booleans only combine trees, so they cannot produce invalid geometry;
//! the work is in bookkeeping which faces and edges survive each step and in
//! sampling the result for volumes and meshes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::KernelConfig;
use crate::fillet::Cusp;
use crate::geom::{arr, unit, v3, Aabb};
use crate::lattice::Occupancy;
use crate::mesher::surface_nets;
use crate::offset;
use crate::path::SampledPath;
use crate::prism::{on_face, trimmed_outline, FaceExtrusion, Prism};
use crate::shape::Shape;
use crate::sweep::Sweep;
use crate::topology::{
    blend_topology, prism_topology, sweep_topology, EdgeRecord, FaceRecord, Topology,
};
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

struct SolidEntry {
    shape: Arc<Shape>,
    topology: Topology,
}

/// Point-membership geometry kernel.
pub struct ImplicitKernel {
    config: KernelConfig,
    next_id: u64,
    next_handle: u64,
    paths: HashMap<u64, Arc<SampledPath>>,
    solids: HashMap<u64, SolidEntry>,
}

impl ImplicitKernel {
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            config,
            next_id: 1,
            next_handle: 1,
            paths: HashMap::new(),
            solids: HashMap::new(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn entry(&self, handle: &KernelSolidHandle) -> Result<&SolidEntry, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    /// Store `shape` with the parts of `parts` that survive on its boundary.
    fn insert(
        &mut self,
        operation: &str,
        shape: Shape,
        parts: &[(&Topology, bool)],
    ) -> Result<KernelSolidHandle, KernelError> {
        let topology =
            Topology::survive(&shape, parts, self.config.probe_epsilon, &mut self.next_id);
        if topology.faces.is_empty() {
            return Err(KernelError::EmptyResult {
                operation: operation.to_string(),
            });
        }
        let handle = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        debug!(
            operation,
            handle = handle.id(),
            faces = topology.faces.len(),
            edges = topology.edges.len(),
            vertices = topology.vertices.len(),
            "solid stored"
        );
        self.solids.insert(
            handle.id(),
            SolidEntry {
                shape: Arc::new(shape),
                topology,
            },
        );
        Ok(handle)
    }

    fn boolean(
        &mut self,
        operation: &str,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let ea = self.entry(a)?;
        let eb = self.entry(b)?;
        let (sa, sb) = (ea.shape.clone(), eb.shape.clone());
        let (ta, tb) = (ea.topology.clone(), eb.topology.clone());
        let (shape, flip_b) = match operation {
            "union" => (Shape::Union(sa, sb), false),
            "subtract" => (Shape::Difference(sa, sb), true),
            "intersect" => (Shape::Intersection(sa, sb), false),
            other => {
                return Err(KernelError::NotSupported {
                    operation: format!("boolean {other}"),
                })
            }
        };
        self.insert(
            &format!("boolean {operation}"),
            shape,
            &[(&ta, false), (&tb, flip_b)],
        )
    }

    fn sample(
        &self,
        solid: &KernelSolidHandle,
        region: Option<Aabb>,
        cell_size: f64,
    ) -> Result<Occupancy, KernelError> {
        let shape = &self.entry(solid)?.shape;
        let bbox = shape.bbox();
        let (region, pad) = match region {
            Some(r) => (r.intersection(&bbox), false),
            None => (bbox, true),
        };
        Occupancy::sample(
            &region,
            cell_size,
            pad,
            self.config.block_size,
            self.config.max_lattice_points,
            |b| shape.may_intersect(b),
            |p| shape.contains(p),
        )
    }

    fn find_face(&self, id: KernelId) -> Option<&FaceRecord> {
        self.solids.values().find_map(|e| e.topology.face(id))
    }

    fn find_edge(&self, id: KernelId) -> Option<&EdgeRecord> {
        self.solids.values().find_map(|e| e.topology.edge(id))
    }
}

impl Default for ImplicitKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for ImplicitKernel {
    #[instrument(skip(self, curve))]
    fn sample_path(
        &mut self,
        curve: &dyn Fn(f64) -> [f64; 3],
        start: f64,
        stop: f64,
    ) -> Result<KernelPathHandle, KernelError> {
        let path =
            SampledPath::sample(curve, start, stop, self.config.path_samples_per_unit)?;
        debug!(samples = path.len(), length = path.length(), "path sampled");
        let handle = KernelPathHandle(self.next_handle);
        self.next_handle += 1;
        self.paths.insert(handle.id(), Arc::new(path));
        Ok(handle)
    }

    #[instrument(skip(self, profile), fields(profile = profile.name()))]
    fn sweep_profile(
        &mut self,
        profile: &Profile,
        path: &KernelPathHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let path = self
            .paths
            .get(&path.id())
            .cloned()
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(path.id()),
            })?;
        let sweep = Sweep::new(profile.clone(), path)?;
        let raw = sweep_topology(&sweep);
        self.insert("sweep", Shape::Sweep(sweep), &[(&raw, false)])
    }

    #[instrument(skip(self, profile), fields(profile = profile.name()))]
    fn extrude_profile(
        &mut self,
        profile: &Profile,
        vector: [f64; 3],
        symmetric: bool,
    ) -> Result<KernelSolidHandle, KernelError> {
        let prism = Prism::new(profile.clone(), vector, symmetric)?;
        let raw = prism_topology(&prism);
        self.insert("extrude", Shape::Prism(prism), &[(&raw, false)])
    }

    #[instrument(skip(self))]
    fn extrude_face(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
        vector: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let entry = self.entry(solid)?;
        let base = entry.shape.clone();
        let record = entry
            .topology
            .face(face)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        let planar = record.planar.as_ref().ok_or_else(|| KernelError::NotSupported {
            operation: format!("extruding {} face {:?}", record.surface_type, face),
        })?;

        let eps = self.config.probe_epsilon;
        let normal = v3(planar.normal);
        let outline = trimmed_outline(&planar.outline, self.config.profile_tolerance, |p| {
            on_face(&base, p, &normal, eps)
        })?;
        debug!(
            full_area = planar.outline.area(),
            trimmed_area = outline.area(),
            "face outline trimmed"
        );
        let extrusion = FaceExtrusion::new(outline, planar.normal, base, vector, eps)?;
        let raw = prism_topology(extrusion.prism());
        self.insert(
            "face extrusion",
            Shape::FaceExtrusion(extrusion),
            &[(&raw, false)],
        )
    }

    fn offset_profile(&self, profile: &Profile, distance: f64) -> Result<Profile, KernelError> {
        offset::offset_profile(profile, distance, self.config.profile_tolerance)
    }

    #[instrument(skip(self))]
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean("union", a, b)
    }

    #[instrument(skip(self))]
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean("subtract", a, b)
    }

    #[instrument(skip(self))]
    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean("intersect", a, b)
    }

    #[instrument(skip(self, edges), fields(edges = edges.len()))]
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        if edges.is_empty() {
            return Err(KernelError::FilletFailed {
                reason: "no edges given".into(),
            });
        }
        let entry = self.entry(solid)?;
        let base = entry.shape.clone();
        let eps = self.config.probe_epsilon;
        let mut shape = base.clone();
        let mut blends = Vec::with_capacity(edges.len());
        let mut convex_count = 0;

        for &id in edges {
            let edge = entry
                .topology
                .edge(id)
                .ok_or(KernelError::EntityNotFound { id })?;
            if edge.curve_type != "line" {
                return Err(KernelError::FilletFailed {
                    reason: format!("edge {id:?} is a {}, only straight edges round", edge.curve_type),
                });
            }
            let (start, end) = edge.surviving_span().ok_or(KernelError::EntityNotFound { id })?;
            let mid = edge.samples[edge.samples.len() / 2];
            let (n1, n2) = (v3(mid.normals[0]), v3(mid.normals[1]));

            // Stepping from one face's normal towards the other stays outside
            // at a convex edge and enters the material at a reflex one.
            let probe = v3(mid.point) + unit(n1 - n2) * eps;
            let convex = !base.contains(arr(&probe));
            let sign = if convex { 1.0 } else { -1.0 };
            let cusp = Cusp::new(
                start,
                end,
                arr(&(n1 * sign)),
                arr(&(n2 * sign)),
                radius,
            )?;

            // Tangent points may sit slightly off a swept face.
            let slack = (radius * 0.05).max(eps);
            let (t1, t2) = cusp.tangent_offsets();
            let at = v3(mid.point);
            let fits = on_face(&base, arr(&(at + t1)), &n1, slack)
                && on_face(&base, arr(&(at + t2)), &n2, slack);
            if !fits {
                return Err(KernelError::FilletFailed {
                    reason: format!(
                        "radius {radius} does not fit between the faces of edge {id:?}"
                    ),
                });
            }

            blends.push(blend_topology(&cusp, convex));
            let cusp = Arc::new(Shape::Cusp(cusp));
            shape = Arc::new(if convex {
                convex_count += 1;
                Shape::Difference(shape, cusp)
            } else {
                Shape::Union(shape, cusp)
            });
        }
        info!(
            convex = convex_count,
            reflex = edges.len() - convex_count,
            radius,
            "edges rounded"
        );

        let topology = entry.topology.clone();
        let shape = Arc::try_unwrap(shape).unwrap_or_else(|shared| (*shared).clone());
        let mut parts: Vec<(&Topology, bool)> = vec![(&topology, false)];
        parts.extend(blends.iter().map(|t| (t, false)));
        self.insert("fillet", shape, &parts)
    }

    #[instrument(skip(self))]
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<RenderMesh, KernelError> {
        let occ = self.sample(solid, None, cell_size)?;
        let mesh = surface_nets(&occ)?;
        info!(
            triangles = mesh.triangle_count(),
            vertices = mesh.vertex_count(),
            "solid tessellated"
        );
        Ok(mesh)
    }
}

impl KernelIntrospect for ImplicitKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|e| e.topology.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|e| e.topology.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|e| e.topology.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.find_face(face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        self.find_edge(edge)
            .map(|e| e.faces.clone())
            .unwrap_or_default()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let found = match kind {
            TopoKind::Face => self.find_face(entity).map(|f| f.signature()),
            TopoKind::Edge => self.find_edge(entity).map(|e| e.signature()),
            TopoKind::Vertex => self
                .solids
                .values()
                .find_map(|e| e.topology.vertex(entity))
                .map(|v| v.signature()),
        };
        found.unwrap_or_else(TopoSignature::empty)
    }

    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let Some(entry) = self.solids.get(&solid.id()) else {
            return Vec::new();
        };
        let topo = &entry.topology;
        match kind {
            TopoKind::Face => topo.faces.iter().map(|f| (f.id, f.signature())).collect(),
            TopoKind::Edge => topo.edges.iter().map(|e| (e.id, e.signature())).collect(),
            TopoKind::Vertex => topo
                .vertices
                .iter()
                .map(|v| (v.id, v.signature()))
                .collect(),
        }
    }

    fn contains_point(&self, solid: &KernelSolidHandle, point: [f64; 3]) -> bool {
        self.solids
            .get(&solid.id())
            .map_or(false, |e| e.shape.contains(point))
    }

    fn occupancy(
        &self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<Occupancy, KernelError> {
        self.sample(solid, None, cell_size)
    }

    fn occupancy_within(
        &self,
        solid: &KernelSolidHandle,
        region: [f64; 6],
        cell_size: f64,
    ) -> Result<Occupancy, KernelError> {
        self.sample(solid, Some(Aabb::from_array(region)), cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamp_types::Placement;

    /// Cube of side 2 whose faces fall between lattice planes at 0.05.
    fn cube(kernel: &mut ImplicitKernel) -> KernelSolidHandle {
        let square = Profile::rectangle(
            "cube",
            Placement::xy([0.0, 0.0, 0.011]),
            [0.013, 0.017],
            2.0,
            2.0,
            1e-9,
        )
        .unwrap();
        kernel.extrude_profile(&square, [0.0, 0.0, 2.0], false).unwrap()
    }

    fn vertical_edges(kernel: &ImplicitKernel, solid: &KernelSolidHandle) -> Vec<KernelId> {
        kernel
            .compute_all_signatures(solid, TopoKind::Edge)
            .into_iter()
            .filter(|(_, s)| s.is_line() && s.direction.map_or(false, |d| d[2].abs() > 0.999))
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn test_extruded_cube_topology_and_volume() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        assert_eq!(kernel.list_faces(&solid).len(), 6);
        assert_eq!(kernel.list_edges(&solid).len(), 12);
        assert_eq!(kernel.list_vertices(&solid).len(), 8);
        let v = kernel.volume(&solid, 0.05).unwrap();
        assert!((v - 8.0).abs() < 1e-9, "volume {v}");

        let bb = kernel.bounding_box(&solid, 0.05).unwrap().unwrap();
        assert!((bb[5] - bb[2] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_face_and_edge_adjacency() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        for face in kernel.list_faces(&solid) {
            let edges = kernel.face_edges(face);
            assert_eq!(edges.len(), 4);
            for edge in edges {
                assert!(kernel.edge_faces(edge).contains(&face));
            }
        }
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let mut kernel = ImplicitKernel::new();
        let a = cube(&mut kernel);
        let moved = Profile::rectangle(
            "b",
            Placement::xy([0.0, 0.0, 0.011]),
            [1.013, 0.017],
            2.0,
            2.0,
            1e-9,
        )
        .unwrap();
        let b = kernel.extrude_profile(&moved, [0.0, 0.0, 2.0], false).unwrap();
        let u = kernel.boolean_union(&a, &b).unwrap();
        let v = kernel.volume(&u, 0.05).unwrap();
        assert!((v - 12.0).abs() < 1e-9, "volume {v}");

        let before: Vec<KernelId> = kernel.list_faces(&a);
        let after: Vec<KernelId> = kernel.list_faces(&u);
        assert!(after.iter().all(|id| !before.contains(id)));
        // Coplanar faces of the two operands stay separate.
        assert_eq!(after.len(), 10);
    }

    #[test]
    fn test_subtracting_everything_is_empty() {
        let mut kernel = ImplicitKernel::new();
        let a = cube(&mut kernel);
        let big = Profile::rectangle("big", Placement::xy([0.0, 0.0, -1.0]), [0.0, 0.0], 6.0, 6.0, 1e-9)
            .unwrap();
        let b = kernel.extrude_profile(&big, [0.0, 0.0, 6.0], false).unwrap();
        let err = kernel.boolean_subtract(&a, &b).unwrap_err();
        assert!(matches!(err, KernelError::EmptyResult { .. }));
    }

    #[test]
    fn test_intersection_volume_matches_difference() {
        let mut kernel = ImplicitKernel::new();
        let a = cube(&mut kernel);
        let disc = Profile::circle("hole", Placement::xy([0.0, 0.0, 1.0]), [0.3, 0.2], 0.6, 1e-9)
            .unwrap();
        let hole = kernel.extrude_profile(&disc, [0.0, 0.0, 3.0], true).unwrap();
        let cut = kernel.boolean_subtract(&a, &hole).unwrap();
        let common = kernel.boolean_intersect(&a, &hole).unwrap();
        let h = 0.05;
        let total = kernel.volume(&a, h).unwrap();
        let rest = kernel.volume(&cut, h).unwrap();
        let removed = kernel.volume(&common, h).unwrap();
        assert!((total - rest - removed).abs() < 1e-9);
        let exact = std::f64::consts::PI * 0.36 * 2.0;
        assert!((removed - exact).abs() < 0.05 * exact);
    }

    #[test]
    fn test_fillet_vertical_edges() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        let verticals = vertical_edges(&kernel, &solid);
        assert_eq!(verticals.len(), 4);
        let rounded = kernel.fillet_edges(&solid, &verticals, 0.5).unwrap();

        assert!(vertical_edges(&kernel, &rounded).is_empty());
        let blends = kernel
            .compute_all_signatures(&rounded, TopoKind::Face)
            .into_iter()
            .filter(|(_, s)| s.surface_type.as_deref() == Some("cylindrical"))
            .count();
        assert_eq!(blends, 4);

        let removed = 8.0 - kernel.volume(&rounded, 0.05).unwrap();
        let exact = 4.0 * 0.25 * (1.0 - std::f64::consts::FRAC_PI_4) * 2.0;
        assert!((removed - exact).abs() < 0.1, "removed {removed}, expected {exact}");
    }

    #[test]
    fn test_fillet_rejects_oversized_radius() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        let verticals = vertical_edges(&kernel, &solid);
        let err = kernel.fillet_edges(&solid, &verticals[..1], 3.0).unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }));
    }

    #[test]
    fn test_extrude_top_face() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        let top = kernel
            .compute_all_signatures(&solid, TopoKind::Face)
            .into_iter()
            .find(|(_, s)| s.normal.map_or(false, |n| n[2] > 0.999))
            .map(|(id, _)| id)
            .unwrap();
        let cap = kernel.extrude_face(&solid, top, [0.0, 0.0, 1.0]).unwrap();
        let v = kernel.volume(&cap, 0.05).unwrap();
        assert!((v - 4.0).abs() < 0.2, "volume {v}");
        let joined = kernel.boolean_union(&solid, &cap).unwrap();
        let bb = kernel.bounding_box(&joined, 0.05).unwrap().unwrap();
        assert!((bb[5] - 3.0).abs() < 0.1);
    }

    #[test]
    fn test_face_extrusion_covers_a_tilted_region() {
        let mut kernel = ImplicitKernel::new();
        let plate = Profile::rectangle("plate", Placement::xy([0.0; 3]), [0.0, 0.0], 10.0, 10.0, 1e-9)
            .unwrap();
        let plate = kernel.extrude_profile(&plate, [0.0, 0.0, 1.0], false).unwrap();
        // Strip |y - x/2| < 1 across the plate's top.
        let corners = [[-6.0, -4.0], [6.0, 2.0], [6.0, 4.0], [-6.0, -2.0]];
        let segments = (0..4)
            .map(|i| lamp_types::Segment::Line {
                from: corners[i],
                to: corners[(i + 1) % 4],
            })
            .collect();
        let strip =
            Profile::from_segments("strip", Placement::xy([0.0; 3]), segments, 1e-9).unwrap();
        let strip = kernel.extrude_profile(&strip, [0.0, 0.0, 3.0], true).unwrap();
        let band = kernel.boolean_intersect(&plate, &strip).unwrap();
        let top = kernel
            .compute_all_signatures(&band, TopoKind::Face)
            .into_iter()
            .find(|(_, s)| s.normal.map_or(false, |n| n[2] > 0.999))
            .map(|(id, _)| id)
            .unwrap();

        let cap = kernel.extrude_face(&band, top, [0.0, 0.0, 1.0]).unwrap();
        for p in [[-4.5, -2.25, 1.5], [0.0, 0.0, 1.5], [4.5, 2.25, 1.5]] {
            assert!(kernel.contains_point(&cap, p), "strip missing at {p:?}");
        }
        assert!(!kernel.contains_point(&cap, [4.5, -2.0, 1.5]));
        assert!(!kernel.contains_point(&cap, [-4.5, 2.0, 1.5]));
    }

    #[test]
    fn test_helical_sweep_volume() {
        let mut kernel = ImplicitKernel::new();
        let curve = |t: f64| [20.0 * t.cos(), 20.0 * t.sin(), -t];
        let path = kernel.sample_path(&curve, 0.0, std::f64::consts::PI).unwrap();
        let square = Profile::rectangle("sq", Placement::xz([20.0, 0.0, 0.0]), [0.0, 0.0], 2.0, 2.0, 1e-9)
            .unwrap();
        let solid = kernel.sweep_profile(&square, &path).unwrap();
        assert_eq!(kernel.list_faces(&solid).len(), 6);
        assert_eq!(kernel.list_edges(&solid).len(), 12);
        // Section area times centroid radius times swept angle.
        let exact = 4.0 * 20.0 * std::f64::consts::PI;
        let v = kernel.volume(&solid, 0.25).unwrap();
        assert!((v - exact).abs() < 0.03 * exact, "volume {v}");
        assert!(kernel.contains_point(&solid, [0.0, 20.0, -std::f64::consts::FRAC_PI_2]));
    }

    #[test]
    fn test_unknown_handles_are_reported() {
        let mut kernel = ImplicitKernel::new();
        let square = Profile::rectangle("sq", Placement::xz([0.0; 3]), [0.0, 0.0], 1.0, 1.0, 1e-9)
            .unwrap();
        let err = kernel
            .sweep_profile(&square, &KernelPathHandle(99))
            .unwrap_err();
        assert_eq!(err, KernelError::EntityNotFound { id: KernelId(99) });
        assert!(kernel.list_faces(&KernelSolidHandle(7)).is_empty());
        assert!(kernel.compute_signature(KernelId(12345), TopoKind::Face).area.is_none());
    }

    #[test]
    fn test_tessellated_cube_is_closed() {
        let mut kernel = ImplicitKernel::new();
        let solid = cube(&mut kernel);
        let mesh = kernel.tessellate(&solid, 0.25).unwrap();
        assert!(mesh.triangle_count() > 0);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
    }
}
