use crate::lattice::Occupancy;
use crate::types::*;

/// Core geometry kernel trait. Provides every shape construction and
/// modification operation the lamp pipeline needs.
/// Implemented by ImplicitKernel (exact point-membership CSG) and MockKernel
/// (deterministic test double).
pub trait Kernel {
    /// Sample a parametric 3D curve over `[start, stop]` as a sweep path.
    fn sample_path(
        &mut self,
        curve: &dyn Fn(f64) -> [f64; 3],
        start: f64,
        stop: f64,
    ) -> Result<KernelPathHandle, KernelError>;

    /// Sweep a closed profile along a path. The profile's `(u, v)` plane is
    /// carried so that `u` stays radial and `v` stays vertical.
    fn sweep_profile(
        &mut self,
        profile: &Profile,
        path: &KernelPathHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Extrude a closed profile along `vector`, or `±vector` when symmetric.
    fn extrude_profile(
        &mut self,
        profile: &Profile,
        vector: [f64; 3],
        symmetric: bool,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Extrude one planar face of a solid along `vector` as a new solid.
    fn extrude_face(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
        vector: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Offset a closed profile by a signed distance; positive grows it.
    fn offset_profile(&self, profile: &Profile, distance: f64) -> Result<Profile, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified straight edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a closed triangle mesh at the given cell size.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<RenderMesh, KernelError>;
}

/// Topology and measurement introspection trait. Read-only queries on
/// kernel geometry.
pub trait KernelIntrospect {
    /// List all faces of a solid.
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all edges of a solid.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all vertices of a solid.
    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Get the edges bounding a face.
    fn face_edges(&self, face: KernelId) -> Vec<KernelId>;

    /// Get the faces adjacent to an edge.
    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId>;

    /// Compute the geometric signature of a single entity.
    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature;

    /// Compute signatures for all entities of a given kind in a solid.
    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)>;

    /// Exact point membership.
    fn contains_point(&self, solid: &KernelSolidHandle, point: [f64; 3]) -> bool;

    /// Sample the solid on the global lattice of spacing `cell_size`.
    fn occupancy(
        &self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<Occupancy, KernelError>;

    /// Sample only the lattice points inside `region` (`[min.., max..]`).
    fn occupancy_within(
        &self,
        solid: &KernelSolidHandle,
        region: [f64; 6],
        cell_size: f64,
    ) -> Result<Occupancy, KernelError>;

    /// Lattice volume: occupied points times the cell volume.
    fn volume(&self, solid: &KernelSolidHandle, cell_size: f64) -> Result<f64, KernelError> {
        Ok(self.occupancy(solid, cell_size)?.volume())
    }

    /// Lattice volume of the part of the solid inside `region`.
    fn volume_within(
        &self,
        solid: &KernelSolidHandle,
        region: [f64; 6],
        cell_size: f64,
    ) -> Result<f64, KernelError> {
        Ok(self.occupancy_within(solid, region, cell_size)?.volume())
    }

    /// Bounds of the occupied cells, `None` for an empty sample.
    fn bounding_box(
        &self,
        solid: &KernelSolidHandle,
        cell_size: f64,
    ) -> Result<Option<[f64; 6]>, KernelError> {
        Ok(self.occupancy(solid, cell_size)?.bounding_box())
    }
}

/// Both kernel traits behind a single object.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
