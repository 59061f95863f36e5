//! Boundary bookkeeping for implicit solids.
//!
//! Primitives know their faces and edges exactly. Each face carries a set of
//! probe points with outward normals and each edge a run of samples; after a
//! boolean only the probes and samples that still sit on the result's
//! boundary are kept, and entities with none left disappear.

use std::collections::HashMap;
use std::f64::consts::TAU;

use lamp_types::{Placement, Point2, Profile, Segment, TopoSignature};
use rayon::prelude::*;

use crate::fillet::Cusp;
use crate::geom::{arr, perpendicular_basis, unit, v3, Aabb, Vec3};
use crate::prism::{on_face, shifted, Prism};
use crate::shape::Shape;
use crate::sweep::{frame, Sweep};
use crate::types::KernelId;

/// Probe columns across each side face.
const SIDE_ACROSS: usize = 3;
/// Probe grid resolution over planar caps.
const CAP_GRID: usize = 8;
const LINE_SAMPLES: usize = 9;
const CURVE_SAMPLES: usize = 24;
/// Probes on the ring around each edge sample.
const RING: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

/// Outline and outward normal of a planar face.
#[derive(Debug, Clone)]
pub struct PlanarFace {
    pub outline: Profile,
    pub normal: [f64; 3],
}

#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub id: KernelId,
    pub surface_type: &'static str,
    pub planar: Option<PlanarFace>,
    pub probes: Vec<Probe>,
    /// Probe count when the face was created.
    pub probe_total: usize,
    pub full_area: f64,
    pub edges: Vec<KernelId>,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeSample {
    pub index: usize,
    pub point: [f64; 3],
    pub tangent: [f64; 3],
    /// Outward normals of the two adjacent faces.
    pub normals: [[f64; 3]; 2],
}

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: KernelId,
    pub curve_type: &'static str,
    pub ends: [[f64; 3]; 2],
    pub samples: Vec<EdgeSample>,
    pub sample_total: usize,
    pub full_length: f64,
    pub faces: Vec<KernelId>,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexRecord {
    pub id: KernelId,
    pub point: [f64; 3],
}

#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub faces: Vec<FaceRecord>,
    pub edges: Vec<EdgeRecord>,
    pub vertices: Vec<VertexRecord>,
}

fn alloc(next_id: &mut u64) -> KernelId {
    let id = KernelId(*next_id);
    *next_id += 1;
    id
}

fn scaled(v: [f64; 3], k: f64) -> [f64; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}

fn mean(points: impl Iterator<Item = [f64; 3]>) -> Option<[f64; 3]> {
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for p in points {
        sum = [sum[0] + p[0], sum[1] + p[1], sum[2] + p[2]];
        n += 1;
    }
    (n > 0).then(|| scaled(sum, 1.0 / n as f64))
}

impl Topology {
    pub fn face(&self, id: KernelId) -> Option<&FaceRecord> {
        self.faces.iter().find(|f| f.id == id)
    }

    pub fn edge(&self, id: KernelId) -> Option<&EdgeRecord> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn vertex(&self, id: KernelId) -> Option<&VertexRecord> {
        self.vertices.iter().find(|v| v.id == id)
    }

    /// Keep the parts of each input topology that still lie on the boundary
    /// of `shape`, under fresh ids. A `true` flag marks a subtracted operand,
    /// whose outward normals turn around.
    pub fn survive(
        shape: &Shape,
        parts: &[(&Topology, bool)],
        eps: f64,
        next_id: &mut u64,
    ) -> Topology {
        let mut out = Topology::default();
        for &(topo, flip) in parts {
            let sign = if flip { -1.0 } else { 1.0 };

            let kept_faces: Vec<Option<FaceRecord>> = topo
                .faces
                .par_iter()
                .map(|f| {
                    let probes: Vec<Probe> = f
                        .probes
                        .iter()
                        .map(|p| Probe {
                            point: p.point,
                            normal: scaled(p.normal, sign),
                        })
                        .filter(|p| on_face(shape, p.point, &v3(p.normal), eps))
                        .collect();
                    (!probes.is_empty()).then(|| FaceRecord {
                        id: f.id,
                        surface_type: f.surface_type,
                        planar: f.planar.as_ref().map(|pf| PlanarFace {
                            outline: pf.outline.clone(),
                            normal: scaled(pf.normal, sign),
                        }),
                        probes,
                        probe_total: f.probe_total,
                        full_area: f.full_area,
                        edges: Vec::new(),
                    })
                })
                .collect();

            let mut face_map = HashMap::new();
            for kept in kept_faces.into_iter().flatten() {
                let id = alloc(next_id);
                face_map.insert(kept.id, id);
                out.faces.push(FaceRecord { id, ..kept });
            }

            let kept_edges: Vec<Option<EdgeRecord>> = topo
                .edges
                .par_iter()
                .map(|e| {
                    let samples: Vec<EdgeSample> = e
                        .samples
                        .iter()
                        .filter(|s| on_edge(shape, s, eps))
                        .map(|s| EdgeSample {
                            normals: [scaled(s.normals[0], sign), scaled(s.normals[1], sign)],
                            ..*s
                        })
                        .collect();
                    (!samples.is_empty()).then(|| EdgeRecord {
                        samples,
                        faces: Vec::new(),
                        ..e.clone()
                    })
                })
                .collect();

            for (old, kept) in topo.edges.iter().zip(kept_edges) {
                if let Some(edge) = kept {
                    let faces = old
                        .faces
                        .iter()
                        .filter_map(|f| face_map.get(f).copied())
                        .collect();
                    out.edges.push(EdgeRecord {
                        id: alloc(next_id),
                        faces,
                        ..edge
                    });
                }
            }
        }
        out.link();
        out.collect_vertices(next_id);
        out
    }

    /// Fill each face's edge list from the edges' face lists.
    fn link(&mut self) {
        let mut by_face: HashMap<KernelId, Vec<KernelId>> = HashMap::new();
        for edge in &self.edges {
            for f in &edge.faces {
                by_face.entry(*f).or_default().push(edge.id);
            }
        }
        for face in &mut self.faces {
            face.edges = by_face.remove(&face.id).unwrap_or_default();
        }
    }

    /// Edge endpoints whose end samples survived, merged by position.
    fn collect_vertices(&mut self, next_id: &mut u64) {
        let mut seen: HashMap<[i64; 3], KernelId> = HashMap::new();
        let mut vertices = Vec::new();
        for edge in &self.edges {
            let (Some(first), Some(last)) = (edge.samples.first(), edge.samples.last()) else {
                continue;
            };
            let mut ends = Vec::with_capacity(2);
            if first.index == 0 {
                ends.push(edge.ends[0]);
            }
            if last.index + 1 == edge.sample_total {
                ends.push(edge.ends[1]);
            }
            for p in ends {
                let key = [
                    (p[0] * 1e6).round() as i64,
                    (p[1] * 1e6).round() as i64,
                    (p[2] * 1e6).round() as i64,
                ];
                seen.entry(key).or_insert_with(|| {
                    let id = alloc(next_id);
                    vertices.push(VertexRecord { id, point: p });
                    id
                });
            }
        }
        self.vertices = vertices;
    }
}

/// Whether the ring of probes around an edge sample is split unevenly
/// between inside and outside, i.e. the sample sits on a crease.
fn on_edge(shape: &Shape, sample: &EdgeSample, eps: f64) -> bool {
    let d = v3(sample.tangent);
    let (b1, b2) = perpendicular_basis(&d);
    let p = v3(sample.point);
    let inside = (0..RING)
        .filter(|k| {
            let a = (*k as f64 + 0.5) * TAU / RING as f64;
            shape.contains(arr(&(p + (b1 * a.cos() + b2 * a.sin()) * eps)))
        })
        .count();
    let f = inside as f64 / RING as f64;
    f > 0.0 && f < 1.0 && (f - 0.5).abs() > 0.1
}

// ── Signatures ──────────────────────────────────────────────────────────────

impl FaceRecord {
    pub fn signature(&self) -> TopoSignature {
        let bbox = Aabb::from_points(self.probes.iter().map(|p| p.point));
        let normal = unit(
            self.probes
                .iter()
                .fold(Vec3::zeros(), |acc, p| acc + v3(p.normal)),
        );
        TopoSignature {
            surface_type: Some(self.surface_type.to_string()),
            area: Some(
                self.full_area * self.probes.len() as f64 / self.probe_total.max(1) as f64,
            ),
            centroid: mean(self.probes.iter().map(|p| p.point)),
            normal: Some(arr(&normal)),
            direction: None,
            bbox: (!bbox.is_empty()).then(|| bbox.to_array()),
            length: None,
        }
    }
}

impl EdgeRecord {
    pub fn signature(&self) -> TopoSignature {
        let mut bbox = Aabb::from_points(self.samples.iter().map(|s| s.point));
        if let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) {
            if first.index == 0 {
                bbox.include(self.ends[0]);
            }
            if last.index + 1 == self.sample_total {
                bbox.include(self.ends[1]);
            }
        }
        let direction = if self.curve_type == "line" {
            self.samples.first().map(|s| s.tangent)
        } else {
            let chord = v3(self.ends[1]) - v3(self.ends[0]);
            (chord.norm() > 1e-12).then(|| arr(&unit(chord)))
        };
        TopoSignature {
            surface_type: Some(self.curve_type.to_string()),
            area: None,
            centroid: mean(self.samples.iter().map(|s| s.point)),
            normal: None,
            direction,
            bbox: (!bbox.is_empty()).then(|| bbox.to_array()),
            length: Some(
                self.full_length * self.samples.len() as f64 / self.sample_total.max(1) as f64,
            ),
        }
    }

    /// Surviving straight span `(start, end)`, extended half a sample step
    /// past the outermost surviving samples, or to the true ends.
    pub fn surviving_span(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let total = self.sample_total as f64;
        let a = v3(self.ends[0]);
        let d = v3(self.ends[1]) - a;
        let start = if first.index == 0 {
            0.0
        } else {
            first.index as f64 / total
        };
        let end = if last.index + 1 == self.sample_total {
            1.0
        } else {
            (last.index + 1) as f64 / total
        };
        Some((arr(&(a + d * start)), arr(&(a + d * end))))
    }
}

impl VertexRecord {
    pub fn signature(&self) -> TopoSignature {
        TopoSignature {
            surface_type: Some("point".to_string()),
            centroid: Some(self.point),
            bbox: Some([
                self.point[0],
                self.point[1],
                self.point[2],
                self.point[0],
                self.point[1],
                self.point[2],
            ]),
            ..TopoSignature::empty()
        }
    }
}

// ── Primitive topology ──────────────────────────────────────────────────────

/// Cell centres of a grid over the outline's bounds that fall inside it.
fn cap_grid(profile: &Profile) -> Vec<Point2> {
    let b = profile.bounds();
    for n in [CAP_GRID, 4 * CAP_GRID] {
        let pts: Vec<Point2> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                [
                    b[0] + (b[2] - b[0]) * (i as f64 + 0.5) / n as f64,
                    b[1] + (b[3] - b[1]) * (j as f64 + 0.5) / n as f64,
                ]
            })
            .filter(|&uv| profile.contains(uv))
            .collect();
        if !pts.is_empty() {
            return pts;
        }
    }
    Vec::new()
}

fn samples_along(seg: &Segment) -> usize {
    if seg.is_line() {
        LINE_SAMPLES
    } else {
        CURVE_SAMPLES
    }
}

fn curve_type(seg: &Segment) -> &'static str {
    if seg.is_line() {
        "line"
    } else {
        "arc"
    }
}

/// Faces, edges and vertices of a swept profile: one side face per
/// segment, two planar end caps, the swept corner curves and the cap
/// outlines. Ids are local until passed through [`Topology::survive`].
pub fn sweep_topology(sweep: &Sweep) -> Topology {
    let profile = sweep.profile();
    let segs = profile.segments();
    let m = segs.len();
    let path = sweep.path();
    let (phi0, phi1) = sweep.azimuth_range();
    let span = phi1 - phi0;
    let along = ((span * 4.0).ceil() as usize).clamp(8, 96);
    let swept_samples = ((span * 6.0).ceil() as usize).clamp(12, 128);
    let side_id = |j: usize| KernelId(j as u64);
    let cap_id = |at_end: bool| KernelId((m + usize::from(at_end)) as u64);

    let mut topo = Topology::default();
    for (j, seg) in segs.iter().enumerate() {
        let mut probes = Vec::with_capacity(along * SIDE_ACROSS);
        let mut area = 0.0;
        for a in 0..along {
            let phi = phi0 + (a as f64 + 0.5) / along as f64 * span;
            let (r, _) = path.at(phi);
            let (dr, dz) = path.slope(phi);
            for b in 0..SIDE_ACROSS {
                let s = (b as f64 + 0.5) / SIDE_ACROSS as f64;
                let uv = seg.point_at(s);
                probes.push(Probe {
                    point: sweep.world(phi, uv),
                    normal: sweep.side_normal(phi, seg, s),
                });
                let speed = (dr * dr + (r + uv[0]).powi(2) + dz * dz).sqrt();
                area += speed * (span / along as f64) * (seg.length() / SIDE_ACROSS as f64);
            }
        }
        topo.faces.push(FaceRecord {
            id: side_id(j),
            surface_type: "swept",
            planar: None,
            probe_total: probes.len(),
            probes,
            full_area: area,
            edges: Vec::new(),
        });
    }

    for at_end in [false, true] {
        let phi = if at_end { phi1 } else { phi0 };
        let (r, z) = path.at(phi);
        let (e_r, _) = frame(phi);
        let placement = Placement::new([r * e_r.x, r * e_r.y, z], arr(&e_r), [0.0, 0.0, 1.0]);
        let probes: Vec<Probe> = cap_grid(profile)
            .into_iter()
            .map(|uv| Probe {
                point: sweep.world(phi, uv),
                normal: sweep.cap_normal(at_end, uv),
            })
            .collect();
        topo.faces.push(FaceRecord {
            id: cap_id(at_end),
            surface_type: "planar",
            planar: Some(PlanarFace {
                outline: profile.clone().with_placement(placement),
                normal: sweep.cap_normal(at_end, [0.0, 0.0]),
            }),
            probe_total: probes.len(),
            probes,
            full_area: profile.area(),
            edges: Vec::new(),
        });
    }

    for j in 0..m {
        let prev = &segs[(j + m - 1) % m];
        let seg = &segs[j];
        let uv = seg.start();
        let samples = (0..swept_samples)
            .map(|e| {
                let phi = phi0 + (e as f64 + 0.5) / swept_samples as f64 * span;
                EdgeSample {
                    index: e,
                    point: sweep.world(phi, uv),
                    tangent: sweep.travel_direction(phi, uv),
                    normals: [
                        sweep.side_normal(phi, prev, 1.0),
                        sweep.side_normal(phi, seg, 0.0),
                    ],
                }
            })
            .collect();
        let fine = 4 * swept_samples;
        let full_length = (1..=fine)
            .map(|i| {
                let a = sweep.world(phi0 + (i - 1) as f64 / fine as f64 * span, uv);
                let b = sweep.world(phi0 + i as f64 / fine as f64 * span, uv);
                (v3(b) - v3(a)).norm()
            })
            .sum();
        topo.edges.push(EdgeRecord {
            id: KernelId(0),
            curve_type: "curve",
            ends: [sweep.world(phi0, uv), sweep.world(phi1, uv)],
            samples,
            sample_total: swept_samples,
            full_length,
            faces: vec![side_id((j + m - 1) % m), side_id(j)],
        });
    }

    for at_end in [false, true] {
        let phi = if at_end { phi1 } else { phi0 };
        let (e_r, _) = frame(phi);
        for (j, seg) in segs.iter().enumerate() {
            let n = samples_along(seg);
            let samples = (0..n)
                .map(|e| {
                    let s = (e as f64 + 0.5) / n as f64;
                    let uv = seg.point_at(s);
                    let t = seg.tangent_at(s);
                    EdgeSample {
                        index: e,
                        point: sweep.world(phi, uv),
                        tangent: arr(&(e_r * t[0] + Vec3::z() * t[1])),
                        normals: [sweep.cap_normal(at_end, uv), sweep.side_normal(phi, seg, s)],
                    }
                })
                .collect();
            topo.edges.push(EdgeRecord {
                id: KernelId(0),
                curve_type: curve_type(seg),
                ends: [sweep.world(phi, seg.start()), sweep.world(phi, seg.end())],
                samples,
                sample_total: n,
                full_length: seg.length(),
                faces: vec![cap_id(at_end), side_id(j)],
            });
        }
    }
    topo
}

/// Faces and edges of a straight extrusion: two caps, one side per
/// segment, the cap outlines and the lateral corner lines.
pub fn prism_topology(prism: &Prism) -> Topology {
    let profile = prism.profile();
    let segs = profile.segments();
    let m = segs.len();
    let (lo, hi) = prism.lambda_range();
    let vector = prism.vector();
    let placement = profile.placement();
    let (u_axis, v_axis) = (v3(placement.u_axis), v3(placement.v_axis));
    let plane_normal = v3(placement.normal());
    let side_id = |j: usize| KernelId(j as u64);
    let cap_id = |top: bool| KernelId((m + usize::from(top)) as u64);
    let to3 = |d: Point2| u_axis * d[0] + v_axis * d[1];
    let along = 6;

    let mut topo = Topology::default();
    for (j, seg) in segs.iter().enumerate() {
        let mut probes = Vec::with_capacity(along * 4);
        let mut area = 0.0;
        for a in 0..along {
            let lambda = lo + (hi - lo) * (a as f64 + 0.5) / along as f64;
            for b in 0..4 {
                let s = (b as f64 + 0.5) / 4.0;
                probes.push(Probe {
                    point: prism.point(seg.point_at(s), lambda),
                    normal: prism.side_normal(seg, s),
                });
                let stretch = to3(seg.tangent_at(s)).cross(&vector).norm();
                area += stretch * (hi - lo) / along as f64 * seg.length() / 4.0;
            }
        }
        // Straight sides of a right extrusion are planar rectangles.
        let square = vector.cross(&plane_normal).norm() < 1e-9 * vector.norm();
        let planar = (seg.is_line() && square).then(|| {
            let start = prism.point(seg.start(), lo);
            let u = unit(to3(seg.tangent_at(0.0)));
            let normal = v3(prism.side_normal(seg, 0.5));
            let v = unit(normal.cross(&u));
            let height = vector.norm() * (hi - lo);
            let h_dir = if vector.dot(&v) > 0.0 { 1.0 } else { -1.0 };
            Profile::rectangle(
                profile.name(),
                Placement::new(start, arr(&u), arr(&v)),
                [seg.length() / 2.0, h_dir * height / 2.0],
                seg.length(),
                height,
                1e-9,
            )
            .ok()
            .map(|outline| PlanarFace {
                outline,
                normal: arr(&normal),
            })
        });
        topo.faces.push(FaceRecord {
            id: side_id(j),
            surface_type: if seg.is_line() { "planar" } else { "cylindrical" },
            planar: planar.flatten(),
            probe_total: probes.len(),
            probes,
            full_area: area,
            edges: Vec::new(),
        });
    }

    for top in [false, true] {
        let lambda = if top { hi } else { lo };
        let probes: Vec<Probe> = cap_grid(profile)
            .into_iter()
            .map(|uv| Probe {
                point: prism.point(uv, lambda),
                normal: prism.cap_normal(top),
            })
            .collect();
        topo.faces.push(FaceRecord {
            id: cap_id(top),
            surface_type: "planar",
            planar: Some(PlanarFace {
                outline: profile
                    .clone()
                    .with_placement(shifted(placement, vector * lambda)),
                normal: prism.cap_normal(top),
            }),
            probe_total: probes.len(),
            probes,
            full_area: profile.area(),
            edges: Vec::new(),
        });
    }

    for top in [false, true] {
        let lambda = if top { hi } else { lo };
        for (j, seg) in segs.iter().enumerate() {
            let n = samples_along(seg);
            let samples = (0..n)
                .map(|e| {
                    let s = (e as f64 + 0.5) / n as f64;
                    EdgeSample {
                        index: e,
                        point: prism.point(seg.point_at(s), lambda),
                        tangent: arr(&unit(to3(seg.tangent_at(s)))),
                        normals: [prism.cap_normal(top), prism.side_normal(seg, s)],
                    }
                })
                .collect();
            topo.edges.push(EdgeRecord {
                id: KernelId(0),
                curve_type: curve_type(seg),
                ends: [
                    prism.point(seg.start(), lambda),
                    prism.point(seg.end(), lambda),
                ],
                samples,
                sample_total: n,
                full_length: seg.length(),
                faces: vec![cap_id(top), side_id(j)],
            });
        }
    }

    let dir = arr(&unit(vector));
    for j in 0..m {
        let prev = &segs[(j + m - 1) % m];
        let seg = &segs[j];
        let uv = seg.start();
        let samples = (0..LINE_SAMPLES)
            .map(|e| {
                let lambda = lo + (hi - lo) * (e as f64 + 0.5) / LINE_SAMPLES as f64;
                EdgeSample {
                    index: e,
                    point: prism.point(uv, lambda),
                    tangent: dir,
                    normals: [prism.side_normal(prev, 1.0), prism.side_normal(seg, 0.0)],
                }
            })
            .collect();
        topo.edges.push(EdgeRecord {
            id: KernelId(0),
            curve_type: "line",
            ends: [prism.point(uv, lo), prism.point(uv, hi)],
            samples,
            sample_total: LINE_SAMPLES,
            full_length: vector.norm() * (hi - lo),
            faces: vec![side_id((j + m - 1) % m), side_id(j)],
        });
    }
    topo
}

/// The rounding face of a fillet cusp. `convex` faces bulge away from the
/// cylinder axis.
pub fn blend_topology(cusp: &Cusp, convex: bool) -> Topology {
    let (along, across) = (12, 6);
    let sign = if convex { 1.0 } else { -1.0 };
    let probes: Vec<Probe> = (0..along)
        .flat_map(|a| (0..across).map(move |b| (a, b)))
        .map(|(a, b)| {
            let (point, radial) = cusp.blend_point(
                (a as f64 + 0.5) / along as f64,
                (b as f64 + 0.5) / across as f64,
            );
            Probe {
                point,
                normal: scaled(radial, sign),
            }
        })
        .collect();
    let (t1, t2) = cusp.tangent_offsets();
    let angle = t1.angle(&t2).max(0.0);
    let sweep = std::f64::consts::PI - angle;
    Topology {
        faces: vec![FaceRecord {
            id: KernelId(0),
            surface_type: "cylindrical",
            planar: None,
            probe_total: probes.len(),
            probes,
            full_area: cusp.length() * cusp.radius() * sweep.abs(),
            edges: Vec::new(),
        }],
        edges: Vec::new(),
        vertices: Vec::new(),
    }
}
