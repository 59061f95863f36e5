//! STL output for tessellated solids.
//!
//! Binary layout: 80-byte header, little-endian `u32` facet count, then per
//! facet a normal, three vertices (all `f32` triples) and a zero `u16`.

use std::fmt::Write as _;
use std::io::Write;

use crate::types::{KernelError, RenderMesh};

fn check(mesh: &RenderMesh) -> Result<(), KernelError> {
    if mesh.triangle_count() == 0 {
        return Err(KernelError::ExportFailed {
            reason: "mesh has no triangles".into(),
        });
    }
    let count = mesh.vertex_count();
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= count) {
        return Err(KernelError::ExportFailed {
            reason: format!("index {bad} out of range for {count} vertices"),
        });
    }
    Ok(())
}

/// Corner positions and unit facet normal of every triangle.
fn facets(mesh: &RenderMesh) -> impl Iterator<Item = ([f32; 3], [[f32; 3]; 3])> + '_ {
    let at = |i: u32| {
        let i = i as usize * 3;
        [mesh.vertices[i], mesh.vertices[i + 1], mesh.vertices[i + 2]]
    };
    mesh.indices.chunks_exact(3).map(move |t| {
        let corners = [at(t[0]), at(t[1]), at(t[2])];
        let [a, b, c] = corners;
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        let n = if len > 1e-12 {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            [0.0, 0.0, 1.0]
        };
        (n, corners)
    })
}

/// Binary STL bytes for `mesh`.
pub fn binary_stl(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, KernelError> {
    check(mesh)?;
    let count = mesh.triangle_count();
    let mut buf = Vec::with_capacity(84 + count * 50);
    let header = format!("lamp solid: {name}");
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(80)]);
    buf.resize(80, 0);
    buf.extend_from_slice(&(count as u32).to_le_bytes());
    for (normal, corners) in facets(mesh) {
        for v in std::iter::once(normal).chain(corners) {
            for c in v {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

/// ASCII STL text for `mesh`.
pub fn ascii_stl(mesh: &RenderMesh, name: &str) -> Result<String, KernelError> {
    check(mesh)?;
    let mut out = String::with_capacity(mesh.triangle_count() * 256);
    let fail = |e: std::fmt::Error| KernelError::ExportFailed {
        reason: e.to_string(),
    };
    writeln!(out, "solid {name}").map_err(fail)?;
    for (n, corners) in facets(mesh) {
        writeln!(out, "  facet normal {} {} {}", n[0], n[1], n[2]).map_err(fail)?;
        writeln!(out, "    outer loop").map_err(fail)?;
        for v in corners {
            writeln!(out, "      vertex {} {} {}", v[0], v[1], v[2]).map_err(fail)?;
        }
        writeln!(out, "    endloop").map_err(fail)?;
        writeln!(out, "  endfacet").map_err(fail)?;
    }
    writeln!(out, "endsolid {name}").map_err(fail)?;
    Ok(out)
}

/// Write binary STL for `mesh` to `sink`.
pub fn write_stl<W: Write>(mesh: &RenderMesh, name: &str, sink: &mut W) -> Result<(), KernelError> {
    let bytes = binary_stl(mesh, name)?;
    sink.write_all(&bytes)
        .map_err(|e| KernelError::ExportFailed {
            reason: format!("writing {name}: {e}"),
        })
}
