// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh rebuild
//!
//! A [`MeshBuilder`] lives for exactly one rebuild. It owns the vertex table
//! and the triangle list, and is consumed by [`MeshBuilder::finish`], which
//! hands back an immutable [`MeshBuffers`] snapshot. Nothing is carried over
//! from one rebuild to the next.

use crate::classify::{classify, ApertureRect, Containment};
use crate::clip::{clip_triangle_outside_rectangle, crosses_side_lines};
use crate::config::CutConfig;
use crate::error::{Error, Result};
use crate::mesh::{Mesh, MeshBuffers};
use crate::primitives::{is_finite_point, Triangle};
use crate::triangulation::{fan_apex, is_convex_xz, triangulate_from};
use crate::weld::{VertexKey, VertexTable};
use nalgebra::Point3;
use tracing::{debug, trace, warn};

/// Per-rebuild counters, reported once in the summary event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    /// Base triangles swallowed by the aperture
    pub inside: usize,
    /// Base triangles emitted untouched
    pub outside: usize,
    /// Base triangles routed through the clipper
    pub clipped: usize,
    /// Convex pieces produced by the clipper
    pub pieces: usize,
    /// Produced triangles that collapsed at weld precision
    pub collapsed: usize,
}

/// Working state of one rebuild
pub struct MeshBuilder {
    config: CutConfig,
    table: VertexTable,
    indices: Vec<u32>,
    stats: RebuildStats,
}

impl MeshBuilder {
    /// Fresh builder with an empty vertex table
    pub fn new(config: CutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: VertexTable::new(config.weld_decimals),
            indices: Vec::new(),
            stats: RebuildStats::default(),
            config,
        })
    }

    pub fn stats(&self) -> RebuildStats {
        self.stats
    }

    /// Classify one base triangle and emit whatever survives the aperture
    pub fn add_base_triangle(&mut self, triangle: &Triangle, rect: &ApertureRect) -> Result<()> {
        self.validate_triangle(triangle)?;

        match classify(triangle, rect) {
            Containment::Inside => {
                self.stats.inside += 1;
            }
            Containment::Outside if !crosses_side_lines(triangle, rect) => {
                self.stats.outside += 1;
                self.emit_triangle(triangle)?;
            }
            Containment::Outside | Containment::Straddling => {
                self.stats.clipped += 1;
                let pieces =
                    clip_triangle_outside_rectangle(triangle, rect, self.config.parallel_epsilon)?;
                for piece in &pieces {
                    if !is_convex_xz(piece) {
                        warn!(vertices = piece.len(), "clip piece is not convex, fan may overlap");
                    }
                    self.stats.pieces += 1;
                    for tri in triangulate_from(piece, fan_apex(piece)) {
                        self.emit_triangle(&tri)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Weld the aperture's four corners and emit (0, 1, 2) and (0, 2, 3)
    pub fn add_aperture_quad(&mut self, quad: &[Point3<f64>; 4]) -> Result<()> {
        if !quad.iter().all(is_finite_point) {
            return Err(Error::geometry(format!(
                "aperture quad has non-finite corners {:?}",
                quad
            )));
        }
        let keys = self.checked_keys(quad, "aperture quad")?;
        for i in 0..4 {
            for j in i + 1..4 {
                if keys[i] == keys[j] {
                    return Err(Error::geometry(format!(
                        "aperture quad corners {} and {} coincide at {:?}",
                        i, j, quad[i]
                    )));
                }
            }
        }

        self.reserve_vertices(4)?;
        let mut idx = [0u32; 4];
        for (slot, (key, p)) in idx.iter_mut().zip(keys.iter().zip(quad.iter())) {
            *slot = self.table.weld_keyed(*key, p);
        }
        self.indices.extend_from_slice(&[idx[0], idx[1], idx[2], idx[0], idx[2], idx[3]]);
        Ok(())
    }

    /// Weld a produced triangle. Triangles whose vertices share a weld key
    /// are zero-area at this precision and are dropped before anything is
    /// inserted, so they never leave orphan vertices behind.
    fn emit_triangle(&mut self, triangle: &Triangle) -> Result<bool> {
        let vertices = triangle.vertices();
        let keys = vertices.map(|p| self.table.key_of(&p));
        if has_repeated_key(&keys) {
            trace!(?keys, "skipping triangle collapsed by welding");
            self.stats.collapsed += 1;
            return Ok(false);
        }

        self.reserve_vertices(3)?;
        for (key, p) in keys.iter().zip(vertices.iter()) {
            let index = self.table.weld_keyed(*key, p);
            self.indices.push(index);
        }
        Ok(true)
    }

    fn validate_triangle(&self, triangle: &Triangle) -> Result<()> {
        if !triangle.is_finite() {
            return Err(Error::geometry(format!(
                "base triangle has non-finite vertices {:?}",
                triangle
            )));
        }
        let keys = self.checked_keys(&triangle.vertices(), "base triangle")?;
        if has_repeated_key(&keys) {
            return Err(Error::geometry(format!(
                "base triangle has coincident vertices {:?}",
                triangle
            )));
        }
        Ok(())
    }

    /// Weld keys for input points. Clip output stays inside the hull of its
    /// triangle, so only input needs the range check.
    fn checked_keys<const N: usize>(
        &self,
        points: &[Point3<f64>; N],
        what: &str,
    ) -> Result<[VertexKey; N]> {
        let mut keys = [VertexKey(0, 0, 0); N];
        for (key, p) in keys.iter_mut().zip(points.iter()) {
            *key = self.table.try_key_of(p).ok_or_else(|| {
                Error::geometry(format!(
                    "{} vertex {:?} is out of range at {} weld decimals",
                    what, p, self.config.weld_decimals
                ))
            })?;
        }
        Ok(keys)
    }

    fn reserve_vertices(&self, additional: usize) -> Result<()> {
        let needed = self.table.len() + additional;
        if needed > u32::MAX as usize {
            return Err(Error::IndexOverflow(needed));
        }
        Ok(())
    }

    /// Consume the builder and produce the immutable buffers
    pub fn finish(self) -> Result<MeshBuffers> {
        let mut mesh = Mesh::with_capacity(self.table.len(), self.indices.len());
        for p in self.table.positions() {
            mesh.add_position(p);
        }
        mesh.indices = self.indices;

        let buffers = MeshBuffers::from_mesh(mesh)?;
        debug!(
            vertices = buffers.vertex_count(),
            triangles = buffers.triangle_count(),
            index_bits = buffers.indices.width_bits(),
            inside = self.stats.inside,
            outside = self.stats.outside,
            clipped = self.stats.clipped,
            pieces = self.stats.pieces,
            collapsed = self.stats.collapsed,
            "rebuilt aperture mesh"
        );
        Ok(buffers)
    }
}

#[inline]
fn has_repeated_key(keys: &[VertexKey; 3]) -> bool {
    keys[0] == keys[1] || keys[1] == keys[2] || keys[0] == keys[2]
}

/// Rebuild the whole mesh for one aperture position.
///
/// Base triangles are cut against `rect`, then the aperture quad is added,
/// and everything is welded into one vertex/index buffer. Invalid input is
/// rejected as a whole: no partial mesh is ever returned.
pub fn rebuild_mesh(
    base_triangles: &[Triangle],
    aperture_quad: &[Point3<f64>; 4],
    rect: &ApertureRect,
    config: &CutConfig,
) -> Result<MeshBuffers> {
    build(base_triangles, aperture_quad, rect, config).map_err(|e| {
        warn!(error = %e, "aperture mesh rebuild rejected");
        e
    })
}

fn build(
    base_triangles: &[Triangle],
    aperture_quad: &[Point3<f64>; 4],
    rect: &ApertureRect,
    config: &CutConfig,
) -> Result<MeshBuffers> {
    rect.validate()?;
    let mut builder = MeshBuilder::new(*config)?;
    for triangle in base_triangles {
        builder.add_base_triangle(triangle, rect)?;
    }
    builder.add_aperture_quad(aperture_quad)?;
    builder.finish()
}
