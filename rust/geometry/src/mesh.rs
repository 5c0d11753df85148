// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};

/// Largest vertex count that still gets a 16-bit index buffer
pub const U16_VERTEX_LIMIT: usize = u16::MAX as usize;

/// Triangle mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex position; normals are filled in by [`calculate_normals`]
    #[inline]
    pub fn add_position(&mut self, position: &Point3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    fn position(&self, index: usize) -> Point3<f64> {
        Point3::new(
            self.positions[index * 3] as f64,
            self.positions[index * 3 + 1] as f64,
            self.positions[index * 3 + 2] as f64,
        )
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }

    /// Check that every index refers to an existing vertex
    pub fn check_indices(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(Error::geometry(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.vertex_count();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::geometry(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            )));
        }
        Ok(())
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute smooth per-vertex normals from area-weighted face normals.
/// Vertices not referenced by any triangle get +Y.
pub fn calculate_normals(mesh: &mut Mesh) {
    let vertex_count = mesh.vertex_count();
    if vertex_count == 0 {
        return;
    }

    let mut normals = vec![Vector3::zeros(); vertex_count];

    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let v0 = mesh.position(i0);
        let v1 = mesh.position(i1);
        let v2 = mesh.position(i2);

        // Unnormalized, so larger faces weigh more
        let normal = (v1 - v0).cross(&(v2 - v0));

        normals[i0] += normal;
        normals[i1] += normal;
        normals[i2] += normal;
    }

    mesh.normals.clear();
    mesh.normals.reserve(vertex_count * 3);

    for normal in normals {
        let normalized = normal.try_normalize(1e-12).unwrap_or_else(Vector3::y);
        mesh.normals.push(normalized.x as f32);
        mesh.normals.push(normalized.y as f32);
        mesh.normals.push(normalized.z as f32);
    }
}

/// Index buffer at the narrowest width that can address every vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Narrow `indices` to 16 bits when `vertex_count` allows it
    pub fn select(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count > U16_VERTEX_LIMIT {
            IndexBuffer::U32(indices)
        } else {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        }
    }

    /// Element width in bits
    pub fn width_bits(&self) -> u8 {
        match self {
            IndexBuffer::U16(_) => 16,
            IndexBuffer::U32(_) => 32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate indices widened to u32
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            IndexBuffer::U16(v) => Box::new(v.iter().map(|&i| i as u32)),
            IndexBuffer::U32(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn to_u32(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Axis-aligned box plus a bounding sphere around the box centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    pub sphere_center: Point3<f32>,
    pub sphere_radius: f32,
}

impl MeshBounds {
    /// Compute bounds for a mesh; an empty mesh gets a zero box at the origin
    pub fn of(mesh: &Mesh) -> Self {
        let (min, max) = mesh.bounds();
        let center = nalgebra::center(&min, &max);
        let radius_sq = mesh
            .positions
            .chunks_exact(3)
            .map(|c| nalgebra::distance_squared(&center, &Point3::new(c[0], c[1], c[2])))
            .fold(0.0f32, f32::max);

        Self {
            min,
            max,
            sphere_center: center,
            sphere_radius: radius_sq.sqrt(),
        }
    }
}

/// Immutable result of one rebuild, ready to upload
///
/// Welding happens on `f64` positions at `weld_decimals`; positions are
/// narrowed to `f32` only afterwards. `f32` has a 24-bit mantissa, so once
/// coordinates grow past a few units it can no longer separate every weld
/// step (at 6 decimals, beyond roughly 16 units). Two vertices with distinct
/// weld keys may then share an identical `f32` position while keeping
/// separate indices. Triangles are never merged or dropped because of this,
/// but consumers deduplicating by `f32` position will see more vertices
/// collapse than the index buffer does.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    /// Flat positions, 3 floats per unique vertex, first-insertion order
    pub positions: Vec<f32>,
    /// Flat per-vertex normals, same layout as `positions`
    pub normals: Vec<f32>,
    pub indices: IndexBuffer,
    pub bounds: MeshBounds,
}

impl MeshBuffers {
    /// Finalize a welded mesh: normals, bounds and index width
    pub fn from_mesh(mut mesh: Mesh) -> Result<Self> {
        let vertex_count = mesh.vertex_count();
        if vertex_count > u32::MAX as usize {
            return Err(Error::IndexOverflow(vertex_count));
        }
        mesh.check_indices()?;
        calculate_normals(&mut mesh);
        let bounds = MeshBounds::of(&mesh);

        Ok(Self {
            indices: IndexBuffer::select(mesh.indices, vertex_count),
            positions: mesh.positions,
            normals: mesh.normals,
            bounds,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Triangles as index triples
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .to_u32()
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }

    /// Position of vertex `index`
    pub fn position(&self, index: u32) -> Point3<f32> {
        let i = index as usize * 3;
        Point3::new(self.positions[i], self.positions[i + 1], self.positions[i + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_position(&Point3::new(0.0, 0.0, 0.0));
        mesh.add_position(&Point3::new(1.0, 0.0, 0.0));
        mesh.add_position(&Point3::new(1.0, 0.0, 1.0));
        mesh.add_position(&Point3::new(0.0, 0.0, 1.0));
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_normals_of_flat_quad() {
        let mut mesh = quad_mesh();
        calculate_normals(&mut mesh);
        assert_eq!(mesh.normals.len(), 12);
        for n in mesh.normals.chunks_exact(3) {
            assert_relative_eq!(n[0], 0.0);
            assert_relative_eq!(n[1], -1.0);
            assert_relative_eq!(n[2], 0.0);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_up_normal() {
        let mut mesh = quad_mesh();
        mesh.add_position(&Point3::new(5.0, 5.0, 5.0));
        calculate_normals(&mut mesh);
        assert_eq!(&mesh.normals[12..15], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_check_indices() {
        let mut mesh = quad_mesh();
        assert!(mesh.check_indices().is_ok());
        mesh.add_triangle(0, 1, 4);
        assert!(mesh.check_indices().is_err());
        mesh.indices.pop();
        assert!(mesh.check_indices().is_err());
    }

    #[test]
    fn test_index_width_selection() {
        let narrow = IndexBuffer::select(vec![0, 1, 2], 3);
        assert_eq!(narrow.width_bits(), 16);
        assert_eq!(narrow, IndexBuffer::U16(vec![0, 1, 2]));

        let at_limit = IndexBuffer::select(vec![0, 1, 65534], U16_VERTEX_LIMIT);
        assert_eq!(at_limit.width_bits(), 16);

        let wide = IndexBuffer::select(vec![0, 1, 65535], U16_VERTEX_LIMIT + 1);
        assert_eq!(wide.width_bits(), 32);
        assert_eq!(wide.to_u32(), vec![0, 1, 65535]);
    }

    #[test]
    fn test_buffers_from_mesh() {
        let buffers = MeshBuffers::from_mesh(quad_mesh()).unwrap();
        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.triangle_count(), 2);
        assert_eq!(buffers.triangles(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(buffers.position(2), Point3::new(1.0, 0.0, 1.0));

        let bounds = buffers.bounds;
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 0.0, 1.0));
        assert_eq!(bounds.sphere_center, Point3::new(0.5, 0.0, 0.5));
        assert_relative_eq!(bounds.sphere_radius, 0.5f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_empty_buffers() {
        let buffers = MeshBuffers::from_mesh(Mesh::new()).unwrap();
        assert!(buffers.is_empty());
        assert_eq!(buffers.bounds.sphere_radius, 0.0);
    }

    #[test]
    fn test_weld_steps_below_f32_resolution_keep_indices() {
        let mut table = crate::weld::VertexTable::new(6);
        let a = table.weld(&Point3::new(100.000_001, 0.0, 0.0));
        let b = table.weld(&Point3::new(100.000_002, 0.0, 0.0));
        let c = table.weld(&Point3::new(100.0, 0.0, 1.0));
        assert_eq!((a, b, c), (0, 1, 2));

        let mut mesh = Mesh::new();
        for p in table.positions() {
            mesh.add_position(p);
        }
        mesh.add_triangle(a, b, c);
        let buffers = MeshBuffers::from_mesh(mesh).unwrap();

        assert_eq!(buffers.vertex_count(), 3);
        assert_eq!(buffers.position(0), buffers.position(1));
        assert_eq!(buffers.triangles(), vec![[0, 1, 2]]);
    }
}
