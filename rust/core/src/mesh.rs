// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, Vector3};

/// Triangle mesh in mesh-local coordinates
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); empty when the source had none
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2); empty for non-indexed geometry
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
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
        if self.indices.is_empty() {
            self.vertex_count() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every vertex carries a normal
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Local-space position of vertex `i`
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f64> {
        let p = &self.positions[i * 3..i * 3 + 3];
        Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)
    }

    /// Local-space normal of vertex `i`
    #[inline]
    pub fn normal(&self, i: usize) -> Vector3<f64> {
        let n = &self.normals[i * 3..i * 3 + 3];
        Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64)
    }

    /// Iterate triangles as vertex index triples.
    ///
    /// Non-indexed meshes are read as consecutive vertex triples. Triangles
    /// referencing vertices out of range are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let vertex_count = self.vertex_count();
        let indexed = !self.indices.is_empty();
        (0..self.triangle_count())
            .map(move |t| {
                if indexed {
                    [
                        self.indices[t * 3] as usize,
                        self.indices[t * 3 + 1] as usize,
                        self.indices[t * 3 + 2] as usize,
                    ]
                } else {
                    [t * 3, t * 3 + 1, t * 3 + 2]
                }
            })
            .filter(move |tri| tri.iter().all(|&i| i < vertex_count))
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }
}
