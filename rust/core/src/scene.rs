// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loaded scene assets
//!
//! A [`SceneAsset`] is the flattened result of walking a scene graph: every
//! node that carries triangle geometry becomes one [`MeshNode`] with its
//! composed world transform. Placement code only ever reads these.

use crate::bounds::BoundingRegion;
use crate::mesh::Mesh;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content identity of a loaded asset (SHA-256 of its source bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(String);

impl AssetId {
    /// Hash asset bytes into an identity
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Use a caller-chosen identity (e.g. for procedurally built scenes)
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A mesh placed in the world by its node transform
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Scene node name (empty if unnamed)
    pub name: String,
    /// Name of the referenced mesh, if any
    pub mesh_name: Option<String>,
    /// Geometry in mesh-local coordinates
    pub mesh: Mesh,
    /// Local-to-world transform
    pub world: Matrix4<f64>,
}

impl MeshNode {
    /// Create a node with an identity transform
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh_name: None,
            mesh,
            world: Matrix4::identity(),
        }
    }

    /// Builder-style transform setter
    pub fn with_transform(mut self, world: Matrix4<f64>) -> Self {
        self.world = world;
        self
    }

    /// Case-insensitive match against the node name or the mesh name
    pub fn name_contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .mesh_name
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(&needle))
    }

    /// World-space position of vertex `i`
    #[inline]
    pub fn world_position(&self, i: usize) -> Point3<f64> {
        self.world.transform_point(&self.mesh.position(i))
    }

    /// Iterate all vertices in world space
    pub fn world_positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        (0..self.mesh.vertex_count()).map(move |i| self.world_position(i))
    }

    /// Inverse-transpose of the upper 3x3, for carrying normals to world space.
    ///
    /// Singular transforms fall back to the plain linear part.
    pub fn normal_matrix(&self) -> Matrix3<f64> {
        let linear: Matrix3<f64> = self.world.fixed_view::<3, 3>(0, 0).into_owned();
        linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear)
    }

    /// World-space unit normal of vertex `i` given a precomputed normal matrix
    #[inline]
    pub fn world_normal(&self, normal_matrix: &Matrix3<f64>, i: usize) -> Vector3<f64> {
        let n = normal_matrix * self.mesh.normal(i);
        n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
    }

    /// World-space bounds of this node
    pub fn world_bounds(&self) -> BoundingRegion {
        BoundingRegion::from_points(self.world_positions())
    }
}

/// Flattened scene: every mesh-bearing node of a loaded asset
#[derive(Debug, Clone)]
pub struct SceneAsset {
    /// Content identity
    pub id: AssetId,
    /// Mesh nodes in traversal order
    pub nodes: Vec<MeshNode>,
}

impl SceneAsset {
    pub fn new(id: AssetId, nodes: Vec<MeshNode>) -> Self {
        Self { id, nodes }
    }

    /// True when no node carries any vertex
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.mesh.is_empty())
    }

    /// Nodes that carry geometry
    pub fn mesh_nodes(&self) -> impl Iterator<Item = &MeshNode> {
        self.nodes.iter().filter(|n| !n.mesh.is_empty())
    }

    /// First node whose node name or mesh name equals `name` exactly
    pub fn find_node(&self, name: &str) -> Option<&MeshNode> {
        self.nodes
            .iter()
            .find(|n| n.name == name || n.mesh_name.as_deref() == Some(name))
    }

    /// Bounds of the whole asset in world space
    pub fn world_bounds(&self) -> BoundingRegion {
        let mut bounds = BoundingRegion::new();
        for node in self.mesh_nodes() {
            bounds.union(&node.world_bounds());
        }
        bounds
    }
}
