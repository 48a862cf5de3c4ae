// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF asset loading
//!
//! Walks the default scene (or every scene when none is marked default),
//! composes node transforms down the hierarchy and emits one [`MeshNode`]
//! per mesh-bearing node. Primitives of the same mesh are merged; only
//! triangle-list primitives are read.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::scene::{AssetId, MeshNode, SceneAsset};
use gltf::mesh::Mode;
use nalgebra::Matrix4;
use std::path::Path;

/// Load a `.gltf` (external or embedded buffers) or `.glb` file from disk
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneAsset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let (document, buffers, _images) = gltf::import(path)?;
    build_scene(AssetId::from_bytes(&bytes), &document, &buffers)
}

/// Load a self-contained asset (`.glb` or `.gltf` with data URIs) from memory
pub fn load_scene_slice(bytes: &[u8]) -> Result<SceneAsset> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    build_scene(AssetId::from_bytes(bytes), &document, &buffers)
}

fn build_scene(
    id: AssetId,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<SceneAsset> {
    let roots: Vec<gltf::Node> = match document.default_scene() {
        Some(scene) => scene.nodes().collect(),
        None => document.scenes().flat_map(|s| s.nodes()).collect(),
    };
    if roots.is_empty() && document.scenes().next().is_none() {
        return Err(Error::NoScene);
    }

    let mut nodes = Vec::new();
    for root in roots {
        visit_node(&root, &Matrix4::identity(), buffers, &mut nodes)?;
    }
    Ok(SceneAsset::new(id, nodes))
}

fn visit_node(
    node: &gltf::Node,
    parent: &Matrix4<f64>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshNode>,
) -> Result<()> {
    let world = parent * node_matrix(node);

    if let Some(mesh) = node.mesh() {
        let geometry = read_mesh(&mesh, buffers)?;
        if !geometry.is_empty() {
            out.push(MeshNode {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
                mesh_name: mesh.name().map(str::to_string),
                mesh: geometry,
                world,
            });
        }
    }

    for child in node.children() {
        visit_node(&child, &world, buffers, out)?;
    }
    Ok(())
}

/// Node local transform as an f64 column-major matrix
fn node_matrix(node: &gltf::Node) -> Matrix4<f64> {
    let cols = node.transform().matrix();
    Matrix4::from_fn(|r, c| cols[c][r] as f64)
}

fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<Mesh> {
    let mut combined = Mesh::new();
    let mut all_have_normals = true;
    let label = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let mut part = Mesh::new();
        for p in positions {
            part.positions.extend_from_slice(&p);
        }

        match reader.read_normals() {
            Some(normals) => {
                for n in normals {
                    part.normals.extend_from_slice(&n);
                }
                if part.normals.len() != part.positions.len() {
                    return Err(Error::MalformedPrimitive {
                        mesh: label,
                        reason: "normal count differs from position count".into(),
                    });
                }
            }
            None => all_have_normals = false,
        }

        match reader.read_indices() {
            Some(indices) => part.indices.extend(indices.into_u32()),
            // Make non-indexed primitives explicit so merging keeps offsets right.
            None => part.indices.extend(0..part.vertex_count() as u32),
        }

        combined.merge(&part);
    }

    if !all_have_normals {
        combined.normals.clear();
    }
    Ok(combined)
}
