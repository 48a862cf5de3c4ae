// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF loading against the bundled fixtures.

use approx::assert_relative_eq;
use solarplan_core::{load_scene, load_scene_slice, AssetId};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_house_nodes_are_flattened_with_world_transforms() {
    let scene = load_scene(fixture("house.gltf")).expect("Failed to load house fixture");

    // The grouping node has no mesh and is not emitted.
    assert_eq!(scene.nodes.len(), 2);

    let roof = scene.find_node("Roof").expect("Roof node missing");
    assert_eq!(roof.mesh_name.as_deref(), Some("SlabMesh"));
    assert_eq!(roof.mesh.vertex_count(), 24);
    assert_eq!(roof.mesh.triangle_count(), 12);
    assert!(roof.mesh.has_normals());

    let bounds = roof.world_bounds();
    assert_relative_eq!(bounds.min.y, 5.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.max.y, 5.2, epsilon = 1e-6);
    assert_relative_eq!(bounds.max.x, 10.0, epsilon = 1e-6);

    let whole = scene.world_bounds();
    assert_relative_eq!(whole.min.y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(whole.max.y, 5.2, epsilon = 1e-6);
}

#[test]
fn test_asset_identity_matches_file_bytes() {
    let path = fixture("panel.gltf");
    let bytes = std::fs::read(&path).unwrap();
    let from_disk = load_scene(&path).unwrap();
    let from_memory = load_scene_slice(&bytes).unwrap();

    assert_eq!(from_disk.id, AssetId::from_bytes(&bytes));
    assert_eq!(from_disk.id, from_memory.id);
    assert_eq!(from_memory.nodes[0].name, "SolarPanel");
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_scene(fixture("does_not_exist.gltf")).unwrap_err();
    assert!(err.to_string().contains("does_not_exist.gltf"));
}

#[test]
fn test_garbage_bytes_are_rejected() {
    assert!(load_scene_slice(b"not a gltf").is_err());
}
