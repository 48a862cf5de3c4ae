// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SolarPlan Core
//!
//! Data model shared by the placement pipeline:
//!
//! - **Meshes and scenes**: flat triangle meshes placed by world transforms,
//!   produced by walking a glTF scene graph ([`load_scene`])
//! - **Bounds**: f64 axis-aligned regions used for roof and footprint sizing
//! - **Overrides**: per-panel azimuth/slope values decoded from the
//!   calculation service or from a persisted result
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solarplan_core::{load_scene, OverrideSet};
//!
//! let building = load_scene("models/Building/scene.gltf")?;
//! for node in building.mesh_nodes() {
//!     println!("{}: {} vertices", node.name, node.mesh.vertex_count());
//! }
//!
//! let overrides = OverrideSet::from_json_str(r#"{"solarPanels": [{"azimuth": 180, "slope": 30}]}"#)?;
//! ```

pub mod bounds;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod overrides;
pub mod scene;

pub use bounds::BoundingRegion;
pub use error::{Error, Result};
pub use loader::{load_scene, load_scene_slice};
pub use mesh::Mesh;
pub use overrides::{CalculationResponse, OverrideSet, PersistedResult, PlacementOverride};
pub use scene::{AssetId, MeshNode, SceneAsset};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
