// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof detection
//!
//! Two passes over the building's mesh nodes:
//!
//! 1. **Name match**: any node whose node or mesh name contains `roof`
//!    (case-insensitive) is taken as-is.
//! 2. **Heuristic**: nodes whose top is within a small fraction of the
//!    building's height from the roofline are scored by how much their
//!    normals point up, times their XZ area.

use crate::error::{Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use solarplan_core::{BoundingRegion, MeshNode, SceneAsset};

/// How many heuristic candidates make up the roof
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "ratio", rename_all = "snake_case")]
pub enum RoofSelection {
    /// Only the best-scoring node
    Best,
    /// Every node scoring at least `ratio` × the best score
    WithinRatio(f64),
}

/// Tuning for the heuristic pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoofDetectorConfig {
    /// Substring that marks a node as roof in the name pass
    pub name_hint: String,
    /// Allowed gap between a node's top and the roofline, as a fraction of building height
    pub near_top_fraction: f64,
    /// Upper bound on normals read per node
    pub max_normal_samples: usize,
    pub selection: RoofSelection,
}

impl Default for RoofDetectorConfig {
    fn default() -> Self {
        Self {
            name_hint: "roof".into(),
            near_top_fraction: 0.02,
            max_normal_samples: 2000,
            selection: RoofSelection::Best,
        }
    }
}

impl RoofDetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.near_top_fraction.is_finite() && self.near_top_fraction >= 0.0) {
            return Err(Error::config("near_top_fraction must be a non-negative number"));
        }
        if self.max_normal_samples == 0 {
            return Err(Error::config("max_normal_samples must be at least 1"));
        }
        if let RoofSelection::WithinRatio(r) = self.selection {
            if !(0.0..=1.0).contains(&r) {
                return Err(Error::config("roof selection ratio must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

/// How a roof surface was identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofSource {
    NameMatch,
    Heuristic,
    NotFound,
}

/// Mesh nodes identified as rooftop (may be empty)
#[derive(Debug, Clone)]
pub struct RoofSurface<'a> {
    pub nodes: Vec<&'a MeshNode>,
    pub source: RoofSource,
}

impl<'a> RoofSurface<'a> {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            source: RoofSource::NotFound,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the roof nodes, for reporting
    pub fn names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    /// Combined world bounds of all roof nodes
    pub fn world_bounds(&self) -> BoundingRegion {
        let mut bounds = BoundingRegion::new();
        for node in &self.nodes {
            bounds.union(&node.world_bounds());
        }
        bounds
    }
}

/// Identify the roof of `building`
pub fn detect_roof<'a>(building: &'a SceneAsset, config: &RoofDetectorConfig) -> RoofSurface<'a> {
    let named: Vec<&MeshNode> = building
        .mesh_nodes()
        .filter(|n| n.name_contains(&config.name_hint))
        .collect();
    if !named.is_empty() {
        return RoofSurface {
            nodes: named,
            source: RoofSource::NameMatch,
        };
    }

    let scored = score_candidates(building, config);
    let best = scored.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
    if best <= 0.0 {
        return RoofSurface::empty();
    }

    let nodes = match config.selection {
        RoofSelection::Best => scored
            .iter()
            .find(|(_, s)| *s == best)
            .map(|(n, _)| vec![*n])
            .unwrap_or_default(),
        RoofSelection::WithinRatio(ratio) => scored
            .iter()
            .filter(|(_, s)| *s >= best * ratio)
            .map(|(n, _)| *n)
            .collect(),
    };

    RoofSurface {
        nodes,
        source: RoofSource::Heuristic,
    }
}

/// Score every near-top node with normals; nodes with zero upness are dropped
fn score_candidates<'a>(
    building: &'a SceneAsset,
    config: &RoofDetectorConfig,
) -> Vec<(&'a MeshNode, f64)> {
    let model = building.world_bounds();
    if !model.is_valid() {
        return Vec::new();
    }
    let top_y = model.max.y;
    let model_height = (model.max.y - model.min.y).max(1e-6);
    let near_top = config.near_top_fraction * model_height;

    building
        .mesh_nodes()
        .filter_map(|node| {
            if !node.mesh.has_normals() {
                return None;
            }
            let bounds = node.world_bounds();
            if !bounds.is_valid() || (bounds.max.y - top_y).abs() > near_top {
                return None;
            }
            let upness = mean_upness(node, config.max_normal_samples);
            if upness <= 0.0 {
                return None;
            }
            let area = bounds.xz_area().max(1e-6);
            Some((node, upness * area))
        })
        .collect()
}

/// Average of `max(0, n·up)` over a strided sample of world-space normals
fn mean_upness(node: &MeshNode, max_samples: usize) -> f64 {
    let count = node.mesh.vertex_count();
    if count == 0 {
        return 0.0;
    }
    let stride = (count / max_samples.max(1)).max(1);
    let normal_matrix = node.normal_matrix();
    let up = Vector3::y();

    let (sum, samples) = (0..count)
        .step_by(stride)
        .map(|i| node.world_normal(&normal_matrix, i).dot(&up).max(0.0))
        .fold((0.0, 0usize), |(sum, n), u| (sum + u, n + 1));

    sum / samples as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use solarplan_core::{AssetId, Mesh};

    /// Horizontal quad spanning [x0,x1]×[z0,z1] at height y with normal n
    fn slab(name: &str, x0: f64, x1: f64, z0: f64, z1: f64, y: f64, n: Vector3<f64>) -> MeshNode {
        let mut mesh = Mesh::new();
        for (x, z) in [(x0, z0), (x1, z0), (x1, z1), (x0, z1)] {
            mesh.add_vertex(Point3::new(x, y, z), n);
        }
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 3, 2);
        MeshNode::new(name, mesh)
    }

    fn building(nodes: Vec<MeshNode>) -> SceneAsset {
        SceneAsset::new(AssetId::named("building"), nodes)
    }

    #[test]
    fn test_name_match_is_authoritative() {
        let scene = building(vec![
            slab("Object_1", 0.0, 20.0, 0.0, 20.0, 10.0, Vector3::y()),
            slab("Garage_Roof", 0.0, 2.0, 0.0, 2.0, 3.0, Vector3::x()),
        ]);
        let roof = detect_roof(&scene, &RoofDetectorConfig::default());
        assert_eq!(roof.source, RoofSource::NameMatch);
        assert_eq!(roof.names(), vec!["Garage_Roof".to_string()]);
    }

    #[test]
    fn test_heuristic_prefers_large_upward_surface_near_top() {
        let scene = building(vec![
            slab("floor", 0.0, 10.0, 0.0, 10.0, 0.0, Vector3::y()),
            slab("top_small", 0.0, 1.0, 0.0, 1.0, 10.0, Vector3::y()),
            slab("top_large", 0.0, 8.0, 0.0, 8.0, 10.0, Vector3::y()),
            slab("ceiling", 0.0, 9.0, 0.0, 9.0, 10.0, -Vector3::y()),
        ]);
        let roof = detect_roof(&scene, &RoofDetectorConfig::default());
        assert_eq!(roof.source, RoofSource::Heuristic);
        assert_eq!(roof.names(), vec!["top_large".to_string()]);
    }

    #[test]
    fn test_within_ratio_returns_multiple_faces() {
        let scene = building(vec![
            slab("a", 0.0, 10.0, 0.0, 10.0, 10.0, Vector3::y()),
            slab("b", 0.0, 10.0, 0.0, 6.0, 10.0, Vector3::y()),
            slab("c", 0.0, 1.0, 0.0, 1.0, 10.0, Vector3::y()),
            slab("ground", 0.0, 30.0, 0.0, 30.0, 0.0, Vector3::y()),
        ]);
        let config = RoofDetectorConfig {
            selection: RoofSelection::WithinRatio(0.5),
            ..Default::default()
        };
        let roof = detect_roof(&scene, &config);
        assert_eq!(roof.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_nodes_without_normals_never_qualify() {
        let mut node = slab("plate", 0.0, 4.0, 0.0, 4.0, 5.0, Vector3::y());
        node.mesh.normals.clear();
        let b = building(vec![node]);
        let roof = detect_roof(&b, &RoofDetectorConfig::default());
        assert!(roof.is_empty());
        assert_eq!(roof.source, RoofSource::NotFound);
    }

    #[test]
    fn test_empty_building_has_no_roof() {
        let b = building(vec![]);
        let roof = detect_roof(&b, &RoofDetectorConfig::default());
        assert!(roof.is_empty());
    }

    #[test]
    fn test_upness_sampling_is_strided() {
        let mut mesh = Mesh::new();
        for i in 0..10_000 {
            let n = if i % 2 == 0 { Vector3::y() } else { -Vector3::y() };
            mesh.add_vertex(Point3::new(i as f64, 0.0, 0.0), n);
        }
        let node = MeshNode::new("dense", mesh);
        // stride 5 lands on both parities, so half the samples point up
        assert_relative_eq!(mean_upness(&node, 2000), 0.5, epsilon = 1e-9);
        // stride 2 lands only on even indices
        assert_relative_eq!(mean_upness(&node, 5000), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_config_validation() {
        assert!(RoofDetectorConfig::default().validate().is_ok());
        let bad = RoofDetectorConfig {
            selection: RoofSelection::WithinRatio(1.5),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
