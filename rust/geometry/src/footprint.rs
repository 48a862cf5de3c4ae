// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panel footprint extraction
//!
//! Measures a panel asset once: which local axis is the face normal (the
//! thinnest one), which in-plane axis is used as the panel heading when
//! orienting it, and how much room the panel takes once laid flat facing
//! North. Assets modelled standing up are measured as they will lie.

use crate::error::{Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use solarplan_core::{BoundingRegion, MeshNode, SceneAsset};

/// Tuning for footprint extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    /// Prefer this node/mesh name as the panel body when present
    pub mesh_name: Option<String>,
    /// In-plane extents above this are treated as authored in the wrong unit
    pub oversize_threshold: f64,
    /// Longest in-plane side after normalizing an oversize asset
    pub canonical_size: f64,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            mesh_name: None,
            oversize_threshold: 100.0,
            canonical_size: 4.0,
        }
    }
}

impl FootprintConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("oversize_threshold", self.oversize_threshold),
            ("canonical_size", self.canonical_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Physical description of a panel asset used for grid fitting.
///
/// Extents are those of the panel lying flat with its heading towards North,
/// i.e. under the default orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelFootprint {
    /// World X extent when laid flat, normalized
    pub width_x: f64,
    /// World Z extent when laid flat, normalized
    pub depth_z: f64,
    /// Extent along `normal_axis`, normalized
    pub thickness: f64,
    /// Local face normal (unit, along the thinnest axis)
    pub normal_axis: Vector3<f64>,
    /// Local in-plane heading axis (unit, orthogonal to `normal_axis`)
    pub in_plane_axis: Vector3<f64>,
    /// Lowest local coordinate along `normal_axis`, normalized; panels are
    /// lifted by its negation
    pub base_offset_y: f64,
    /// Center of the local bounds, normalized
    pub center: Vector3<f64>,
    /// Uniform factor applied to the raw asset to reach a plausible size
    pub normalization_factor: f64,
}

impl PanelFootprint {
    /// Zero-thickness flat panel centered on its origin
    pub fn flat(width_x: f64, depth_z: f64) -> Self {
        Self {
            width_x,
            depth_z,
            thickness: 0.0,
            normal_axis: Vector3::y(),
            in_plane_axis: -Vector3::z(),
            base_offset_y: 0.0,
            center: Vector3::zeros(),
            normalization_factor: 1.0,
        }
    }

    /// Local axis completing `(normal_axis, in_plane_axis)` to a right-handed
    /// frame. Its extent is `width_x`.
    pub fn cross_axis(&self) -> Vector3<f64> {
        self.normal_axis.cross(&self.in_plane_axis)
    }

    /// Local per-axis factor for grid scale `scale`: the in-plane axes grow,
    /// the normal axis keeps its thickness.
    pub fn axis_scale(&self, scale: f64) -> Vector3<f64> {
        Vector3::repeat(scale) + self.normal_axis.abs() * (1.0 - scale)
    }

    /// Instance scale applied to the raw asset, `(s·nf, nf, s·nf)` for a
    /// flat panel
    pub fn instance_scale(&self, scale: f64) -> Vector3<f64> {
        self.axis_scale(scale) * self.normalization_factor
    }
}

/// Measure a panel asset. Returns `None` when it has no mesh.
pub fn extract_footprint(panel: &SceneAsset, config: &FootprintConfig) -> Option<PanelFootprint> {
    let nodes: Vec<&MeshNode> = match config
        .mesh_name
        .as_deref()
        .and_then(|name| panel.find_node(name))
        .filter(|n| !n.mesh.is_empty())
    {
        Some(node) => vec![node],
        None => panel.mesh_nodes().collect(),
    };

    let (size, bounds) = match nodes.as_slice() {
        [] => return None,
        [single] => {
            let b = single.world_bounds();
            (b.size(), b)
        }
        many => combined_extent(many),
    };
    if !(size.x.is_finite() && size.y.is_finite() && size.z.is_finite()) {
        return None;
    }

    let dims = [size.x, size.y, size.z];
    let thin = (0..3)
        .min_by(|&a, &b| dims[a].total_cmp(&dims[b]))
        .unwrap_or(1);
    // (normal, heading, width extent, depth extent) as laid flat facing North
    let (normal_axis, in_plane_axis, width, depth) = match thin {
        0 => (Vector3::x(), -Vector3::y(), size.z, size.y),
        1 => (Vector3::y(), -Vector3::z(), size.x, size.z),
        _ => (Vector3::z(), -Vector3::y(), size.x, size.y),
    };

    let longest = width.max(depth);
    let normalization_factor = if longest > config.oversize_threshold {
        config.canonical_size / longest
    } else {
        1.0
    };
    let center = bounds.center().coords;

    Some(PanelFootprint {
        width_x: (width * normalization_factor).max(1e-6),
        depth_z: (depth * normalization_factor).max(1e-6),
        thickness: dims[thin] * normalization_factor,
        normal_axis,
        in_plane_axis,
        base_offset_y: bounds.min[thin] * normalization_factor,
        center: center * normalization_factor,
        normalization_factor,
    })
}

/// Extents from the union of all nodes, except the height, which comes from
/// the node with the largest XZ area so support structures do not count
/// towards the panel thickness.
fn combined_extent(nodes: &[&MeshNode]) -> (Vector3<f64>, BoundingRegion) {
    let mut union = BoundingRegion::new();
    let mut plate = BoundingRegion::new();
    for node in nodes {
        let b = node.world_bounds();
        if b.xz_area() > plate.xz_area() || !plate.is_valid() {
            plate = b;
        }
        union.union(&b);
    }
    let size = union.size();
    (Vector3::new(size.x, plate.size().y, size.z), union)
}
