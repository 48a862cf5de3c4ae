// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline output types.

use serde::Serialize;
use solarplan_core::{Point3, Quaternion, UnitQuaternion, Vector3};
use solarplan_geometry::RoofSource;

/// One positioned panel instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPanel {
    /// World-space origin.
    pub position: [f64; 3],
    /// Unit quaternion as `[x, y, z, w]`.
    pub orientation: [f64; 4],
    /// Per-axis instance scale.
    pub scale: [f64; 3],
    /// Index of the override that oriented this panel, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_index: Option<usize>,
}

impl PlacedPanel {
    pub fn new(
        position: &Point3<f64>,
        orientation: &UnitQuaternion<f64>,
        scale: &Vector3<f64>,
        override_index: Option<usize>,
    ) -> Self {
        let q = orientation.quaternion();
        Self {
            position: [position.x, position.y, position.z],
            orientation: [q.i, q.j, q.k, q.w],
            scale: [scale.x, scale.y, scale.z],
            override_index,
        }
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let [x, y, z, w] = self.orientation;
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
    }
}

/// Why a layout did or did not produce panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutOutcome {
    Placed,
    NoBuilding,
    NoPanelAsset,
    NoRoof,
    NoUsableArea,
}

impl LayoutOutcome {
    /// Advisory text for hosts to show next to an empty scene.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LayoutOutcome::Placed => None,
            LayoutOutcome::NoBuilding => Some("No building model loaded"),
            LayoutOutcome::NoPanelAsset => Some("Panel model has no usable mesh"),
            LayoutOutcome::NoRoof => Some("No roof surface found on the building"),
            LayoutOutcome::NoUsableArea => Some("Roof is too small for any panel"),
        }
    }
}

/// Layout diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStats {
    /// Names of the roof nodes panels were fitted on.
    pub roof_nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_source: Option<RoofSource>,
    pub columns: u32,
    pub rows: u32,
    pub panel_count: usize,
    /// Number of overrides available when the layout was computed.
    pub override_count: usize,
    /// Sum of `kwp` over the overrides used, when any reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_kwp: Option<f64>,
    pub compute_time_ms: u64,
}

/// Complete result of one layout computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub outcome: LayoutOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub panels: Vec<PlacedPanel>,
    pub stats: LayoutStats,
}

impl LayoutResult {
    /// A result with no panels.
    pub fn empty(outcome: LayoutOutcome) -> Self {
        Self {
            outcome,
            message: outcome.message(),
            panels: Vec::new(),
            stats: LayoutStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
