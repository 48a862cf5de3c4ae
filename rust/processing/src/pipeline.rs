// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layout computation.
//!
//! A pure function of its inputs: roof detection, grid fitting and
//! orientation run in sequence and produce a fresh [`LayoutResult`].

use crate::config::PipelineConfig;
use crate::types::{LayoutOutcome, LayoutResult, LayoutStats, PlacedPanel};
use solarplan_core::{PlacementOverride, SceneAsset};
use solarplan_geometry::{detect_roof, override_for, plan_layout_for, PanelFootprint};
use std::time::Instant;

/// Everything a layout depends on.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInputs<'a> {
    pub building: Option<&'a SceneAsset>,
    /// Measured panel asset; `None` when no panel is loaded or it has no mesh
    pub footprint: Option<&'a PanelFootprint>,
    pub overrides: &'a [PlacementOverride],
    pub config: &'a PipelineConfig,
}

/// Compute panel instances for the given inputs.
pub fn compute_layout(inputs: &LayoutInputs<'_>) -> LayoutResult {
    let start = Instant::now();

    let Some(building) = inputs.building.filter(|b| !b.is_empty()) else {
        return LayoutResult::empty(LayoutOutcome::NoBuilding);
    };
    let Some(footprint) = inputs.footprint else {
        return LayoutResult::empty(LayoutOutcome::NoPanelAsset);
    };
    let config = inputs.config;

    let roof = detect_roof(building, &config.roof);
    if roof.is_empty() {
        tracing::info!(building = %building.id, "No roof surface detected");
        return LayoutResult::empty(LayoutOutcome::NoRoof);
    }
    tracing::debug!(nodes = ?roof.names(), source = ?roof.source, "Roof detected");

    let overrides = inputs.overrides;
    let layout = plan_layout_for(&roof, footprint, &config.layout, overrides);

    let mut stats = LayoutStats {
        roof_nodes: roof.names(),
        roof_source: Some(roof.source),
        columns: layout.columns,
        rows: layout.rows,
        override_count: overrides.len(),
        ..Default::default()
    };

    if layout.is_empty() {
        tracing::info!(
            columns = layout.columns,
            rows = layout.rows,
            "Roof has no usable area for panels"
        );
        stats.compute_time_ms = start.elapsed().as_millis() as u64;
        return LayoutResult {
            stats,
            ..LayoutResult::empty(LayoutOutcome::NoUsableArea)
        };
    }

    let mut total_kwp: Option<f64> = None;
    let panels: Vec<PlacedPanel> = layout
        .positions
        .iter()
        .zip(&layout.orientations)
        .enumerate()
        .map(|(i, (position, rotation))| {
            let placement = override_for(i, overrides);
            if let Some(kwp) = placement.and_then(|p| p.kwp) {
                *total_kwp.get_or_insert(0.0) += kwp;
            }
            let override_index = placement.map(|_| i % overrides.len());
            PlacedPanel::new(position, rotation, &layout.scale, override_index)
        })
        .collect();

    stats.panel_count = panels.len();
    stats.total_kwp = total_kwp;
    stats.compute_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        panels = stats.panel_count,
        columns = stats.columns,
        rows = stats.rows,
        overrides = stats.override_count,
        compute_time_ms = stats.compute_time_ms,
        "Layout computed"
    );

    LayoutResult {
        outcome: LayoutOutcome::Placed,
        message: None,
        panels,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solarplan_core::{AssetId, Mesh, MeshNode, Point3, Vector3};
    use solarplan_geometry::resolve_orientation;

    fn flat_roof_building(width: f64, depth: f64) -> SceneAsset {
        let mut mesh = Mesh::new();
        for (x, z) in [(0.0, 0.0), (width, 0.0), (width, depth), (0.0, depth)] {
            mesh.add_vertex(Point3::new(x, 4.0, z), Vector3::y());
        }
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 3, 2);
        SceneAsset::new(AssetId::named("building"), vec![MeshNode::new("MainRoof", mesh)])
    }

    fn panel() -> PanelFootprint {
        PanelFootprint::flat(1.0, 1.0)
    }

    fn run(building: Option<&SceneAsset>, overrides: &[PlacementOverride]) -> LayoutResult {
        run_with(building, overrides, &PipelineConfig::default())
    }

    fn run_with(
        building: Option<&SceneAsset>,
        overrides: &[PlacementOverride],
        config: &PipelineConfig,
    ) -> LayoutResult {
        let fp = panel();
        compute_layout(&LayoutInputs {
            building,
            footprint: Some(&fp),
            overrides,
            config,
        })
    }

    fn azimuths(count: usize) -> Vec<PlacementOverride> {
        (0..count)
            .map(|i| PlacementOverride::new(i as f64 * 10.0, 15.0))
            .collect()
    }

    #[test]
    fn test_missing_inputs() {
        assert_eq!(run(None, &[]).outcome, LayoutOutcome::NoBuilding);

        let building = flat_roof_building(20.0, 10.0);
        let config = PipelineConfig::default();
        let result = compute_layout(&LayoutInputs {
            building: Some(&building),
            footprint: None,
            overrides: &[],
            config: &config,
        });
        assert_eq!(result.outcome, LayoutOutcome::NoPanelAsset);
        assert!(result.is_empty());
    }

    #[test]
    fn test_building_without_roof() {
        let mut mesh = Mesh::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
            mesh.add_vertex(Point3::new(x, y, 0.0), Vector3::z());
        }
        mesh.add_triangle(0, 1, 2);
        let building = SceneAsset::new(AssetId::named("wall"), vec![MeshNode::new("Wall", mesh)]);
        let result = run(Some(&building), &[]);
        assert_eq!(result.outcome, LayoutOutcome::NoRoof);
        assert!(result.message.is_some());
    }

    #[test]
    fn test_tiny_roof_has_no_usable_area() {
        let building = flat_roof_building(0.5, 0.5);
        let result = run(Some(&building), &[]);
        assert_eq!(result.outcome, LayoutOutcome::NoUsableArea);
        assert_eq!(result.stats.roof_nodes, vec!["MainRoof".to_string()]);
    }

    #[test]
    fn test_default_layout_is_flat() {
        let building = flat_roof_building(20.0, 10.0);
        let result = run(Some(&building), &[]);
        assert_eq!(result.outcome, LayoutOutcome::Placed);
        assert_eq!(result.len(), 50);
        for p in &result.panels {
            assert!(p.override_index.is_none());
            let up = p.rotation() * Vector3::y();
            assert_relative_eq!(up, Vector3::y(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_overrides_cap_and_cycle() {
        let building = flat_roof_building(20.0, 10.0);
        let overrides = vec![
            PlacementOverride { kwp: Some(0.4), ..PlacementOverride::new(180.0, 30.0) },
            PlacementOverride { kwp: Some(0.4), ..PlacementOverride::new(90.0, 15.0) },
        ];
        let result = run(Some(&building), &overrides);
        assert_eq!(result.len(), 2);
        assert_eq!(result.panels[0].override_index, Some(0));
        assert_eq!(result.panels[1].override_index, Some(1));
        assert_relative_eq!(result.stats.total_kwp.unwrap(), 0.8, epsilon = 1e-12);

        let south = result.panels[0].rotation() * Vector3::y();
        assert!(south.z > 0.0 && south.y > 0.0);
    }

    #[test]
    fn test_panel_cap_below_override_count() {
        let building = flat_roof_building(20.0, 10.0);
        let mut config = PipelineConfig::default();
        config.layout.max_panels = 3;
        let overrides = azimuths(5);
        let result = run_with(Some(&building), &overrides, &config);
        assert_eq!(result.len(), 3);
        assert_eq!(result.stats.override_count, 5);
        for (i, placed) in result.panels.iter().enumerate() {
            assert_eq!(placed.override_index, Some(i));
            let expected = resolve_orientation(Some(&overrides[i]), &panel());
            assert_relative_eq!(placed.rotation(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fixed_grid_bounds_panel_count() {
        let building = flat_roof_building(20.0, 10.0);
        let mut config = PipelineConfig::default();
        config.layout.fixed_grid = Some((2, 2));
        let result = run_with(Some(&building), &[], &config);
        assert_eq!(result.len(), 4);
        assert_eq!((result.stats.columns, result.stats.rows), (2, 2));

        // Grid capacity below the override count: each panel takes its own override
        config.layout.fixed_grid = Some((3, 2));
        let result = run_with(Some(&building), &azimuths(10), &config);
        assert_eq!(result.len(), 6);
        let indices: Vec<_> = result.panels.iter().map(|p| p.override_index).collect();
        assert_eq!(indices, (0..6).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_recomputation_is_deterministic() {
        let building = flat_roof_building(12.0, 7.0);
        let overrides = vec![PlacementOverride::new(200.0, 25.0)];
        assert_eq!(run(Some(&building), &overrides).panels, run(Some(&building), &overrides).panels);
    }
}
