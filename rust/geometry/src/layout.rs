// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid layout planning
//!
//! Fits a regular grid of panels onto the top of a roof:
//!
//! 1. Collect the roof vertices lying on its top plane and take their XZ
//!    rectangle, shrunk by the configured margins.
//! 2. Size a cell to hold the panel in every orientation in use, and scale
//!    the panel so `target_across` cells span the long side.
//! 3. Center a row-major grid in the rectangle, drop cells that stick out,
//!    then drop each remaining cell onto the roof triangles to find its
//!    height.
//!
//! Degenerate input (empty roof, zero area) yields an empty [`Layout`].

use crate::error::{Error, Result};
use crate::footprint::PanelFootprint;
use crate::orientation::{override_for, resolve_orientation};
use crate::raycast::SurfaceSampler;
use crate::roof::RoofSurface;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use solarplan_core::{BoundingRegion, PlacementOverride};

/// Grid fitting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Panels spanning the long side of the roof rectangle
    pub target_across: u32,
    /// Inset from the roof edge along X
    pub margin_x: f64,
    /// Inset from the roof edge along Z
    pub margin_z: f64,
    /// Hard cap on placed panels
    pub max_panels: usize,
    /// Let panels grow beyond their authored size to fill the roof
    pub allow_upscale: bool,
    pub min_scale: f64,
    /// Spacing between neighbouring panels
    pub panel_gap: f64,
    /// How far a panel may overhang the rectangle before it is dropped
    pub boundary_tolerance: f64,
    /// Height band below the roof maximum counted as the top surface
    pub top_tolerance: f64,
    /// Retry band, as a fraction of roof height, when the tight band finds nothing
    pub top_tolerance_fallback_fraction: f64,
    /// Clearance between roof surface and panel base
    pub panel_lift: f64,
    /// Cells whose surface normal points up less than this are skipped
    pub min_surface_upness: f64,
    /// Explicit `(columns, rows)`, bypassing the auto-fit
    pub fixed_grid: Option<(u32, u32)>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_across: 16,
            margin_x: 0.5,
            margin_z: 0.5,
            max_panels: 50,
            allow_upscale: false,
            min_scale: 0.001,
            panel_gap: 0.0,
            boundary_tolerance: 0.4,
            top_tolerance: 0.01,
            top_tolerance_fallback_fraction: 0.05,
            panel_lift: 0.05,
            min_surface_upness: 0.6,
            fixed_grid: None,
        }
    }
}

impl LayoutConfig {
    /// Reject parameters that would make the grid meaningless
    pub fn validate(&self) -> Result<()> {
        if self.target_across == 0 {
            return Err(Error::config("target_across must be at least 1"));
        }
        if self.max_panels == 0 {
            return Err(Error::config("max_panels must be at least 1"));
        }
        let non_negative = [
            ("margin_x", self.margin_x),
            ("margin_z", self.margin_z),
            ("panel_gap", self.panel_gap),
            ("boundary_tolerance", self.boundary_tolerance),
            ("top_tolerance", self.top_tolerance),
            ("top_tolerance_fallback_fraction", self.top_tolerance_fallback_fraction),
            ("panel_lift", self.panel_lift),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::config(format!("{name} must be a non-negative number")));
            }
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(Error::config("min_scale must be positive"));
        }
        if !(0.0..=1.0).contains(&self.min_surface_upness) {
            return Err(Error::config("min_surface_upness must lie in [0, 1]"));
        }
        if let Some((cols, rows)) = self.fixed_grid {
            if cols == 0 || rows == 0 {
                return Err(Error::config("fixed_grid needs at least one column and one row"));
            }
        }
        Ok(())
    }
}

/// Usable rectangle on top of the roof, after margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoofRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
    /// Height of the roof's top plane
    pub top_y: f64,
}

impl RoofRect {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    fn contains_cell(&self, x: f64, z: f64, half_w: f64, half_d: f64, tolerance: f64) -> bool {
        x - half_w >= self.min_x - tolerance
            && x + half_w <= self.max_x + tolerance
            && z - half_d >= self.min_z - tolerance
            && z + half_d <= self.max_z + tolerance
    }
}

/// Horizontal room one panel takes on the roof.
///
/// Along each world axis a panel spans `in_plane × scale + fixed`: the
/// in-plane sides grow with the grid scale, the thickness does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEnvelope {
    pub in_plane_x: f64,
    pub in_plane_z: f64,
    pub fixed_x: f64,
    pub fixed_z: f64,
}

impl CellEnvelope {
    /// Panel lying flat with its heading towards North
    pub fn upright(footprint: &PanelFootprint) -> Self {
        Self {
            in_plane_x: footprint.width_x,
            in_plane_z: footprint.depth_z,
            fixed_x: 0.0,
            fixed_z: 0.0,
        }
    }

    /// World-axis extents of the panel box turned by `rotation`
    pub fn rotated(footprint: &PanelFootprint, rotation: &UnitQuaternion<f64>) -> Self {
        let heading = rotation * footprint.in_plane_axis;
        let cross = rotation * footprint.cross_axis();
        let normal = rotation * footprint.normal_axis;
        Self {
            in_plane_x: heading.x.abs() * footprint.depth_z + cross.x.abs() * footprint.width_x,
            in_plane_z: heading.z.abs() * footprint.depth_z + cross.z.abs() * footprint.width_x,
            fixed_x: normal.x.abs() * footprint.thickness,
            fixed_z: normal.z.abs() * footprint.thickness,
        }
    }

    /// Smallest envelope holding both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            in_plane_x: self.in_plane_x.max(other.in_plane_x),
            in_plane_z: self.in_plane_z.max(other.in_plane_z),
            fixed_x: self.fixed_x.max(other.fixed_x),
            fixed_z: self.fixed_z.max(other.fixed_z),
        }
    }

    pub fn width(&self, scale: f64) -> f64 {
        self.in_plane_x * scale + self.fixed_x
    }

    pub fn depth(&self, scale: f64) -> f64 {
        self.in_plane_z * scale + self.fixed_z
    }
}

/// Planned panel positions on a roof
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Usable rectangle, `None` when the roof offers no area
    pub rect: Option<RoofRect>,
    /// World-space panel origins in row-major order
    pub positions: Vec<Point3<f64>>,
    /// Rotation of each panel, parallel to `positions`
    pub orientations: Vec<UnitQuaternion<f64>>,
    /// Grid cells along X
    pub columns: u32,
    /// Grid cells along Z
    pub rows: u32,
    /// Per-instance scale, `(s·nf, nf, s·nf)` for a flat panel
    pub scale: Vector3<f64>,
}

impl Layout {
    pub fn empty() -> Self {
        Self {
            rect: None,
            positions: Vec::new(),
            orientations: Vec::new(),
            columns: 0,
            rows: 0,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Fit a grid of default-oriented `footprint` panels onto `roof`.
///
/// `override_count`, when non-zero, caps the number of panels together with
/// `config.max_panels`.
pub fn plan_layout(
    roof: &RoofSurface<'_>,
    footprint: &PanelFootprint,
    config: &LayoutConfig,
    override_count: usize,
) -> Layout {
    plan(roof, footprint, config, override_count, &[])
}

/// Fit a grid onto `roof` for panels oriented by `overrides`.
///
/// Cells are sized to hold the widest orientation in use, and each turned
/// panel keeps its center where the default-oriented panel would have it.
pub fn plan_layout_for(
    roof: &RoofSurface<'_>,
    footprint: &PanelFootprint,
    config: &LayoutConfig,
    overrides: &[PlacementOverride],
) -> Layout {
    plan(roof, footprint, config, overrides.len(), overrides)
}

fn plan(
    roof: &RoofSurface<'_>,
    footprint: &PanelFootprint,
    config: &LayoutConfig,
    override_count: usize,
    overrides: &[PlacementOverride],
) -> Layout {
    if roof.is_empty() {
        return Layout::empty();
    }
    let Some(rect) = usable_rect(roof, config) else {
        return Layout::empty();
    };

    let cap = if override_count > 0 {
        config.max_panels.min(override_count)
    } else {
        config.max_panels
    };
    let default_rotation = resolve_orientation(None, footprint);
    let envelope = overrides
        .iter()
        .take(cap)
        .map(|p| CellEnvelope::rotated(footprint, &resolve_orientation(Some(p), footprint)))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| CellEnvelope::upright(footprint));

    let gap = config.panel_gap;
    let (scale, columns, rows) = match config.fixed_grid {
        Some((cols, rows)) => (1.0, cols, rows),
        None => fit_grid(&rect, &envelope, config),
    };

    let eff_w = envelope.width(scale);
    let eff_d = envelope.depth(scale);
    let step_x = if columns > 1 { eff_w + gap } else { 0.0 };
    let step_z = if rows > 1 { eff_d + gap } else { 0.0 };
    let (cx, cz) = rect.center();
    let origin_x = cx - step_x * (columns as f64 - 1.0) * 0.5;
    let origin_z = cz - step_z * (rows as f64 - 1.0) * 0.5;

    let lift = config.panel_lift - footprint.base_offset_y;
    let center = footprint.center.component_mul(&footprint.axis_scale(scale));
    let default_center = default_rotation * center;
    let sampler = SurfaceSampler::new(roof.nodes.iter().copied());
    let up = Vector3::y();

    let mut positions = Vec::new();
    let mut orientations = Vec::new();
    'grid: for row in 0..rows {
        for col in 0..columns {
            if positions.len() >= cap {
                break 'grid;
            }
            let x = origin_x + step_x * col as f64;
            let z = origin_z + step_z * row as f64;
            if !rect.contains_cell(x, z, eff_w * 0.5, eff_d * 0.5, config.boundary_tolerance) {
                continue;
            }

            let surface_y = if sampler.is_empty() {
                rect.top_y
            } else {
                match sampler.probe(x, z) {
                    Some(hit) if hit.normal.dot(&up) >= config.min_surface_upness => hit.point.y,
                    _ => continue,
                }
            };

            let rotation = match override_for(positions.len(), overrides) {
                Some(p) => resolve_orientation(Some(p), footprint),
                None => default_rotation,
            };
            let shift = default_center - rotation * center;
            positions.push(Point3::new(x + shift.x, surface_y + lift, z + shift.z));
            orientations.push(rotation);
        }
    }

    Layout {
        rect: Some(rect),
        positions,
        orientations,
        columns,
        rows,
        scale: footprint.instance_scale(scale),
    }
}

/// Auto-fit: `(scale, columns, rows)` with `target_across` along the long side
fn fit_grid(rect: &RoofRect, envelope: &CellEnvelope, config: &LayoutConfig) -> (f64, u32, u32) {
    let across = config.target_across.max(1);
    let gap = config.panel_gap;
    let x_is_long = rect.width() >= rect.depth();
    let (long_span, short_span) = if x_is_long {
        (rect.width(), rect.depth())
    } else {
        (rect.depth(), rect.width())
    };
    let (long_base, long_fixed, short_base, short_fixed) = if x_is_long {
        (envelope.in_plane_x, envelope.fixed_x, envelope.in_plane_z, envelope.fixed_z)
    } else {
        (envelope.in_plane_z, envelope.fixed_z, envelope.in_plane_x, envelope.fixed_x)
    };

    let n = across as f64;
    let free = long_span - (n - 1.0) * gap - n * long_fixed;
    let mut scale = if long_base > 0.0 {
        (free / (n * long_base)).max(0.0)
    } else {
        1.0
    };
    if !config.allow_upscale {
        scale = scale.min(1.0);
    }
    let scale = scale.max(config.min_scale);

    let cell_short = short_base * scale + short_fixed + gap;
    let short_count = if cell_short > 0.0 {
        ((short_span / cell_short).floor() as u32).max(1)
    } else {
        1
    };

    if x_is_long {
        (scale, across, short_count)
    } else {
        (scale, short_count, across)
    }
}

/// Top-plane rectangle of the roof, shrunk by margins
fn usable_rect(roof: &RoofSurface<'_>, config: &LayoutConfig) -> Option<RoofRect> {
    let points: Vec<Point3<f64>> = roof
        .nodes
        .iter()
        .flat_map(|n| n.world_positions())
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        .collect();
    let bounds = BoundingRegion::from_points(points.iter().copied());
    if !bounds.is_valid() {
        return None;
    }
    let max_y = bounds.max.y;

    let mut top = top_band(&points, max_y, config.top_tolerance);
    if top.is_degenerate() {
        let fallback = config.top_tolerance_fallback_fraction * (max_y - bounds.min.y);
        top = top_band(&points, max_y, fallback);
    }
    if !top.is_valid() {
        return None;
    }

    let rect = RoofRect {
        min_x: top.min.x + config.margin_x,
        max_x: top.max.x - config.margin_x,
        min_z: top.min.z + config.margin_z,
        max_z: top.max.z - config.margin_z,
        top_y: max_y,
    };
    (rect.width() > 0.0 && rect.depth() > 0.0).then_some(rect)
}

fn top_band(points: &[Point3<f64>], max_y: f64, tolerance: f64) -> BoundingRegion {
    BoundingRegion::from_points(
        points
            .iter()
            .copied()
            .filter(|p| (p.y - max_y).abs() <= tolerance),
    )
}
