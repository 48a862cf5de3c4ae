// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panel orientation from azimuth/slope overrides
//!
//! Conventions used throughout:
//!
//! - World up is +Y. North is -Z, East is +X.
//! - Azimuth is a compass bearing in degrees: 0 = North, 90 = East,
//!   180 = South, 270 = West (clockwise seen from above).
//! - Slope is the tilt of the panel face from horizontal in degrees:
//!   0 = flat, 90 = vertical. The face tilts towards the azimuth.
//!
//! The resolved rotation carries the footprint's local normal axis onto the
//! desired face normal and its local heading axis onto the down-slope
//! direction, so panels keep a consistent roll.

use crate::footprint::PanelFootprint;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use solarplan_core::PlacementOverride;

/// Projections shorter than this are treated as degenerate
const DEGENERATE_LENGTH: f64 = 1e-6;

/// Horizontal unit vector pointing along a compass bearing
pub fn heading_vector(azimuth_degrees: f64) -> Vector3<f64> {
    let a = azimuth_degrees.to_radians();
    Vector3::new(a.sin(), 0.0, -a.cos())
}

/// Face normal for an override, never pointing below the horizon
pub fn desired_normal(placement: &PlacementOverride) -> Vector3<f64> {
    let heading = heading_vector(placement.azimuth_degrees);
    let slope = placement.slope_degrees.to_radians();
    let normal = Vector3::y() * slope.cos() + heading * slope.sin();
    let normal = normal.try_normalize(DEGENERATE_LENGTH).unwrap_or_else(Vector3::y);
    if normal.y < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Override for grid cell `index`, reusing the list cyclically
pub fn override_for(index: usize, overrides: &[PlacementOverride]) -> Option<&PlacementOverride> {
    if overrides.is_empty() {
        None
    } else {
        overrides.get(index % overrides.len())
    }
}

/// Rotation for one panel.
///
/// Without an override (or with a non-finite one) the panel lies flat with
/// its heading towards North.
pub fn resolve_orientation(
    placement: Option<&PlacementOverride>,
    footprint: &PanelFootprint,
) -> UnitQuaternion<f64> {
    let (normal, heading) = match placement.filter(|p| p.is_finite()) {
        Some(p) => (desired_normal(p), heading_vector(p.azimuth_degrees)),
        None => (Vector3::y(), -Vector3::z()),
    };

    let tangent = project_onto_plane(&heading, &normal)
        .or_else(|| project_onto_plane(&-Vector3::y(), &normal))
        .or_else(|| project_onto_plane(&Vector3::z(), &normal))
        .unwrap_or_else(|| any_perpendicular(&normal));

    frame_rotation(
        &footprint.normal_axis,
        &footprint.in_plane_axis,
        &normal,
        &tangent,
    )
}

/// Component of `v` perpendicular to unit `normal`, normalized
fn project_onto_plane(v: &Vector3<f64>, normal: &Vector3<f64>) -> Option<Vector3<f64>> {
    (v - normal * v.dot(normal)).try_normalize(DEGENERATE_LENGTH)
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let seed = if v.x.abs() < 0.9 { Vector3::x() } else { Vector3::z() };
    v.cross(&seed).normalize()
}

/// Right-handed orthonormal frame (n, t, n × t) with `t` made perpendicular to `n`
fn frame(n: &Vector3<f64>, t: &Vector3<f64>) -> Matrix3<f64> {
    let n = n.try_normalize(DEGENERATE_LENGTH).unwrap_or_else(Vector3::y);
    let t = project_onto_plane(t, &n).unwrap_or_else(|| any_perpendicular(&n));
    let b = n.cross(&t);
    Matrix3::from_columns(&[n, t, b])
}

/// Rotation taking the local (normal, heading) pair onto the world pair
fn frame_rotation(
    local_normal: &Vector3<f64>,
    local_heading: &Vector3<f64>,
    world_normal: &Vector3<f64>,
    world_heading: &Vector3<f64>,
) -> UnitQuaternion<f64> {
    let local = frame(local_normal, local_heading);
    let world = frame(world_normal, world_heading);
    let rotation = Rotation3::from_matrix_unchecked(world * local.transpose());
    UnitQuaternion::from_rotation_matrix(&rotation)
}
