// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SolarPlan Geometry
//!
//! Placement geometry for rooftop solar layouts: roof detection on a building
//! scene, panel footprint measurement, grid fitting and per-panel orientation.
//!
//! ```no_run
//! use solarplan_core::load_scene;
//! use solarplan_geometry::{
//!     detect_roof, extract_footprint, plan_layout, resolve_orientation,
//!     FootprintConfig, LayoutConfig, RoofDetectorConfig,
//! };
//!
//! let building = load_scene("house.glb")?;
//! let panel = load_scene("panel.glb")?;
//!
//! let roof = detect_roof(&building, &RoofDetectorConfig::default());
//! if let Some(footprint) = extract_footprint(&panel, &FootprintConfig::default()) {
//!     let layout = plan_layout(&roof, &footprint, &LayoutConfig::default(), 0);
//!     for position in &layout.positions {
//!         let rotation = resolve_orientation(None, &footprint);
//!         println!("{position} {rotation}");
//!     }
//! }
//! # Ok::<(), solarplan_core::Error>(())
//! ```

pub mod error;
pub mod footprint;
pub mod layout;
pub mod orientation;
pub mod raycast;
pub mod roof;

pub use error::{Error, Result};
pub use footprint::{extract_footprint, FootprintConfig, PanelFootprint};
pub use layout::{plan_layout, plan_layout_for, CellEnvelope, Layout, LayoutConfig, RoofRect};
pub use orientation::{desired_normal, heading_vector, override_for, resolve_orientation};
pub use raycast::{SurfaceHit, SurfaceSampler};
pub use roof::{detect_roof, RoofDetectorConfig, RoofSelection, RoofSource, RoofSurface};
