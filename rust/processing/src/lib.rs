// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layout pipeline and scene composition shared by hosts.
//!
//! [`compute_layout`] turns a building, a measured panel and an override list
//! into panel instances. [`SceneComposer`] keeps those inputs, reruns the
//! pipeline when one changes and tracks outstanding loads.

pub mod cache;
pub mod composer;
pub mod config;
pub mod pipeline;
pub mod types;

pub use cache::FootprintCache;
pub use composer::{ComposedScene, LoadTicket, SceneComposer, Slot};
pub use config::PipelineConfig;
pub use pipeline::{compute_layout, LayoutInputs};
pub use types::{LayoutOutcome, LayoutResult, LayoutStats, PlacedPanel};
