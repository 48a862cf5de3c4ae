// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene composition.
//!
//! [`SceneComposer`] holds the three inputs of a layout (building, panel
//! asset, overrides) and recomputes the panel instances whenever one of them
//! changes. Asynchronous loads are ticketed: only the most recent load of a
//! slot may complete it, so a slow early load can never overwrite a newer
//! result. While any load is outstanding the composer reports itself as
//! loading, until the load completes or the loading timeout passes.

use crate::cache::FootprintCache;
use crate::config::PipelineConfig;
use crate::pipeline::{compute_layout, LayoutInputs};
use crate::types::{LayoutOutcome, LayoutResult};
use solarplan_core::{OverrideSet, SceneAsset};
use solarplan_geometry::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Input slots of the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Building,
    Panel,
    Overrides,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::Building => 0,
            Slot::Panel => 1,
            Slot::Overrides => 2,
        }
    }
}

/// Handle for one in-flight load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    slot: Slot,
    id: u64,
}

impl LoadTicket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    id: u64,
    started: Instant,
}

/// Snapshot of everything a renderer needs
#[derive(Debug, Clone)]
pub struct ComposedScene {
    pub building: Option<Arc<SceneAsset>>,
    pub panel: Option<Arc<SceneAsset>>,
    pub layout: Arc<LayoutResult>,
}

type LoadingCallback = Box<dyn FnMut(bool) + Send>;

/// Owner of the layout inputs and the current layout
pub struct SceneComposer {
    config: PipelineConfig,
    building: Option<Arc<SceneAsset>>,
    panel: Option<Arc<SceneAsset>>,
    overrides: OverrideSet,
    footprints: FootprintCache,
    layout: Arc<LayoutResult>,
    next_ticket: u64,
    pending: [Option<PendingLoad>; 3],
    loading: bool,
    on_loading_change: Option<LoadingCallback>,
}

impl fmt::Debug for SceneComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneComposer")
            .field("building", &self.building.as_ref().map(|b| b.id.clone()))
            .field("panel", &self.panel.as_ref().map(|p| p.id.clone()))
            .field("overrides", &self.overrides.len())
            .field("panels", &self.layout.len())
            .field("loading", &self.loading)
            .finish()
    }
}

impl SceneComposer {
    /// Create an empty composer. Fails when `config` does not validate.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            building: None,
            panel: None,
            overrides: OverrideSet::empty(),
            footprints: FootprintCache::new(),
            layout: Arc::new(LayoutResult::empty(LayoutOutcome::NoBuilding)),
            next_ticket: 0,
            pending: [None; 3],
            loading: false,
            on_loading_change: None,
        })
    }

    /// Register the host callback fired on every loading transition
    pub fn on_loading_change<F>(&mut self, callback: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.on_loading_change = Some(Box::new(callback));
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replace the configuration and recompute. An invalid configuration is
    /// rejected and the current one kept.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.recompute();
        Ok(())
    }

    /// Current layout; replaced wholesale on every recomputation
    pub fn layout(&self) -> Arc<LayoutResult> {
        Arc::clone(&self.layout)
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    pub fn scene(&self) -> ComposedScene {
        ComposedScene {
            building: self.building.clone(),
            panel: self.panel.clone(),
            layout: self.layout(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a load for `slot`, superseding any load already in flight there
    pub fn begin_load(&mut self, slot: Slot, now: Instant) -> LoadTicket {
        self.next_ticket += 1;
        let id = self.next_ticket;
        self.pending[slot.index()] = Some(PendingLoad { id, started: now });
        tracing::debug!(?slot, ticket = id, "Load started");
        self.refresh_loading(now);
        LoadTicket { slot, id }
    }

    pub fn begin_building_load(&mut self, now: Instant) -> LoadTicket {
        self.begin_load(Slot::Building, now)
    }

    pub fn begin_panel_load(&mut self, now: Instant) -> LoadTicket {
        self.begin_load(Slot::Panel, now)
    }

    pub fn begin_overrides_load(&mut self, now: Instant) -> LoadTicket {
        self.begin_load(Slot::Overrides, now)
    }

    /// Finish a building load. `None` records a failed load and empties the slot.
    ///
    /// Returns `false` when the ticket was superseded and the result dropped.
    pub fn complete_building(
        &mut self,
        ticket: LoadTicket,
        asset: Option<SceneAsset>,
        now: Instant,
    ) -> bool {
        if !self.accept(ticket, Slot::Building, now) {
            return false;
        }
        self.building = asset.map(Arc::new);
        self.recompute();
        true
    }

    /// Finish a panel asset load. `None` records a failed load and empties the slot.
    pub fn complete_panel(
        &mut self,
        ticket: LoadTicket,
        asset: Option<SceneAsset>,
        now: Instant,
    ) -> bool {
        if !self.accept(ticket, Slot::Panel, now) {
            return false;
        }
        self.panel = asset.map(Arc::new);
        self.recompute();
        true
    }

    /// Finish an override fetch
    pub fn complete_overrides(
        &mut self,
        ticket: LoadTicket,
        overrides: OverrideSet,
        now: Instant,
    ) -> bool {
        if !self.accept(ticket, Slot::Overrides, now) {
            return false;
        }
        self.overrides = overrides;
        self.recompute();
        true
    }

    /// Set the building directly, superseding any load in flight
    pub fn set_building(&mut self, asset: SceneAsset, now: Instant) {
        self.supersede(Slot::Building, now);
        self.building = Some(Arc::new(asset));
        self.recompute();
    }

    /// Set the panel asset directly, superseding any load in flight
    pub fn set_panel(&mut self, asset: SceneAsset, now: Instant) {
        self.supersede(Slot::Panel, now);
        self.panel = Some(Arc::new(asset));
        self.recompute();
    }

    /// Replace the overrides directly, superseding any fetch in flight
    pub fn set_overrides(&mut self, overrides: OverrideSet, now: Instant) {
        self.supersede(Slot::Overrides, now);
        self.overrides = overrides;
        self.recompute();
    }

    /// Re-evaluate the loading signal against the timeout
    pub fn poll(&mut self, now: Instant) -> bool {
        self.refresh_loading(now);
        self.loading
    }

    fn supersede(&mut self, slot: Slot, now: Instant) {
        if self.pending[slot.index()].take().is_some() {
            tracing::debug!(?slot, "In-flight load superseded by direct update");
        }
        self.refresh_loading(now);
    }

    fn accept(&mut self, ticket: LoadTicket, slot: Slot, now: Instant) -> bool {
        let current = self.pending[slot.index()];
        let accepted = ticket.slot == slot && current.is_some_and(|p| p.id == ticket.id);
        if accepted {
            self.pending[slot.index()] = None;
        } else {
            tracing::debug!(?slot, ticket = ticket.id, "Dropping superseded load");
        }
        self.refresh_loading(now);
        accepted
    }

    fn refresh_loading(&mut self, now: Instant) {
        let timeout = self.config.loading_timeout();
        let loading = self
            .pending
            .iter()
            .flatten()
            .any(|p| now.saturating_duration_since(p.started) < timeout);
        if loading != self.loading {
            self.loading = loading;
            tracing::debug!(loading, "Loading state changed");
            if let Some(callback) = self.on_loading_change.as_mut() {
                callback(loading);
            }
        }
    }

    fn recompute(&mut self) {
        let footprint = match &self.panel {
            Some(panel) => self.footprints.get_or_extract(panel, &self.config.footprint),
            None => None,
        };
        let result = compute_layout(&LayoutInputs {
            building: self.building.as_deref(),
            footprint: footprint.as_ref(),
            overrides: self.overrides.as_slice(),
            config: &self.config,
        });
        if let Some(message) = result.message {
            tracing::info!(outcome = ?result.outcome, reason = message, "Layout is empty");
        }
        self.layout = Arc::new(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarplan_core::{AssetId, Mesh, MeshNode, PlacementOverride, Point3, Vector3};
    use std::sync::Mutex;
    use std::time::Duration;

    fn box_asset(id: &str, name: &str, size: (f64, f64, f64), y0: f64) -> SceneAsset {
        let (sx, sy, sz) = size;
        let mut mesh = Mesh::new();
        // top face only, enough for roof and footprint measurement
        for (x, z) in [(0.0, 0.0), (sx, 0.0), (sx, sz), (0.0, sz)] {
            mesh.add_vertex(Point3::new(x, y0 + sy, z), Vector3::y());
        }
        mesh.add_vertex(Point3::new(0.0, y0, 0.0), Vector3::y());
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 3, 2);
        SceneAsset::new(AssetId::named(id), vec![MeshNode::new(name, mesh)])
    }

    fn house() -> SceneAsset {
        box_asset("house", "Roof", (20.0, 0.2, 10.0), 5.0)
    }

    fn panel() -> SceneAsset {
        box_asset("panel", "SolarPanel", (1.0, 0.04, 1.0), 0.0)
    }

    #[test]
    fn test_layout_follows_inputs() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        assert_eq!(composer.layout().outcome, LayoutOutcome::NoBuilding);

        composer.set_building(house(), now);
        assert_eq!(composer.layout().outcome, LayoutOutcome::NoPanelAsset);

        composer.set_panel(panel(), now);
        assert_eq!(composer.layout().outcome, LayoutOutcome::Placed);
        assert_eq!(composer.layout().len(), 50);

        composer.set_overrides(OverrideSet::new(vec![PlacementOverride::new(180.0, 20.0); 3]), now);
        assert_eq!(composer.layout().len(), 3);

        let scene = composer.scene();
        assert!(scene.building.is_some() && scene.panel.is_some());
        assert_eq!(scene.layout.len(), 3);
    }

    #[test]
    fn test_layout_is_replaced_not_mutated() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        composer.set_building(house(), now);
        composer.set_panel(panel(), now);
        let before = composer.layout();
        composer.set_overrides(OverrideSet::new(vec![PlacementOverride::new(0.0, 0.0)]), now);
        assert_eq!(before.len(), 50);
        assert_eq!(composer.layout().len(), 1);
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        composer.set_panel(panel(), now);

        let first = composer.begin_building_load(now);
        let second = composer.begin_building_load(now);
        assert!(composer.complete_building(second, Some(house()), now));
        let late = box_asset("shed", "Roof", (2.0, 0.1, 2.0), 0.0);
        assert!(!composer.complete_building(first, Some(late), now));

        let scene = composer.scene();
        assert_eq!(scene.building.unwrap().id, AssetId::named("house"));
    }

    #[test]
    fn test_direct_set_supersedes_fetch() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        let fetch = composer.begin_overrides_load(now);
        composer.set_overrides(OverrideSet::new(vec![PlacementOverride::new(90.0, 10.0)]), now);
        assert!(!composer.complete_overrides(fetch, OverrideSet::empty(), now));
        assert_eq!(composer.overrides().len(), 1);
    }

    #[test]
    fn test_ticket_for_other_slot_is_rejected() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        let ticket = composer.begin_panel_load(now);
        assert!(!composer.complete_building(ticket, Some(house()), now));
        assert!(composer.is_loading());
    }

    #[test]
    fn test_failed_load_empties_slot() {
        let now = Instant::now();
        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        composer.set_building(house(), now);
        let ticket = composer.begin_building_load(now);
        assert!(composer.complete_building(ticket, None, now));
        assert!(composer.scene().building.is_none());
        assert_eq!(composer.layout().outcome, LayoutOutcome::NoBuilding);
    }

    #[test]
    fn test_loading_signal_transitions() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let start = Instant::now();

        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        composer.on_loading_change(move |loading| sink.lock().unwrap().push(loading));

        let building = composer.begin_building_load(start);
        let panel_load = composer.begin_panel_load(start);
        assert!(composer.is_loading());
        composer.complete_building(building, Some(house()), start);
        assert!(composer.is_loading());
        composer.complete_panel(panel_load, Some(panel()), start);
        assert!(!composer.is_loading());

        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_loading_signal_times_out() {
        let start = Instant::now();
        let config = PipelineConfig {
            loading_timeout_ms: 100,
            ..Default::default()
        };
        let mut composer = SceneComposer::new(config).unwrap();
        let ticket = composer.begin_building_load(start);
        assert!(composer.poll(start + Duration::from_millis(50)));
        assert!(!composer.poll(start + Duration::from_millis(150)));

        // A load that outlives the timeout still lands
        assert!(composer.complete_building(ticket, Some(house()), start + Duration::from_millis(200)));
        assert!(composer.scene().building.is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.layout.min_scale = 0.0;
        assert!(SceneComposer::new(config.clone()).is_err());

        let mut composer = SceneComposer::new(PipelineConfig::default()).unwrap();
        composer.set_building(house(), Instant::now());
        composer.set_panel(panel(), Instant::now());
        assert!(composer.set_config(config).is_err());
        assert_eq!(composer.config().layout.min_scale, 0.001);
        assert_eq!(composer.layout().len(), 50);

        let mut footprint_config = PipelineConfig::default();
        footprint_config.footprint.canonical_size = -1.0;
        assert!(composer.set_config(footprint_config).is_err());
    }
}
