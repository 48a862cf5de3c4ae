// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-panel placement overrides and their source adapters
//!
//! Two payload shapes are accepted:
//!
//! - the calculation service response: `{ "solarPanels": [{ "azimuth", "slope" }] }`
//! - a persisted result: `{ "output": { "panels": { "<id>": { "azimuth", "slope", "kwp" } } } }`
//!
//! Both collapse into an ordered [`OverrideSet`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Desired orientation for one panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementOverride {
    /// Compass degrees, 0 = North, clockwise
    #[serde(rename = "azimuth")]
    pub azimuth_degrees: f64,
    /// Tilt from horizontal, 0 = flat, 90 = vertical
    #[serde(rename = "slope")]
    pub slope_degrees: f64,
    /// Peak power of this panel group, when the source reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwp: Option<f64>,
}

impl PlacementOverride {
    pub fn new(azimuth_degrees: f64, slope_degrees: f64) -> Self {
        Self {
            azimuth_degrees,
            slope_degrees,
            kwp: None,
        }
    }

    /// Both angles are finite numbers
    pub fn is_finite(&self) -> bool {
        self.azimuth_degrees.is_finite() && self.slope_degrees.is_finite()
    }
}

/// Ordered list of overrides consumed by the placement pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSet(Vec<PlacementOverride>);

impl OverrideSet {
    pub fn new(overrides: Vec<PlacementOverride>) -> Self {
        Self(overrides)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[PlacementOverride] {
        &self.0
    }

    /// Sum of reported kWp across entries (entries without kWp count as 0)
    pub fn total_kwp(&self) -> f64 {
        self.0.iter().filter_map(|o| o.kwp).sum()
    }

    /// Decode either payload shape.
    ///
    /// Entries with non-finite angles are dropped.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        let overrides = if value.get("solarPanels").is_some() {
            let response: CalculationResponse = serde_json::from_value(value.clone())?;
            response.solar_panels
        } else if value.get("output").is_some() {
            let persisted: PersistedResult = serde_json::from_value(value.clone())?;
            persisted.output.panels.into_ordered()
        } else if value.is_array() {
            serde_json::from_value(value.clone())?
        } else {
            return Err(Error::UnknownOverrideShape);
        };
        Ok(Self(overrides.into_iter().filter(|o| o.is_finite()).collect()))
    }

    /// Decode either payload shape from raw JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }
}

impl From<Vec<PlacementOverride>> for OverrideSet {
    fn from(overrides: Vec<PlacementOverride>) -> Self {
        Self(overrides)
    }
}

/// Calculation service response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResponse {
    #[serde(default)]
    pub solar_panels: Vec<PlacementOverride>,
    #[serde(default)]
    pub total_energy: Option<f64>,
    #[serde(default)]
    pub energy_from_grid: Option<f64>,
    #[serde(default)]
    pub pv_production: Option<f64>,
}

/// Persisted calculation result
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedResult {
    pub output: PersistedOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistedOutput {
    #[serde(default)]
    pub panels: PanelMap,
}

/// Panels keyed by id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PanelMap(HashMap<String, PlacementOverride>);

impl PanelMap {
    /// Order by numeric id when both ids are integers, lexically otherwise
    pub fn into_ordered(self) -> Vec<PlacementOverride> {
        let mut entries: Vec<(String, PlacementOverride)> = self.0.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| compare_ids(a, b));
        entries.into_iter().map(|(_, o)| o).collect()
    }
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculation_response_shape() {
        let json = r#"{
            "totalEnergy": 3000,
            "energyFromGrid": 1500,
            "pvProduction": 1000,
            "solarPanels": [
                {"azimuth": 5, "slope": 5},
                {"azimuth": 10, "slope": 10}
            ]
        }"#;
        let set = OverrideSet::from_json_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[1], PlacementOverride::new(10.0, 10.0));
    }

    #[test]
    fn test_persisted_shape_orders_numeric_ids() {
        let json = r#"{"output": {"panels": {
            "10": {"azimuth": 30, "slope": 3, "kwp": 1.5},
            "2": {"azimuth": 20, "slope": 2, "kwp": 2.0},
            "1": {"azimuth": 10, "slope": 1, "kwp": 0.5}
        }}}"#;
        let set = OverrideSet::from_json_str(json).unwrap();
        let azimuths: Vec<f64> = set.as_slice().iter().map(|o| o.azimuth_degrees).collect();
        assert_eq!(azimuths, vec![10.0, 20.0, 30.0]);
        assert!((set.total_kwp() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixed_ids_put_numbers_first() {
        assert_eq!(compare_ids("9", "a"), Ordering::Less);
        assert_eq!(compare_ids("b", "a"), Ordering::Greater);
        assert_eq!(compare_ids("2", "10"), Ordering::Less);
    }

    #[test]
    fn test_bare_array_shape() {
        let set = OverrideSet::from_json_str(r#"[{"azimuth": 180, "slope": 30}]"#).unwrap();
        assert_eq!(set.as_slice(), &[PlacementOverride::new(180.0, 30.0)]);
    }

    #[test]
    fn test_unknown_shape_is_an_error() {
        let err = OverrideSet::from_json_str(r#"{"panels": []}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownOverrideShape));
    }

    #[test]
    fn test_empty_persisted_panels() {
        let set = OverrideSet::from_json_str(r#"{"output": {}}"#).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.total_kwp(), 0.0);
    }
}
