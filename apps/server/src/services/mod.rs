// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Asset loading and override fetching.

pub mod assets;
pub mod overrides;

pub use assets::spawn_asset_load;
pub use overrides::{fetch_overrides, read_overrides_file, refresh_overrides};
