// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading assets or decoding override payloads
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Asset has no scene")]
    NoScene,

    #[error("Malformed primitive in mesh '{mesh}': {reason}")]
    MalformedPrimitive { mesh: String, reason: String },

    #[error("Override payload error: {0}")]
    OverridePayload(#[from] serde_json::Error),

    #[error("Unrecognized override payload shape")]
    UnknownOverrideShape,
}
