/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::{Deserialize, Serialize};

/// The size of a token in bytes.
pub const TOKEN_SIZE: usize = 16;

/// The size of a full chunk slot in the backend, including the token prefix.
pub const FULL_DATA_SIZE: usize = 1024;

/// The default chunk window size, leaving room for the token prefix.
///
/// Keep in sync with `FULL_DATA_SIZE` and `TOKEN_SIZE`: `CHUNK_SIZE = FULL_DATA_SIZE -
/// TOKEN_SIZE`. Changing this is a breaking data format change for any backend already
/// populated by this engine.
pub const CHUNK_SIZE: u32 = (FULL_DATA_SIZE - TOKEN_SIZE) as u32;

/// Configuration for a `ChunkedEngine`.
///
/// The wire format constants (`CHUNK_SIZE`, `FULL_DATA_SIZE`, `TOKEN_SIZE`) default to the
/// values in the data model, but `chunk_size` is constructible with a smaller value for tests
/// that want to exercise multi-chunk behavior without allocating megabytes of fixture data.
/// Readers never assume a compile-time constant for an item already on the backend — every Get
/// and GAT uses the `chunkSize` recorded in that item's metadata, not this config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The chunk window used when writing new items.
    pub chunk_size: u32,
}

impl EngineConfig {
    /// The full size of a chunk slot in the backend for this config.
    pub fn full_data_size(&self) -> u32 {
        self.chunk_size + TOKEN_SIZE as u32
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }
}
