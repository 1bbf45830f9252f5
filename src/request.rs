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

//! The request/response shapes the engine's five entry points take and return. These are plain
//! data — the wire parser that produces them is out of scope for this crate.

use crate::metadata::Metadata;

/// A request to store a value under `key`, chunking it if necessary.
#[derive(Debug, Clone)]
pub struct SetRequest {
    /// The user key, 1-250 bytes.
    pub key: Vec<u8>,
    /// The opaque user-supplied flags, echoed verbatim on Get.
    pub flags: u32,
    /// The expiration time, in the backend's native units.
    pub exptime: u32,
    /// The byte count of the value that follows on the source reader.
    pub length: u32,
}

/// A request to fetch zero or more keys.
#[derive(Debug, Clone)]
pub struct GetRequest {
    /// The keys to fetch, in the order responses must preserve.
    pub keys: Vec<Vec<u8>>,
    /// Per-key opaque values to echo back in each response.
    pub opaques: Vec<u32>,
    /// Per-key quiet-mode flags, echoed back in each response.
    pub quiet: Vec<bool>,
}

/// A request to fetch a single key and extend its expiration atomically.
#[derive(Debug, Clone)]
pub struct GatRequest {
    /// The user key.
    pub key: Vec<u8>,
    /// The opaque value to echo back in the response.
    pub opaque: u32,
    /// The new expiration time.
    pub exptime: u32,
}

/// A request to remove a key.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    /// The user key.
    pub key: Vec<u8>,
}

/// A request to extend a key's expiration without fetching it.
#[derive(Debug, Clone)]
pub struct TouchRequest {
    /// The user key.
    pub key: Vec<u8>,
    /// The new expiration time.
    pub exptime: u32,
}

/// The response to a Get or GAT for a single key.
#[derive(Debug, Clone)]
pub struct GetResponse {
    /// Whether this is a miss. When `true`, `metadata` and `data` carry no meaning.
    pub miss: bool,
    /// The key this response is for.
    pub key: Vec<u8>,
    /// The opaque value from the corresponding request.
    pub opaque: u32,
    /// Whether the corresponding request asked for quiet-mode semantics.
    pub quiet: bool,
    /// The item's metadata record, when hit.
    pub metadata: Option<Metadata>,
    /// The assembled value, when hit.
    pub data: Option<Vec<u8>>,
}

impl GetResponse {
    /// Build a miss response for `key`, preserving its opaque and quiet flag.
    pub fn miss(key: Vec<u8>, opaque: u32, quiet: bool) -> Self {
        Self {
            miss: true,
            key,
            opaque,
            quiet,
            metadata: None,
            data: None,
        }
    }

    /// Build a hit response carrying the assembled `data` and its `metadata`.
    pub fn hit(key: Vec<u8>, opaque: u32, quiet: bool, metadata: Metadata, data: Vec<u8>) -> Self {
        Self {
            miss: false,
            key,
            opaque,
            quiet,
            metadata: Some(metadata),
            data: Some(data),
        }
    }
}
