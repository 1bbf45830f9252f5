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

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::key::{chunk_key, meta_key};
use crate::metrics::Counters;
use crate::proto;
use crate::request::TouchRequest;
use crate::token::TokenSource;

use super::{ChunkedEngine, OPAQUE};

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Extend the expiration of `req`'s key without fetching it.
    ///
    /// Chunks are touched before the metadata record — the opposite order from Delete. A reader
    /// racing this Touch that sees the metadata record's old expiration still has every chunk
    /// available under the new one; there is no window where the metadata record outlives a
    /// chunk it depends on.
    ///
    /// # Errors
    /// - `Error::Miss`: the key's metadata record was absent.
    /// - `Error::Backend`: the backend returned a non-success status other than `KeyNotFound`.
    /// - `Error::Protocol`: the backend's response was malformed.
    /// - `Error::Io`: a read or write failed on the backend connection.
    pub fn touch(&mut self, req: TouchRequest) -> Result<()> {
        tracing::trace!(key = %String::from_utf8_lossy(&req.key), exptime = req.exptime, "cmd_touch");
        self.counters.incr("cmd_touch");

        let meta_key_bytes = meta_key(&req.key);
        let metadata = match self.fetch_metadata(&meta_key_bytes) {
            Ok(metadata) => metadata,
            Err(err) if err.is_miss() => {
                self.counters.incr("cmd_touch_misses");
                return Err(Error::Miss);
            }
            Err(err) => {
                self.counters.incr("cmd_touch_errors");
                return Err(err);
            }
        };

        for index in 0..metadata.num_chunks {
            let key = chunk_key(&req.key, index);
            if let Err(err) = self.fetch_body(proto::encode_touch(&key, req.exptime, OPAQUE)) {
                self.counters.incr("cmd_touch_errors");
                return Err(err);
            }
        }

        if let Err(err) = self.fetch_body(proto::encode_touch(&meta_key_bytes, req.exptime, OPAQUE)) {
            self.counters.incr("cmd_touch_errors");
            return Err(err);
        }

        self.counters.incr("cmd_touch_success");
        Ok(())
    }
}
