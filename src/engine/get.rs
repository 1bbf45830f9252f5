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

use crate::error::Result;
use crate::metrics::Counters;
use crate::proto;
use crate::request::{GetRequest, GetResponse};
use crate::token::TokenSource;

use super::{ChunkedEngine, OPAQUE};

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Fetch every key in `req`, in order.
    ///
    /// The returned iterator issues one key's worth of backend round trips per call to `next`:
    /// nothing is fetched ahead of the caller asking for it, and a miss or an error on one key
    /// never stops the rest from being attempted.
    ///
    /// A missing key, a missing chunk, or a chunk whose token doesn't match the item's metadata
    /// is not an error — the corresponding yielded value is `Ok(GetResponse { miss: true, .. })`.
    ///
    /// # Errors
    /// Each value the returned iterator yields can independently be an `Err`:
    /// - `Error::Backend`: the backend returned a non-success status other than `KeyNotFound`
    ///   while fetching that key's metadata or a chunk.
    /// - `Error::Protocol`: the backend's response for that key was malformed.
    /// - `Error::Io`: a read or write failed on the backend connection, which also ends the
    ///   iterator early since the connection is presumed poisoned.
    pub fn get(&mut self, req: GetRequest) -> GetResults<'_, 'b, B, T, C> {
        GetResults {
            engine: self,
            req,
            index: 0,
        }
    }
}

/// The lazy, per-key result stream returned by [`ChunkedEngine::get`].
pub struct GetResults<'e, 'b, B, T, C> {
    engine: &'e mut ChunkedEngine<'b, B, T, C>,
    req: GetRequest,
    index: usize,
}

impl<'e, 'b, B, T, C> Iterator for GetResults<'e, 'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    type Item = Result<GetResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.req.keys.len() {
            return None;
        }

        let key = self.req.keys[self.index].clone();
        let opaque = self.req.opaques[self.index];
        let quiet = self.req.quiet[self.index];
        self.index += 1;

        tracing::trace!(key = %String::from_utf8_lossy(&key), "cmd_get");
        self.engine.counters.incr("cmd_get");
        match self.engine.fetch_assembled(&key, |k| proto::encode_get(k, OPAQUE)) {
            Ok((metadata, data)) => {
                self.engine.counters.incr("cmd_get_hits");
                Some(Ok(GetResponse::hit(key, opaque, quiet, metadata, data)))
            }
            Err(err) if err.is_miss() => {
                err.log_if_mismatch(&key);
                self.engine.counters.incr("cmd_get_misses");
                Some(Ok(GetResponse::miss(key, opaque, quiet)))
            }
            Err(err) => {
                self.engine.counters.incr("cmd_get_errors");
                Some(Err(err))
            }
        }
    }
}
