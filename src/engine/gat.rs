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
use crate::request::{GatRequest, GetResponse};
use crate::token::TokenSource;

use super::{ChunkedEngine, OPAQUE};

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Fetch `req`'s key and extend every piece's expiration to `req.exptime` in the same pass.
    ///
    /// Every chunk and the metadata record are touched via the backend's own GAT opcode rather
    /// than a separate Touch after assembly, so a reader never observes the metadata record's
    /// expiration extended without its chunks', or vice versa, any more than a plain Get would.
    ///
    /// A missing key or a token mismatch is not an error: it is reported as `Ok(GetResponse {
    /// miss: true, .. })`.
    ///
    /// # Errors
    /// - `Error::Backend`: the backend returned a non-success status other than `KeyNotFound`.
    /// - `Error::Protocol`: the backend's response was malformed.
    /// - `Error::Io`: a read or write failed on the backend connection.
    pub fn gat(&mut self, req: GatRequest) -> Result<GetResponse> {
        tracing::trace!(key = %String::from_utf8_lossy(&req.key), exptime = req.exptime, "cmd_gat");
        self.counters.incr("cmd_gat");

        let exptime = req.exptime;
        match self.fetch_assembled(&req.key, |k| proto::encode_gat(k, exptime, OPAQUE)) {
            Ok((metadata, data)) => {
                self.counters.incr("cmd_gat_hits");
                Ok(GetResponse::hit(req.key, req.opaque, false, metadata, data))
            }
            Err(err) if err.is_miss() => {
                err.log_if_mismatch(&req.key);
                self.counters.incr("cmd_gat_misses");
                Ok(GetResponse::miss(req.key, req.opaque, false))
            }
            Err(err) => {
                self.counters.incr("cmd_gat_errors");
                Err(err)
            }
        }
    }
}
