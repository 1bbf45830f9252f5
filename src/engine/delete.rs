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
use crate::request::DeleteRequest;
use crate::token::TokenSource;

use super::{ChunkedEngine, OPAQUE};

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Remove `req`'s key and every chunk it was split into.
    ///
    /// The metadata record is deleted before any chunk. A reader that races this Delete sees
    /// either the whole item or, the instant the metadata record is gone, a miss — never a
    /// partially deleted item reassembled from leftover chunks. Chunk deletes after that point
    /// are best-effort cleanup: a chunk that's already gone is not an error, since the item it
    /// belonged to is already unreachable either way.
    ///
    /// # Errors
    /// - `Error::Miss`: the key's metadata record was already absent. A second `delete` of the
    ///   same key therefore reports a miss rather than succeeding or erroring.
    /// - `Error::Backend`: the backend returned a non-success status other than `KeyNotFound`.
    /// - `Error::Protocol`: the backend's response was malformed.
    /// - `Error::Io`: a read or write failed on the backend connection.
    pub fn delete(&mut self, req: DeleteRequest) -> Result<()> {
        tracing::trace!(key = %String::from_utf8_lossy(&req.key), "cmd_delete");
        self.counters.incr("cmd_delete");

        let meta_key_bytes = meta_key(&req.key);
        let metadata = match self.fetch_metadata(&meta_key_bytes) {
            Ok(metadata) => metadata,
            Err(err) if err.is_miss() => {
                self.counters.incr("cmd_delete_misses");
                return Err(Error::Miss);
            }
            Err(err) => {
                self.counters.incr("cmd_delete_errors");
                return Err(err);
            }
        };

        if let Err(err) = self.fetch_body(proto::encode_delete(&meta_key_bytes, OPAQUE)) {
            self.counters.incr("cmd_delete_errors");
            return Err(err);
        }

        for index in 0..metadata.num_chunks {
            let key = chunk_key(&req.key, index);
            if let Err(err) = self.fetch_body(proto::encode_delete(&key, OPAQUE)) {
                if !err.is_miss() {
                    self.counters.incr("cmd_delete_errors");
                    return Err(err);
                }
            }
        }

        self.counters.incr("cmd_delete_success");
        Ok(())
    }
}
