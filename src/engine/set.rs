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

use crate::chunk_reader::ChunkLimitedReader;
use crate::config::TOKEN_SIZE;
use crate::error::Result;
use crate::key::{chunk_key, meta_key};
use crate::metadata::Metadata;
use crate::metrics::Counters;
use crate::proto;
use crate::request::SetRequest;
use crate::token::TokenSource;

use super::{drain_source, ChunkedEngine, OPAQUE};

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Store `req`'s value, read from `src`, chunking it into fixed slots.
    ///
    /// Metadata is written first, then chunks in index order. There is no cleanup of
    /// already-written chunks on a mid-write failure — a subsequent Set with a fresh token
    /// supersedes a torn item, and readers detect torn state via token mismatch.
    ///
    /// # Errors
    /// - `Error::Backend`: the backend rejected the metadata or a chunk write with a non-success
    ///   status other than `KeyNotFound`.
    /// - `Error::Protocol`: the backend's response was malformed.
    /// - `Error::Io`: a read or write failed on `src` or the backend connection.
    // TODO: clean up already-written chunks on a mid-write failure once the backend exposes a
    // cheap multi-delete; for now a superseding Set or a manual Delete is the only recovery.
    pub fn set(&mut self, req: SetRequest, src: &mut impl Read) -> Result<()> {
        tracing::trace!(key = %String::from_utf8_lossy(&req.key), length = req.length, "cmd_set");
        self.counters.incr("cmd_set");

        let token = self.tokens.next_token();
        let metadata = Metadata::new(req.length, req.flags, self.config.chunk_size, token);
        let meta_key = meta_key(&req.key);
        let meta_bytes = metadata.to_bytes();

        let request = proto::encode_set(&meta_key, req.flags, req.exptime, meta_bytes.len() as u32, OPAQUE);
        self.write_request(&request)?;
        self.write_request(&meta_bytes)?;

        let (header, result) = self.read_response_header()?;
        if let Err(err) = result {
            drain_source(src, req.length as u64)?;
            self.drain_backend(header.total_body_len)?;
            self.counters.incr("cmd_set_errors");
            return Err(err);
        }

        let mut reader = ChunkLimitedReader::new(src, self.config.chunk_size as u64, req.length as u64);
        let mut chunk_num = 0u32;

        while reader.more() {
            reader.next_chunk();

            let mut payload = vec![0u8; self.config.full_data_size() as usize];
            payload[..TOKEN_SIZE].copy_from_slice(&token);
            read_window(&mut reader, &mut payload[TOKEN_SIZE..TOKEN_SIZE + self.config.chunk_size as usize])?;

            let key = chunk_key(&req.key, chunk_num);
            let request = proto::encode_set(&key, req.flags, req.exptime, payload.len() as u32, OPAQUE);
            self.write_request(&request)?;
            self.write_request(&payload)?;

            let (header, result) = self.read_response_header()?;
            if let Err(err) = result {
                while reader.more() {
                    reader.next_chunk();
                    std::io::copy(&mut reader, &mut std::io::sink())?;
                }
                self.drain_backend(header.total_body_len)?;
                self.counters.incr("cmd_set_errors");
                return Err(err);
            }

            chunk_num += 1;
        }

        self.counters.incr("cmd_set_success");
        Ok(())
    }
}

/// Fill `buf` by repeatedly reading from `reader` until the current window is exhausted.
fn read_window(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(())
}
