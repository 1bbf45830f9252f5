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

//! The chunked-item engine: the five state machines (Set, Get, Gat, Delete, Touch) that compose
//! the framing codec, chunk-limited reader, token source, and key derivation into transparent
//! value chunking.

use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::config::{EngineConfig, TOKEN_SIZE};
use crate::error::{Error, Result};
use crate::key::{chunk_key, meta_key};
use crate::metadata::Metadata;
use crate::metrics::Counters;
use crate::proto::{self, ResponseHeader};
use crate::token::TokenSource;

mod delete;
mod gat;
mod get;
mod set;
mod touch;

pub use get::GetResults;

/// The opaque value the engine uses for every request it issues to the backend.
///
/// Because the engine serializes one request/response round trip at a time on its backend
/// connection, there is never more than one outstanding request to disambiguate.
const OPAQUE: u32 = 0;

/// The chunked-item engine.
///
/// Generic over the backend connection (`B: Read + Write`, a paired request/response
/// byte stream), the token source, and the counters sink, so callers can plug in a real TCP
/// connection, a mock for tests, a CSPRNG or counting token source, and wherever their metrics
/// actually live.
pub struct ChunkedEngine<'b, B, T, C = crate::metrics::NullCounters> {
    backend: &'b mut B,
    config: EngineConfig,
    tokens: T,
    counters: C,
}

impl<'b, B, T, C> ChunkedEngine<'b, B, T, C>
where
    B: Read + Write,
    T: TokenSource,
    C: Counters,
{
    /// Create a new engine over `backend` using `config`, `tokens`, and `counters`.
    pub fn new(backend: &'b mut B, config: EngineConfig, tokens: T, counters: C) -> Self {
        Self {
            backend,
            config,
            tokens,
            counters,
        }
    }

    fn write_request(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.backend.write_all(bytes)
    }

    fn read_response_header(&mut self) -> io::Result<(ResponseHeader, Result<()>)> {
        proto::decode_response_header(&mut self.backend)
    }

    /// Read and discard exactly `len` bytes from the backend connection.
    fn drain_backend(&mut self, len: u32) -> io::Result<()> {
        io::copy(&mut (&mut self.backend).take(len as u64), &mut io::sink())?;
        Ok(())
    }

    /// Issue one request and return its value body (extras stripped, key absent from every
    /// response this engine sends). Shared by Get, Gat, Delete, and Touch: they differ only in
    /// which opcode they encode and in what they do with the body once they have it.
    fn fetch_body(&mut self, request: Bytes) -> Result<Vec<u8>> {
        self.write_request(&request)?;
        let (header, result) = self.read_response_header()?;
        if let Err(err) = result {
            self.drain_backend(header.total_body_len)?;
            return Err(err);
        }

        let mut body = vec![0u8; header.total_body_len as usize];
        self.backend.read_exact(&mut body)?;
        Ok(body[header.extras_len as usize..].to_vec())
    }

    /// Fetch and reassemble the item stored under `key`, using `encode` to build the per-subkey
    /// request (a plain Get for Get, a Gat for GAT — the two fetch paths share everything past
    /// framing).
    ///
    /// A chunk whose token prefix doesn't match the metadata's token is a torn item: treated
    /// identically to a miss, never assembled and returned.
    fn fetch_assembled(
        &mut self,
        key: &[u8],
        mut encode: impl FnMut(&[u8]) -> Bytes,
    ) -> Result<(Metadata, Vec<u8>)> {
        let meta_body = self.fetch_body(encode(&meta_key(key)))?;
        let metadata = Metadata::from_bytes(&meta_body)?;

        let mut data = Vec::with_capacity(metadata.length as usize);
        for index in 0..metadata.num_chunks {
            let chunk_body = self.fetch_body(encode(&chunk_key(key, index)))?;
            if chunk_body.len() < TOKEN_SIZE {
                return Err(Error::Protocol(format!(
                    "chunk {} of {:?} was {} bytes, too short for a token prefix",
                    index,
                    String::from_utf8_lossy(key),
                    chunk_body.len()
                )));
            }
            if chunk_body[..TOKEN_SIZE] != metadata.token {
                return Err(Error::TokenMismatch);
            }

            let len = metadata.chunk_len(index) as usize;
            data.extend_from_slice(&chunk_body[TOKEN_SIZE..TOKEN_SIZE + len]);
        }

        Ok((metadata, data))
    }

    /// Fetch and parse the metadata record at `meta_key_bytes`, without touching any chunk.
    /// Shared by Delete and Touch, which both need `num_chunks` before they can act on the rest
    /// of the item but fetch via a plain Get rather than `fetch_assembled`'s GAT path.
    fn fetch_metadata(&mut self, meta_key_bytes: &[u8]) -> Result<Metadata> {
        let body = self.fetch_body(proto::encode_get(meta_key_bytes, OPAQUE))?;
        Metadata::from_bytes(&body)
    }
}

/// Read and discard exactly `len` bytes from an arbitrary source, used to keep a streamed Set
/// source framed after a mid-write failure.
fn drain_source(src: &mut impl Read, len: u64) -> io::Result<()> {
    io::copy(&mut src.take(len), &mut io::sink())?;
    Ok(())
}

impl Error {
    fn log_if_mismatch(&self, key: &[u8]) {
        if matches!(self, Error::TokenMismatch) {
            tracing::warn!(key = %String::from_utf8_lossy(key), "chunk token mismatch, treating as miss");
        }
    }
}
