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

//! The binary request/response framing codec for the memcached wire protocol. This is a pure
//! encoder/decoder layer; it owns no connection and does no I/O beyond the `Read` the caller
//! hands it for decoding a response header.

use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

mod header;

pub use header::{RequestHeader, ResponseHeader};

/// The request magic byte.
pub const REQUEST_MAGIC: u8 = 0x80;
/// The response magic byte.
pub const RESPONSE_MAGIC: u8 = 0x81;

/// The size in bytes of a request or response header.
pub const HEADER_SIZE: usize = 24;

/// Status `0x0000`: the request succeeded.
pub const STATUS_SUCCESS: u16 = 0x0000;
/// Status `0x0001`: the key was not present.
pub const STATUS_KEY_NOT_FOUND: u16 = 0x0001;

/// The opcodes this engine issues to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Fetch a value.
    Get = 0x00,
    /// Store a value.
    Set = 0x01,
    /// Remove a value.
    Delete = 0x04,
    /// Extend a value's expiration.
    Touch = 0x1C,
    /// Fetch a value and extend its expiration atomically.
    Gat = 0x1D,
}

/// Build the header+extras+key bytes for a Set request. The value itself is written separately
/// by the caller so a streamed source never has to be buffered whole.
pub fn encode_set(key: &[u8], flags: u32, exptime: u32, value_len: u32, opaque: u32) -> Bytes {
    let mut extras = BytesMut::with_capacity(8);
    extras.put_u32(flags);
    extras.put_u32(exptime);
    encode_request(Opcode::Set, key, &extras, value_len as usize, opaque)
}

/// Build the header+key bytes for a Get request.
pub fn encode_get(key: &[u8], opaque: u32) -> Bytes {
    encode_request(Opcode::Get, key, &[], 0, opaque)
}

/// Build the header+key bytes for a Get-and-touch request.
pub fn encode_gat(key: &[u8], exptime: u32, opaque: u32) -> Bytes {
    let mut extras = BytesMut::with_capacity(4);
    extras.put_u32(exptime);
    encode_request(Opcode::Gat, key, &extras, 0, opaque)
}

/// Build the header+key bytes for a Delete request.
pub fn encode_delete(key: &[u8], opaque: u32) -> Bytes {
    encode_request(Opcode::Delete, key, &[], 0, opaque)
}

/// Build the header+key bytes for a Touch request.
pub fn encode_touch(key: &[u8], exptime: u32, opaque: u32) -> Bytes {
    let mut extras = BytesMut::with_capacity(4);
    extras.put_u32(exptime);
    encode_request(Opcode::Touch, key, &extras, 0, opaque)
}

fn encode_request(
    opcode: Opcode,
    key: &[u8],
    extras: &[u8],
    value_len: usize,
    opaque: u32,
) -> Bytes {
    let total_body_len = (extras.len() + key.len() + value_len) as u32;
    let header = RequestHeader {
        opcode: opcode as u8,
        key_len: key.len() as u16,
        extras_len: extras.len() as u8,
        total_body_len,
        opaque,
        cas: 0,
    };

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + extras.len() + key.len());
    header.encode(&mut buf);
    buf.put_slice(extras);
    buf.put_slice(key);
    buf.freeze()
}

/// Read and decode one response header from `r`.
///
/// The decoder returns an error for any non-success status, but the header is returned
/// alongside it regardless, because the caller still needs `total_body_len` to drain the
/// response body even when the request failed.
pub fn decode_response_header(r: &mut impl Read) -> std::io::Result<(ResponseHeader, Result<()>)> {
    let mut buf = [0u8; HEADER_SIZE];
    r.read_exact(&mut buf)?;

    let header = match ResponseHeader::decode(&mut &buf[..]) {
        Ok(header) => header,
        Err(err) => {
            return Ok((ResponseHeader::default(), Err(err)));
        }
    };

    let result = classify_status(header.status);
    Ok((header, result))
}

fn classify_status(status: u16) -> Result<()> {
    match status {
        STATUS_SUCCESS => Ok(()),
        STATUS_KEY_NOT_FOUND => Err(Error::KeyNotFound),
        other => Err(Error::Backend { status: other }),
    }
}
