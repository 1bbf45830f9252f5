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

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

use super::{HEADER_SIZE, REQUEST_MAGIC, RESPONSE_MAGIC};

/// A 24-byte memcached binary protocol request header.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHeader {
    /// The command opcode.
    pub opcode: u8,
    /// The length in bytes of the key that follows the extras.
    pub key_len: u16,
    /// The length in bytes of the extras that follow this header.
    pub extras_len: u8,
    /// The total length in bytes of extras + key + value.
    pub total_body_len: u32,
    /// An opaque value echoed back unchanged in the response.
    pub opaque: u32,
    /// The CAS value for the operation; zero when unused.
    pub cas: u64,
}

impl RequestHeader {
    /// Append this header's 24-byte encoding to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(REQUEST_MAGIC);
        buf.put_u8(self.opcode);
        buf.put_u16(self.key_len);
        buf.put_u8(self.extras_len);
        buf.put_u8(0); // data type, always raw bytes
        buf.put_u16(0); // reserved / vbucket id, unused by this engine
        buf.put_u32(self.total_body_len);
        buf.put_u32(self.opaque);
        buf.put_u64(self.cas);
    }
}

/// A 24-byte memcached binary protocol response header.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseHeader {
    /// The command opcode this is a response to.
    pub opcode: u8,
    /// The length in bytes of the key in the body, if any.
    pub key_len: u16,
    /// The length in bytes of the extras in the body, if any.
    pub extras_len: u8,
    /// The data type field, unused by this engine.
    pub data_type: u8,
    /// The status code: `0x0000` is success.
    pub status: u16,
    /// The total length in bytes of extras + key + value in the body.
    pub total_body_len: u32,
    /// The opaque value echoed back from the request.
    pub opaque: u32,
    /// The CAS value assigned or observed by the backend.
    pub cas: u64,
}

impl ResponseHeader {
    /// Append this header's 24-byte encoding to `buf`. Used only by tests to build fixtures;
    /// production code only ever decodes response headers, never encodes them.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(RESPONSE_MAGIC);
        buf.put_u8(self.opcode);
        buf.put_u16(self.key_len);
        buf.put_u8(self.extras_len);
        buf.put_u8(self.data_type);
        buf.put_u16(self.status);
        buf.put_u32(self.total_body_len);
        buf.put_u32(self.opaque);
        buf.put_u64(self.cas);
    }

    /// Decode a response header from exactly `HEADER_SIZE` bytes.
    pub fn decode(data: &mut &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Protocol(format!(
                "short response header: {} bytes",
                data.len()
            )));
        }

        let magic = data.get_u8();
        if magic != RESPONSE_MAGIC {
            return Err(Error::Protocol(format!("bad response magic {:#04x}", magic)));
        }

        let opcode = data.get_u8();
        let key_len = data.get_u16();
        let extras_len = data.get_u8();
        let data_type = data.get_u8();
        let status = data.get_u16();
        let total_body_len = data.get_u32();
        let opaque = data.get_u32();
        let cas = data.get_u64();

        Ok(Self {
            opcode,
            key_len,
            extras_len,
            data_type,
            status,
            total_body_len,
            opaque,
            cas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let header = ResponseHeader {
            opcode: 0x01,
            key_len: 3,
            extras_len: 0,
            data_type: 0,
            status: 0,
            total_body_len: 10,
            opaque: 99,
            cas: 12345,
        };
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let decoded = ResponseHeader::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded.opcode, header.opcode);
        assert_eq!(decoded.total_body_len, header.total_body_len);
        assert_eq!(decoded.opaque, header.opaque);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x00);
        buf.put_bytes(0, HEADER_SIZE - 1);
        assert!(ResponseHeader::decode(&mut &buf[..]).is_err());
    }
}
