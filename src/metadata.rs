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

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::token::Token;

/// The size in bytes of a serialized `Metadata` record: four big-endian `u32` fields followed
/// by a 16-byte token.
pub const METADATA_SIZE: usize = 4 * 4 + 16;

/// The fixed-size record describing one logical item: its length, original flags, chunk count,
/// the chunk size used when it was written, and its identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Byte count of the original value.
    pub length: u32,
    /// The user-supplied flags, preserved verbatim for echoing on Get.
    pub orig_flags: u32,
    /// `ceil(length / chunk_size)`; zero for a zero-length item.
    pub num_chunks: u32,
    /// The chunk window used when the item was written.
    pub chunk_size: u32,
    /// The per-item identity tag shared by every one of this item's chunks.
    pub token: Token,
}

impl Metadata {
    /// Build a new metadata record, computing `num_chunks` from `length` and `chunk_size`.
    pub fn new(length: u32, orig_flags: u32, chunk_size: u32, token: Token) -> Self {
        let num_chunks = if length == 0 {
            0
        } else {
            (length + chunk_size - 1) / chunk_size
        };

        Self {
            length,
            orig_flags,
            num_chunks,
            chunk_size,
            token,
        }
    }

    /// The useful (non-padding) byte length of chunk `index`.
    ///
    /// Preceding chunks all carry exactly `chunk_size` useful bytes; the last chunk carries
    /// `length - (num_chunks - 1) * chunk_size`.
    pub fn chunk_len(&self, index: u32) -> u32 {
        debug_assert!(index < self.num_chunks);
        if index + 1 == self.num_chunks {
            self.length - (self.num_chunks - 1) * self.chunk_size
        } else {
            self.chunk_size
        }
    }

    /// Serialize this record to its fixed-size big-endian wire form.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(METADATA_SIZE);
        buf.put_u32(self.length);
        buf.put_u32(self.orig_flags);
        buf.put_u32(self.num_chunks);
        buf.put_u32(self.chunk_size);
        buf.put_slice(&self.token);
        buf.freeze()
    }

    /// Parse a metadata record from its fixed-size big-endian wire form.
    pub fn from_bytes(mut data: &[u8]) -> Result<Self> {
        if data.len() != METADATA_SIZE {
            return Err(Error::Protocol(format!(
                "metadata record was {} bytes, expected {}",
                data.len(),
                METADATA_SIZE
            )));
        }

        let length = data.get_u32();
        let orig_flags = data.get_u32();
        let num_chunks = data.get_u32();
        let chunk_size = data.get_u32();
        let mut token = [0u8; 16];
        data.copy_to_slice(&mut token);

        Ok(Self {
            length,
            orig_flags,
            num_chunks,
            chunk_size,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let meta = Metadata::new(2017, 42, 1008, [7u8; 16]);
        let bytes = meta.to_bytes();
        assert_eq!(bytes.len(), METADATA_SIZE);
        assert_eq!(Metadata::from_bytes(&bytes).unwrap(), meta);
    }

    #[test]
    fn zero_length_has_zero_chunks() {
        let meta = Metadata::new(0, 0, 1008, [0u8; 16]);
        assert_eq!(meta.num_chunks, 0);
    }

    #[test]
    fn exact_multiple_has_no_partial_chunk() {
        let meta = Metadata::new(2016, 0, 1008, [0u8; 16]);
        assert_eq!(meta.num_chunks, 2);
        assert_eq!(meta.chunk_len(0), 1008);
        assert_eq!(meta.chunk_len(1), 1008);
    }

    #[test]
    fn off_by_one_has_small_final_chunk() {
        let meta = Metadata::new(2017, 0, 1008, [0u8; 16]);
        assert_eq!(meta.num_chunks, 3);
        assert_eq!(meta.chunk_len(0), 1008);
        assert_eq!(meta.chunk_len(1), 1008);
        assert_eq!(meta.chunk_len(2), 1);
    }

    #[test]
    fn rejects_wrong_sized_buffers() {
        assert!(Metadata::from_bytes(&[0u8; 10]).is_err());
    }
}
