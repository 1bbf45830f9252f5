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

//! Stateless, pure derivation of the backend keys for an item's metadata and chunks.
//!
//! Chosen suffixes are outside the alphabet a front-end would accept from a user key; only
//! non-collision with a user key or with each other is required, not a specific suffix.

const METADATA_SUFFIX: &[u8] = b"_metadata";
const CHUNK_SUFFIX: &[u8] = b"_";

/// Derive the metadata key for a user key.
pub fn meta_key(key: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + METADATA_SUFFIX.len());
    buf.extend_from_slice(key);
    buf.extend_from_slice(METADATA_SUFFIX);
    buf
}

/// Derive the chunk key for chunk `index` of a user key.
pub fn chunk_key(key: &[u8], index: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + CHUNK_SUFFIX.len() + 10);
    buf.extend_from_slice(key);
    buf.extend_from_slice(CHUNK_SUFFIX);
    buf.extend_from_slice(index.to_string().as_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_key_appends_suffix() {
        assert_eq!(meta_key(b"foo"), b"foo_metadata".to_vec());
    }

    #[test]
    fn chunk_key_appends_decimal_index() {
        assert_eq!(chunk_key(b"foo", 0), b"foo_0".to_vec());
        assert_eq!(chunk_key(b"foo", 12), b"foo_12".to_vec());
    }

    #[test]
    fn metadata_and_chunk_keys_never_collide() {
        for i in 0..64u32 {
            assert_ne!(meta_key(b"foo"), chunk_key(b"foo", i));
        }
    }
}
