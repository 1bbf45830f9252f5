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

use std::cmp::min;
use std::io::{self, Read};

/// A reader adapter presenting a bounded view over an upstream byte stream, advancing in fixed
/// chunk windows.
///
/// Between windows, this reader never consumes more bytes from the upstream than the windows
/// have surfaced — the property that lets `Set` write chunks back-to-back from a streaming
/// source without buffering the whole value in memory.
pub struct ChunkLimitedReader<R> {
    upstream: R,
    chunk_size: u64,
    total_remaining: u64,
    window_remaining: u64,
}

impl<R: Read> ChunkLimitedReader<R> {
    /// Create a new chunk-limited reader over `upstream`, with `total_remaining` bytes of
    /// payload left to read across all windows.
    pub fn new(upstream: R, chunk_size: u64, total_remaining: u64) -> Self {
        Self {
            upstream,
            chunk_size,
            total_remaining,
            window_remaining: 0,
        }
    }

    /// Whether there is any payload left to read across all windows.
    pub fn more(&self) -> bool {
        self.total_remaining > 0
    }

    /// Open a new window of up to `chunk_size` bytes, or less for the final partial window.
    pub fn next_chunk(&mut self) {
        self.window_remaining = min(self.chunk_size, self.total_remaining);
    }
}

impl<R: Read> Read for ChunkLimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.window_remaining == 0 {
            return Ok(0);
        }

        let want = min(buf.len() as u64, self.window_remaining) as usize;
        let n = self.upstream.read(&mut buf[..want])?;
        self.window_remaining -= n as u64;
        self.total_remaining -= n as u64;
        Ok(n)
    }
}
