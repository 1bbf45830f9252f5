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

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use uuid::Uuid;

use crate::config::TOKEN_SIZE;

/// A 16-byte per-item identity tag used to detect torn writes.
pub type Token = [u8; TOKEN_SIZE];

/// A producer of unique tokens.
///
/// Tokens need not be unpredictable to adversaries — the threat model is torn writes, not
/// attack. The only required property is that consecutive tokens differ and that collisions are
/// negligible over the lifetime of the cache. Implementations must be safe to call concurrently;
/// the token source is a shared resource.
pub trait TokenSource: Send + Sync {
    /// Produce a fresh token.
    fn next_token(&self) -> Token;
}

/// A `TokenSource` backed by a CSPRNG-derived UUID v4.
///
/// This is the default source. Each call draws fresh randomness, so there is nothing to
/// synchronize beyond what `uuid`'s random generator already does internally.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn next_token(&self) -> Token {
        *Uuid::new_v4().as_bytes()
    }
}

/// A `TokenSource` backed by a monotonic counter seeded with the current time plus a random
/// nonce, as an alternative to a full CSPRNG draw per token.
///
/// The first 8 bytes are the nonce (fixed for the lifetime of this source); the last 8 bytes
/// are a counter seeded from the wall clock at construction and incremented atomically on every
/// call, so two tokens from the same source are never equal as long as the process doesn't wrap
/// a `u64` counter, and two tokens from different sources differ with overwhelming probability
/// because their nonces differ.
#[derive(Debug)]
pub struct CountingTokenSource {
    nonce: [u8; 8],
    counter: AtomicU64,
}

impl CountingTokenSource {
    /// Create a new counting token source, seeding the counter from the current time and the
    /// nonce from the CSPRNG.
    pub fn new() -> Self {
        let mut nonce = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut nonce);

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        Self {
            nonce,
            counter: AtomicU64::new(seed),
        }
    }
}

impl Default for CountingTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for CountingTokenSource {
    fn next_token(&self) -> Token {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut token = [0u8; TOKEN_SIZE];
        token[..8].copy_from_slice(&self.nonce);
        token[8..].copy_from_slice(&count.to_be_bytes());
        token
    }
}
