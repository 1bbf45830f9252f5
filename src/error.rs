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

use thiserror::Error as ThisError;

/// The result type returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned by the chunked-item engine.
///
/// `Miss`, `KeyNotFound`, and `TokenMismatch` are recovered locally by the engine's Get/Gat state
/// machines and surfaced to callers as a miss response rather than an `Err`; Delete and Touch
/// instead return the miss as an `Err` since they have no response value to carry a miss flag on.
/// Every other variant propagates to the caller.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested item was not present in the backend.
    #[error("item not found")]
    Miss,

    /// The backend responded with `KeyNotFound` for a specific request.
    #[error("key not found")]
    KeyNotFound,

    /// A chunk was retrieved but its token prefix did not match the item's metadata token.
    ///
    /// Treated identically to `Miss` by callers; a torn item must never be assembled.
    #[error("chunk token did not match metadata token")]
    TokenMismatch,

    /// The backend sent a malformed response: bad magic, a short header, or an unexpected
    /// opcode in the response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend returned a non-success status other than `KeyNotFound`.
    #[error("backend returned status {status:#06x}")]
    Backend {
        /// The raw status code from the response header.
        status: u16,
    },

    /// An I/O error occurred on the backend connection. The connection is presumed poisoned.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should be recovered as a miss rather than propagated.
    pub fn is_miss(&self) -> bool {
        matches!(self, Error::Miss | Error::KeyNotFound | Error::TokenMismatch)
    }
}
