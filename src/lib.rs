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

//! Transparent chunking and reassembly for values larger than a memcached-compatible backend
//! will accept in one item.
//!
//! A [`ChunkedEngine`] splits an oversized value into fixed-size slots on Set, keeps a small
//! metadata record describing how many slots there are, and reassembles the value from those
//! slots on Get or GAT. A 16-byte token written into every slot at Set time and checked against
//! the metadata record's token on every read makes a torn write — the backend evicting or
//! partially overwriting one piece of a multi-chunk item — visible as a miss rather than as
//! corrupted data.
//!
//! This crate only implements the chunking engine: it does not open sockets, does not parse the
//! inbound protocol clients speak to a cache proxy, and does not decide what counts as "too
//! large to store as one item" — callers wire this in around [`ChunkedEngine`] (see the
//! `backend`, `tokens`, and `counters` type parameters on [`ChunkedEngine::new`]).
//!
//! ```no_run
//! use chunked_item_engine::config::EngineConfig;
//! use chunked_item_engine::engine::ChunkedEngine;
//! use chunked_item_engine::metrics::NullCounters;
//! use chunked_item_engine::request::SetRequest;
//! use chunked_item_engine::token::UuidTokenSource;
//! use std::net::TcpStream;
//!
//! # fn run() -> chunked_item_engine::error::Result<()> {
//! let mut backend = TcpStream::connect("127.0.0.1:11211")?;
//! let mut engine = ChunkedEngine::new(&mut backend, EngineConfig::default(), UuidTokenSource, NullCounters);
//!
//! let req = SetRequest { key: b"mykey".to_vec(), flags: 0, exptime: 0, length: 5 };
//! engine.set(req, &mut &b"hello"[..])?;
//! # Ok(())
//! # }
//! ```

pub mod chunk_reader;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod metadata;
pub mod metrics;
pub mod proto;
pub mod request;
pub mod token;

#[cfg(test)]
mod test_support;

pub use engine::ChunkedEngine;
pub use error::{Error, Result};
