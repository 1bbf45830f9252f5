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

//! The storage of named counters is external to this crate; this module only defines the seam
//! the engine increments them through.

/// A sink for named counters incremented by the engine.
///
/// Implementors own wherever the counters actually live (a `prometheus` registry, an atomic
/// counter table, whatever the embedding proxy uses). The engine only ever calls `incr`.
pub trait Counters {
    /// Increment the named counter by one.
    fn incr(&self, name: &str);
}

/// A `Counters` implementation that discards every increment.
///
/// This is the default for callers that don't care about metrics, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCounters;

impl Counters for NullCounters {
    fn incr(&self, _name: &str) {}
}
