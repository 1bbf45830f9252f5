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

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use chunked_item_engine::config::EngineConfig;
use chunked_item_engine::engine::ChunkedEngine;
use chunked_item_engine::metrics::NullCounters;
use chunked_item_engine::request::{GetRequest, SetRequest};
use chunked_item_engine::token::UuidTokenSource;

/// Return a buffer containing `size` random bytes for testing purposes.
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut rng = SmallRng::from_entropy();
    let mut buffer = vec![0u8; size];
    rng.fill_bytes(&mut buffer);
    buffer
}

/// A minimal in-memory responder for the subset of the binary protocol these benchmarks drive,
/// so the engine's own overhead is measured without a real socket in the loop. This duplicates
/// `test_support::MockBackend`, which lives behind `#[cfg(test)]` and so isn't visible here.
struct BenchBackend {
    store: HashMap<Vec<u8>, Vec<u8>>,
    inbuf: Vec<u8>,
    outbuf: VecDeque<u8>,
}

impl BenchBackend {
    fn new() -> Self {
        Self {
            store: HashMap::new(),
            inbuf: Vec::new(),
            outbuf: VecDeque::new(),
        }
    }

    fn try_process(&mut self) {
        loop {
            if self.inbuf.len() < 24 {
                return;
            }
            let total_body_len = u32::from_be_bytes(self.inbuf[8..12].try_into().unwrap()) as usize;
            let frame_len = 24 + total_body_len;
            if self.inbuf.len() < frame_len {
                return;
            }
            let frame: Vec<u8> = self.inbuf.drain(..frame_len).collect();
            self.process_frame(&frame);
        }
    }

    fn process_frame(&mut self, frame: &[u8]) {
        let opcode = frame[1];
        let key_len = u16::from_be_bytes(frame[2..4].try_into().unwrap()) as usize;
        let extras_len = frame[4] as usize;
        let opaque = u32::from_be_bytes(frame[12..16].try_into().unwrap());
        let key_start = 24 + extras_len;
        let key = &frame[key_start..key_start + key_len];
        let value = &frame[key_start + key_len..];

        match opcode {
            0x01 => {
                self.store.insert(key.to_vec(), value.to_vec());
                self.respond(opaque, 0x0000, &[]);
            }
            0x00 => match self.store.get(key) {
                Some(v) => {
                    let mut extras = BytesMut::with_capacity(4);
                    extras.put_u32(0);
                    let body = [&extras[..], &v[..]].concat();
                    self.respond_with_extras(opaque, 0x0000, 4, &body);
                }
                None => self.respond(opaque, 0x0001, &[]),
            },
            other => panic!("BenchBackend received unsupported opcode {:#04x}", other),
        }
    }

    fn respond(&mut self, opaque: u32, status: u16, value: &[u8]) {
        self.respond_with_extras(opaque, status, 0, value);
    }

    fn respond_with_extras(&mut self, opaque: u32, status: u16, extras_len: u8, body: &[u8]) {
        let mut buf = BytesMut::with_capacity(24 + body.len());
        buf.put_u8(0x81);
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u8(extras_len);
        buf.put_u8(0);
        buf.put_u16(status);
        buf.put_u32(body.len() as u32);
        buf.put_u32(opaque);
        buf.put_u64(0);
        buf.put_slice(body);
        self.outbuf.extend(buf.to_vec());
    }
}

impl Write for BenchBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inbuf.extend_from_slice(buf);
        self.try_process();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for BenchBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = std::cmp::min(buf.len(), self.outbuf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.outbuf.pop_front().unwrap();
        }
        Ok(n)
    }
}

pub fn set_values_of_varying_size(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("Set a value");

    for size in [64usize, 4_096, 1_048_576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_function(format!("{} bytes", size), |bencher| {
            bencher.iter_batched(
                || (BenchBackend::new(), random_bytes(*size)),
                |(mut backend, data)| {
                    let mut engine = ChunkedEngine::new(
                        &mut backend,
                        EngineConfig::default(),
                        UuidTokenSource,
                        NullCounters,
                    );
                    let req = SetRequest {
                        key: b"bench-key".to_vec(),
                        flags: 0,
                        exptime: 0,
                        length: data.len() as u32,
                    };
                    engine.set(req, &mut &data[..]).unwrap();
                },
                BatchSize::LargeInput,
            );
        });
    }
}

pub fn get_values_of_varying_size(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("Get a value");

    for size in [64usize, 4_096, 1_048_576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_function(format!("{} bytes", size), |bencher| {
            bencher.iter_batched(
                || {
                    let mut backend = BenchBackend::new();
                    let data = random_bytes(*size);
                    let mut engine = ChunkedEngine::new(
                        &mut backend,
                        EngineConfig::default(),
                        UuidTokenSource,
                        NullCounters,
                    );
                    let req = SetRequest {
                        key: b"bench-key".to_vec(),
                        flags: 0,
                        exptime: 0,
                        length: data.len() as u32,
                    };
                    engine.set(req, &mut &data[..]).unwrap();
                    backend
                },
                |mut backend| {
                    let mut engine = ChunkedEngine::new(
                        &mut backend,
                        EngineConfig::default(),
                        UuidTokenSource,
                        NullCounters,
                    );
                    let req = GetRequest {
                        keys: vec![b"bench-key".to_vec()],
                        opaques: vec![0],
                        quiet: vec![false],
                    };
                    let results: Vec<_> = engine.get(req).collect();
                    assert!(results[0].as_ref().unwrap().data.is_some());
                },
                BatchSize::LargeInput,
            );
        });
    }
}

criterion_group!(io, set_values_of_varying_size, get_values_of_varying_size);
criterion_main!(io);
