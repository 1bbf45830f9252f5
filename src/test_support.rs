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

//! An in-process mock of a memcached-compatible backend, used by every engine unit test.
//!
//! `MockBackend` implements `Read + Write` the same way a real `TcpStream` would from the
//! engine's point of view: bytes written form request frames which are answered as soon as a
//! complete frame has been buffered, and `read` serves the response bytes for whichever request
//! was processed most recently.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};

const HEADER_SIZE: usize = 24;

/// One item as the mock backend stores it: a raw value plus the flags and exptime it was last
/// Set or Touch'd with.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub value: Vec<u8>,
    pub flags: u32,
    pub exptime: u32,
}

/// An in-memory stand-in for a memcached backend connection.
pub struct MockBackend {
    pub store: HashMap<Vec<u8>, StoredItem>,
    inbuf: Vec<u8>,
    outbuf: VecDeque<u8>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            inbuf: Vec::new(),
            outbuf: VecDeque::new(),
        }
    }

    /// Seed the backend with a raw item, bypassing the protocol — used to construct torn-item
    /// fixtures that a well-behaved Set could never produce.
    pub fn seed(&mut self, key: &[u8], value: Vec<u8>) {
        self.store.insert(
            key.to_vec(),
            StoredItem {
                value,
                flags: 0,
                exptime: 0,
            },
        );
    }

    fn try_process(&mut self) {
        loop {
            if self.inbuf.len() < HEADER_SIZE {
                return;
            }
            let total_body_len =
                u32::from_be_bytes(self.inbuf[8..12].try_into().unwrap()) as usize;
            let frame_len = HEADER_SIZE + total_body_len;
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

        let extras = &frame[HEADER_SIZE..HEADER_SIZE + extras_len];
        let key_start = HEADER_SIZE + extras_len;
        let key = &frame[key_start..key_start + key_len];
        let value = &frame[key_start + key_len..];

        match opcode {
            0x01 => {
                // Set
                let flags = u32::from_be_bytes(extras[0..4].try_into().unwrap());
                let exptime = u32::from_be_bytes(extras[4..8].try_into().unwrap());
                self.store.insert(
                    key.to_vec(),
                    StoredItem {
                        value: value.to_vec(),
                        flags,
                        exptime,
                    },
                );
                self.respond(opaque, 0x0000, 0, &[], &[]);
            }
            0x00 => {
                // Get
                match self.store.get(key) {
                    Some(item) => {
                        let mut flags_extras = BytesMut::with_capacity(4);
                        flags_extras.put_u32(item.flags);
                        let value = item.value.clone();
                        self.respond(opaque, 0x0000, 4, &flags_extras, &value);
                    }
                    None => self.respond(opaque, 0x0001, 0, &[], &[]),
                }
            }
            0x1D => {
                // Gat
                let exptime = u32::from_be_bytes(extras[0..4].try_into().unwrap());
                match self.store.get_mut(key) {
                    Some(item) => {
                        item.exptime = exptime;
                        let mut flags_extras = BytesMut::with_capacity(4);
                        flags_extras.put_u32(item.flags);
                        let value = item.value.clone();
                        self.respond(opaque, 0x0000, 4, &flags_extras, &value);
                    }
                    None => self.respond(opaque, 0x0001, 0, &[], &[]),
                }
            }
            0x04 => {
                // Delete
                if self.store.remove(key).is_some() {
                    self.respond(opaque, 0x0000, 0, &[], &[]);
                } else {
                    self.respond(opaque, 0x0001, 0, &[], &[]);
                }
            }
            0x1C => {
                // Touch
                let exptime = u32::from_be_bytes(extras[0..4].try_into().unwrap());
                match self.store.get_mut(key) {
                    Some(item) => {
                        item.exptime = exptime;
                        self.respond(opaque, 0x0000, 0, &[], &[]);
                    }
                    None => self.respond(opaque, 0x0001, 0, &[], &[]),
                }
            }
            other => panic!("MockBackend received unsupported opcode {:#04x}", other),
        }
    }

    fn respond(&mut self, opaque: u32, status: u16, extras_len: u8, extras: &[u8], value: &[u8]) {
        let total_body_len = extras.len() + value.len();
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + total_body_len);
        buf.put_u8(0x81); // response magic
        buf.put_u8(0); // opcode, unused by the engine's response handling
        buf.put_u16(0); // key len
        buf.put_u8(extras_len);
        buf.put_u8(0); // data type
        buf.put_u16(status);
        buf.put_u32(total_body_len as u32);
        buf.put_u32(opaque);
        buf.put_u64(0); // cas
        buf.put_slice(extras);
        buf.put_slice(value);

        self.outbuf.extend(buf.to_vec());
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MockBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inbuf.extend_from_slice(buf);
        self.try_process();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for MockBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = std::cmp::min(buf.len(), self.outbuf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.outbuf.pop_front().unwrap();
        }
        Ok(n)
    }
}
