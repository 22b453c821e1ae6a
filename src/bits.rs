// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Packing code bits into bytes and reading them back.
//!
//! Packed bytes are filled most significant bit first. The bit count, not
//! the byte count, says where the data ends; the unused low bits of the
//! last byte are zero when written and ignored when read.

use bv::Bits;

use crate::error::Error;
use crate::error::Result;

/// A packed bit sequence together with its exact length in bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedBits {
    bytes: Vec<u8>,
    bit_len: u64,
}

/// Number of bytes needed to hold `bit_len` bits.
pub fn bytes_for_bits(bit_len: u64) -> u64 {
    (bit_len + 7) / 8
}

impl PackedBits {
    pub fn new() -> PackedBits {
        PackedBits::default()
    }

    /// Wraps bytes read from an artifact. The byte count must be exactly
    /// what `bit_len` needs; padding bits are not checked.
    pub fn from_parts(bytes: Vec<u8>, bit_len: u64) -> Result<PackedBits> {
        let expected = bytes_for_bits(bit_len);
        if bytes.len() as u64 != expected {
            return Err(Error::corrupt(
                "body",
                format!(
                    "{} bits need {} bytes, found {}",
                    bit_len,
                    expected,
                    bytes.len()
                ),
            ));
        }
        Ok(PackedBits { bytes, bit_len })
    }

    pub fn push(&mut self, bit: bool) {
        let offset = (self.bit_len % 8) as u32;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Appends every bit of `bits`, in order.
    pub fn extend_from<B: Bits>(&mut self, bits: B) {
        for i in 0..bits.bit_len() {
            self.push(bits.get_bit(i));
        }
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The logical bit sequence, stopping at `bit_len`.
    pub fn iter(&self) -> BitIter<std::iter::Copied<std::slice::Iter<'_, u8>>> {
        BitIter::new(self.bytes.iter().copied(), self.bit_len)
    }
}

/// Concatenates `codes` into one packed bit sequence.
pub fn pack<I, B>(codes: I) -> PackedBits
where
    I: IntoIterator<Item = B>,
    B: Bits,
{
    let mut packed = PackedBits::new();
    for code in codes {
        packed.extend_from(code);
    }
    packed
}

/// Yields the bits of a byte stream, most significant bit of each byte
/// first, and stops after `remaining` bits even if the stream has more.
pub struct BitIter<Inner> {
    inner: Inner,
    cur: u8,
    bit_index: u8,
    remaining: u64,
}

impl<I: Iterator<Item = u8>> BitIter<I> {
    pub fn new(inner: I, bit_len: u64) -> BitIter<I> {
        BitIter {
            inner,
            cur: 0,
            bit_index: 8,
            remaining: bit_len,
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for BitIter<I> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.bit_index == 8 {
            self.cur = self.inner.next()?;
            self.bit_index = 0;
        }

        self.remaining -= 1;
        self.bit_index += 1;
        Some(self.cur & (0x80 >> (self.bit_index - 1)) != 0)
    }
}
