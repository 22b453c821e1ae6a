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

//! The compressed artifact layout.
//!
//! All integers are little-endian.
//!
//! ```text
//! nameLength  u32
//! name        nameLength bytes, UTF-8
//! tableSize   u32
//! entries     tableSize x (symbol u8, count i32), ascending symbol
//! totalBits   u32
//! body        ceil(totalBits / 8) bytes
//! ```

use crate::bits::bytes_for_bits;
use crate::bits::PackedBits;
use crate::error::Error;
use crate::error::Result;
use crate::table::SymbolCounts;

const ENTRY_LEN: usize = 5;

/// A decoded or about-to-be-encoded artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub counts: SymbolCounts,
    pub body: PackedBits,
}

/// Whether `name` can be restored as a file next to the artifact without
/// naming anything else.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

fn to_u32(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Oversized { field, value })
}

impl Frame {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !is_plain_file_name(&self.name) {
            return Err(Error::InvalidName {
                name: self.name.clone(),
            });
        }

        let body = self.body.as_bytes();
        let mut bytes =
            Vec::with_capacity(12 + self.name.len() + self.counts.len() * ENTRY_LEN + body.len());

        let name_len = to_u32("nameLength", self.name.len() as u64)?;
        bytes.extend_from_slice(&name_len.to_le_bytes());
        bytes.extend_from_slice(self.name.as_bytes());

        let table_size = to_u32("tableSize", self.counts.len() as u64)?;
        bytes.extend_from_slice(&table_size.to_le_bytes());
        for (symbol, count) in self.counts.iter() {
            let count = i32::try_from(count).map_err(|_| Error::Oversized {
                field: "count",
                value: count,
            })?;
            bytes.push(symbol);
            bytes.extend_from_slice(&count.to_le_bytes());
        }

        let total_bits = to_u32("totalBits", self.body.bit_len())?;
        bytes.extend_from_slice(&total_bits.to_le_bytes());
        bytes.extend_from_slice(body);

        Ok(bytes)
    }

    /// Parses an artifact, rejecting any field that disagrees with the
    /// size of the buffer or with the rules the encoder follows.
    pub fn parse(buf: &[u8]) -> Result<Frame> {
        let mut reader = Reader { buf, pos: 0 };

        let name_len = reader.u32("nameLength")? as usize;
        let name = reader.take(name_len, "name")?;
        let name = String::from_utf8(name.to_vec())
            .map_err(|_| Error::corrupt("name", "not valid UTF-8"))?;
        if !is_plain_file_name(&name) {
            return Err(Error::corrupt(
                "name",
                format!("{:?} is not a plain file name", name),
            ));
        }

        let table_size = reader.u32("tableSize")? as usize;
        if table_size > 256 {
            return Err(Error::corrupt(
                "tableSize",
                format!("{} entries for a 256-symbol alphabet", table_size),
            ));
        }
        if table_size * ENTRY_LEN > reader.remaining() {
            return Err(Error::corrupt(
                "tableSize",
                format!(
                    "{} entries need {} bytes, found {}",
                    table_size,
                    table_size * ENTRY_LEN,
                    reader.remaining()
                ),
            ));
        }

        let mut counts = SymbolCounts::new();
        let mut previous: Option<u8> = None;
        for _ in 0..table_size {
            let symbol = reader.u8("entries")?;
            let count = reader.i32("entries")?;
            if previous.map_or(false, |p| symbol <= p) {
                return Err(Error::corrupt(
                    "entries",
                    format!("symbol {} out of order or repeated", symbol),
                ));
            }
            if count <= 0 {
                return Err(Error::corrupt(
                    "entries",
                    format!("symbol {} has count {}", symbol, count),
                ));
            }
            counts.set(symbol, count as u64);
            previous = Some(symbol);
        }

        let total_bits = reader.u32("totalBits")? as u64;
        if counts.is_empty() && total_bits > 0 {
            return Err(Error::corrupt(
                "totalBits",
                format!("{} bits with an empty table", total_bits),
            ));
        }
        if bytes_for_bits(total_bits) > reader.remaining() as u64 {
            return Err(Error::corrupt(
                "totalBits",
                format!(
                    "{} bits need {} bytes, found {}",
                    total_bits,
                    bytes_for_bits(total_bits),
                    reader.remaining()
                ),
            ));
        }
        let body = PackedBits::from_parts(reader.rest().to_vec(), total_bits)?;

        Ok(Frame { name, counts, body })
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::corrupt(
                field,
                format!("needs {} bytes, found {}", n, self.remaining()),
            ));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u32(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn i32(&mut self, field: &'static str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array(field)?))
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::count_symbols;

    fn sample() -> Frame {
        let mut body = PackedBits::new();
        for bit in [false, false, false, true, true, true, true, true, false] {
            body.push(bit);
        }
        Frame {
            name: "abc.txt".to_string(),
            counts: count_symbols(b"AAABBC".iter().copied()),
            body,
        }
    }

    fn field_of(err: Error) -> &'static str {
        match err {
            Error::Corrupt { field, .. } => field,
            other => panic!("expected a corrupt artifact error, got {:?}", other),
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes().unwrap();
        let mut expected = vec![7, 0, 0, 0];
        expected.extend_from_slice(b"abc.txt");
        expected.extend_from_slice(&[3, 0, 0, 0]);
        expected.extend_from_slice(&[b'A', 3, 0, 0, 0]);
        expected.extend_from_slice(&[b'B', 2, 0, 0, 0]);
        expected.extend_from_slice(&[b'C', 1, 0, 0, 0]);
        expected.extend_from_slice(&[9, 0, 0, 0]);
        expected.extend_from_slice(&[0b0001_1111, 0b0000_0000]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_parse_written_frame() {
        let frame = sample();
        assert_eq!(Frame::parse(&frame.to_bytes().unwrap()).unwrap(), frame);
    }

    #[test]
    fn test_truncated_anywhere_is_corrupt() {
        let bytes = sample().to_bytes().unwrap();
        for len in 0..bytes.len() {
            let err = Frame::parse(&bytes[..len]).unwrap_err();
            assert!(err.is_corrupt(), "prefix of {} bytes", len);
        }
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "body");
    }

    #[test]
    fn test_name_length_past_end() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0..4].copy_from_slice(&1000u32.to_le_bytes());
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "name");
    }

    #[test]
    fn test_unsafe_names_are_rejected() {
        for name in ["", ".", "..", "a/b", "..\\x"] {
            let mut bytes = (name.len() as u32).to_le_bytes().to_vec();
            bytes.extend_from_slice(name.as_bytes());
            bytes.extend_from_slice(&[0; 8]);
            assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "name", "{:?}", name);

            let mut frame = sample();
            frame.name = name.to_string();
            assert!(matches!(frame.to_bytes(), Err(Error::InvalidName { .. })));
        }
    }

    #[test]
    fn test_non_utf8_name() {
        let mut bytes = vec![2, 0, 0, 0, 0xff, 0xfe];
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "name");
    }

    #[test]
    fn test_table_size_checks() {
        let mut bytes = vec![1, 0, 0, 0, b'x'];
        bytes.extend_from_slice(&257u32.to_le_bytes());
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "tableSize");

        let mut bytes = vec![1, 0, 0, 0, b'x'];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 12]);
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "tableSize");
    }

    #[test]
    fn test_bad_entries() {
        fn header(entries: &[(u8, i32)]) -> Vec<u8> {
            let mut bytes = vec![1, 0, 0, 0, b'x'];
            bytes.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            for &(sym, count) in entries {
                bytes.push(sym);
                bytes.extend_from_slice(&count.to_le_bytes());
            }
            bytes.extend_from_slice(&2u32.to_le_bytes());
            bytes.push(0);
            bytes
        }
        assert!(Frame::parse(&header(&[(1, 1), (2, 1)])).is_ok());
        assert_eq!(field_of(Frame::parse(&header(&[(1, 0), (2, 1)])).unwrap_err()), "entries");
        assert_eq!(field_of(Frame::parse(&header(&[(1, -5), (2, 1)])).unwrap_err()), "entries");
        assert_eq!(field_of(Frame::parse(&header(&[(2, 1), (2, 1)])).unwrap_err()), "entries");
        assert_eq!(field_of(Frame::parse(&header(&[(2, 1), (1, 1)])).unwrap_err()), "entries");
    }

    #[test]
    fn test_bits_without_table() {
        let mut bytes = vec![1, 0, 0, 0, b'x', 0, 0, 0, 0];
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.push(0);
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "totalBits");
    }

    #[test]
    fn test_body_shorter_than_bit_count() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.pop();
        assert_eq!(field_of(Frame::parse(&bytes).unwrap_err()), "totalBits");
    }

    #[test]
    fn test_oversized_count() {
        let mut frame = sample();
        frame.counts.set(b'Z', i32::MAX as u64 + 1);
        assert!(matches!(
            frame.to_bytes(),
            Err(Error::Oversized { field: "count", .. })
        ));
    }
}
