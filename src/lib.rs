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

//! Byte-oriented Huffman compression with a self-describing container.
//!
//! Compression counts the input's bytes, builds a Huffman tree from the
//! counts, packs every byte's code into a bit stream and frames the result
//! with the original file name and the count table. Decompression rebuilds
//! the same tree from the stored table and walks it bit by bit.

mod bits;
mod decode;
mod error;
pub mod files;
mod frame;
mod table;
mod tree;
mod util;

use log::debug;
use log::log_enabled;

pub use bits::pack;
pub use bits::BitIter;
pub use bits::PackedBits;
pub use decode::Decoder;
pub use error::Error;
pub use error::Result;
pub use frame::Frame;
pub use table::count_symbols;
pub use table::SymbolCounts;
pub use tree::build_tree;
pub use tree::code_listing;
pub use tree::codes_from_tree;
pub use tree::HuffNode;
pub use tree::SymbolCode;
pub use tree::SymbolCodes;

/// Encode the input with a precomputed Huffman code.
pub fn encode<I: IntoIterator<Item = u8>>(input: I, symbol_codes: &SymbolCodes) -> Result<PackedBits> {
    let mut packed = PackedBits::new();
    for byte in input {
        let code = symbol_codes
            .get(byte)
            .ok_or(Error::Uncoded { symbol: byte })?;
        packed.extend_from(*code);
    }
    Ok(packed)
}

/// Decode a packed bit stream with the tree it was encoded against.
pub fn decode(body: &PackedBits, tree: &HuffNode) -> Result<Vec<u8>> {
    let mut decoder = Decoder::new(tree);
    let mut output = Vec::new();
    for bit in body.iter() {
        if let Some(symbol) = decoder.feed(bit)? {
            output.push(symbol);
        }
    }
    decoder.finish()?;
    Ok(output)
}

/// The contents of an artifact and the name they were compressed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restored {
    pub name: String,
    pub data: Vec<u8>,
}

/// Compresses `input` into a complete artifact recording `name`.
pub fn compress(name: &str, input: &[u8]) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Err(Error::EmptyInput);
    }

    let counts = count_symbols(input.iter().copied());
    let tree = build_tree(&counts)?;
    let codes = codes_from_tree(&tree);
    if log_enabled!(log::Level::Debug) {
        for line in code_listing(&counts, &codes) {
            debug!("{}", line);
        }
    }

    let body = encode(input.iter().copied(), &codes)?;
    debug!(
        "{}: {} bytes, {} symbols, {} bits",
        name,
        input.len(),
        counts.len(),
        body.bit_len()
    );

    Frame {
        name: name.to_string(),
        counts,
        body,
    }
    .to_bytes()
}

/// Restores the bytes and original name held in `artifact`.
pub fn decompress(artifact: &[u8]) -> Result<Restored> {
    let frame = Frame::parse(artifact)?;
    let tree = build_tree(&frame.counts)?;
    let data = decode(&frame.body, &tree)?;

    let expected = frame.counts.total();
    if data.len() as u64 != expected {
        return Err(Error::corrupt(
            "body",
            format!("decoded {} bytes, table counts {}", data.len(), expected),
        ));
    }
    debug!(
        "{}: {} bits, {} bytes restored",
        frame.name,
        frame.body.bit_len(),
        data.len()
    );

    Ok(Restored {
        name: frame.name,
        data,
    })
}
