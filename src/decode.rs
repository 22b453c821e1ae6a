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

use crate::error::Error;
use crate::error::Result;
use crate::tree::HuffNode;

/// Walks a Huffman tree one bit at a time.
///
/// The cursor starts at the root. Each bit moves it to a child; reaching a
/// leaf yields the leaf's symbol and puts the cursor back at the root. When
/// the root itself is a leaf, a `0` bit yields it directly.
pub struct Decoder<'a> {
    root: &'a HuffNode,
    cursor: &'a HuffNode,
    consumed: u64,
}

impl<'a> Decoder<'a> {
    pub fn new(root: &'a HuffNode) -> Decoder<'a> {
        Decoder {
            root,
            cursor: root,
            consumed: 0,
        }
    }

    /// Consumes one bit, returning a symbol if it completed one.
    pub fn feed(&mut self, bit: bool) -> Result<Option<u8>> {
        let cursor: &'a HuffNode = self.cursor;
        let next = match cursor {
            HuffNode::Leaf(_) if !bit => cursor,
            _ => cursor.child(bit).ok_or_else(|| {
                Error::corrupt(
                    "body",
                    format!("bit {} takes a branch that does not exist", self.consumed),
                )
            })?,
        };
        self.consumed += 1;

        match next.symbol() {
            Some(symbol) => {
                self.cursor = self.root;
                Ok(Some(symbol))
            }
            None => {
                self.cursor = next;
                Ok(None)
            }
        }
    }

    /// Whether the cursor is between symbols.
    pub fn at_root(&self) -> bool {
        std::ptr::eq(self.cursor, self.root)
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Checks that the bits ran out on a symbol boundary.
    pub fn finish(self) -> Result<()> {
        if self.at_root() {
            Ok(())
        } else {
            Err(Error::corrupt(
                "body",
                format!("bits end inside a code after {} bits", self.consumed),
            ))
        }
    }
}
