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

//! Huffman tree construction and code assignment.

use std::collections::BinaryHeap;
use std::fmt;

use bv::BitVec;
use bv::Bits;

use crate::error::Error;
use crate::error::Result;
use crate::table::SymbolCounts;
use crate::util::Prioritized;

/// Rank of the first parent node. Leaves use their symbol as rank, so every
/// parent sorts after every leaf of the same weight, and parents among
/// themselves sort by creation order.
const FIRST_PARENT_RANK: u32 = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffParent {
    weight: u64,
    zero: Box<HuffNode>,
    one: Box<HuffNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HuffLeaf {
    symbol: u8,
    weight: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HuffNode {
    Parent(HuffParent),
    Leaf(HuffLeaf),
}

impl HuffNode {
    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Parent(p) => p.weight,
            HuffNode::Leaf(l) => l.weight,
        }
    }

    /// The child reached by following `bit`, or `None` from a leaf.
    pub fn child(&self, bit: bool) -> Option<&HuffNode> {
        match self {
            HuffNode::Parent(p) if bit => Some(&*p.one),
            HuffNode::Parent(p) => Some(&*p.zero),
            HuffNode::Leaf(_) => None,
        }
    }

    /// The symbol stored at a leaf.
    pub fn symbol(&self) -> Option<u8> {
        match self {
            HuffNode::Leaf(l) => Some(l.symbol),
            HuffNode::Parent(_) => None,
        }
    }
}

/// Builds the Huffman tree for `symbol_counts`.
///
/// The lightest two nodes are merged until one remains, the first one
/// popped becoming the `0` branch. Ties are broken by rank: leaves rank by
/// symbol, parents rank after all leaves in the order they were created.
/// Everything the order depends on comes from the table itself, so a
/// decoder given the same table builds the same tree.
pub fn build_tree(symbol_counts: &SymbolCounts) -> Result<HuffNode> {
    let mut node_queue = BinaryHeap::with_capacity(symbol_counts.len());
    for (symbol, count) in symbol_counts.iter() {
        node_queue.push(Prioritized {
            weight: count,
            rank: symbol as u32,
            value: HuffNode::Leaf(HuffLeaf {
                symbol,
                weight: count,
            }),
        });
    }

    let mut next_rank = FIRST_PARENT_RANK;
    loop {
        let first = node_queue.pop().ok_or(Error::EmptyTable)?;
        let second = match node_queue.pop() {
            Some(second) => second,
            None => return Ok(first.value),
        };

        let new_weight = first.weight + second.weight;
        node_queue.push(Prioritized {
            weight: new_weight,
            rank: next_rank,
            value: HuffNode::Parent(HuffParent {
                weight: new_weight,
                zero: Box::new(first.value),
                one: Box::new(second.value),
            }),
        });
        next_rank += 1;
    }
}

/// The bit string assigned to one symbol.
///
/// Bits are kept in `bv`'s block layout (bit `i` of the code is bit `i % 8`
/// of block `i / 8`). A code is at most 255 bits long, the depth of the
/// most unbalanced tree over 256 leaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SymbolCode {
    packed_bits: [u8; 32],
    length: u8,
}

impl SymbolCode {
    pub fn from_bits<B: Bits<Block = u8>>(bits: B) -> SymbolCode {
        assert!(bits.bit_len() > 0);
        assert!(bits.bit_len() <= 255);

        let mut packed_bits = [0; 32];
        for i in 0..bits.bit_len() {
            if bits.get_bit(i) {
                packed_bits[(i / 8) as usize] |= 1 << (i % 8);
            }
        }

        SymbolCode {
            packed_bits,
            length: bits.bit_len() as u8,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_len()).map(move |i| self.get_bit(i))
    }

    pub fn is_prefix_of(&self, other: &SymbolCode) -> bool {
        self.length <= other.length && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Bits for SymbolCode {
    type Block = u8;

    fn bit_len(&self) -> u64 {
        self.length as u64
    }

    fn get_block(&self, position: usize) -> Self::Block {
        self.packed_bits[position]
    }
}

/// Renders the code as `0`/`1` text, for display only.
impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Stores the bit strings for each symbol (in this case, any byte). Symbols
/// without a leaf in the tree have an empty code.
#[derive(Clone, Copy)]
pub struct SymbolCodes {
    codes: [SymbolCode; 256],
}

impl SymbolCodes {
    pub fn get(&self, symbol: u8) -> Option<&SymbolCode> {
        let code = &self.codes[symbol as usize];
        if code.bit_len() > 0 {
            Some(code)
        } else {
            None
        }
    }

    /// Assigned codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &SymbolCode)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter(|(_, code)| code.bit_len() > 0)
            .map(|(sym, code)| (sym as u8, code))
    }
}

/// Walks `tree` and records the path to every leaf: `0` for each step to the
/// zero child, `1` for each step to the one child.
///
/// A tree that is a single leaf has no path to record; its symbol gets the
/// one-bit code `0` so that every occurrence still costs a bit.
pub fn codes_from_tree(tree: &HuffNode) -> SymbolCodes {
    let mut codes = [Default::default(); 256];

    let mut cur_bits: BitVec<u8> = BitVec::new();
    match tree {
        HuffNode::Leaf(l) => {
            cur_bits.push(false);
            codes[l.symbol as usize] = SymbolCode::from_bits(&mut cur_bits);
        }
        HuffNode::Parent(_) => {
            codes_from_tree_impl(tree, &mut codes, &mut cur_bits);
            debug_assert_eq!(cur_bits.len(), 0);
        }
    }

    SymbolCodes { codes }
}

fn codes_from_tree_impl(tree: &HuffNode, codes: &mut [SymbolCode; 256], cur_bits: &mut BitVec<u8>) {
    match tree {
        HuffNode::Parent(p) => {
            cur_bits.push(false);
            codes_from_tree_impl(&p.zero, codes, cur_bits);
            cur_bits.pop();
            cur_bits.push(true);
            codes_from_tree_impl(&p.one, codes, cur_bits);
            cur_bits.pop();
        }
        HuffNode::Leaf(l) => {
            codes[l.symbol as usize] = SymbolCode::from_bits(cur_bits);
        }
    }
}

/// One line per coded symbol: byte value, printable form, count and code.
pub fn code_listing(symbol_counts: &SymbolCounts, symbol_codes: &SymbolCodes) -> Vec<String> {
    symbol_codes
        .iter()
        .map(|(sym, code)| {
            let shown = if sym.is_ascii_graphic() { sym as char } else { '.' };
            format!("{}\t{}\t{}\t{}", sym, shown, symbol_counts.get(sym), code)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::count_symbols;

    fn codes_for(input: &[u8]) -> SymbolCodes {
        let tree = build_tree(&count_symbols(input.iter().copied())).unwrap();
        codes_from_tree(&tree)
    }

    fn code_text(codes: &SymbolCodes, sym: u8) -> String {
        codes.get(sym).unwrap().to_string()
    }

    fn assert_prefix_free(codes: &SymbolCodes) {
        for (a, code_a) in codes.iter() {
            for (b, code_b) in codes.iter() {
                if a != b {
                    assert!(
                        !code_a.is_prefix_of(code_b),
                        "code for {} ({}) is a prefix of code for {} ({})",
                        a,
                        code_a,
                        b,
                        code_b
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_table_fails() {
        let err = build_tree(&SymbolCounts::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyTable));
    }

    #[test]
    fn test_single_leaf() {
        let tree = build_tree(&count_symbols(vec![0x41; 1000])).unwrap();
        assert_eq!(tree.symbol(), Some(0x41));
        assert_eq!(tree.weight(), 1000);
        assert!(tree.child(false).is_none());

        let codes = codes_from_tree(&tree);
        assert_eq!(code_text(&codes, 0x41), "0");
        assert_eq!(codes.iter().count(), 1);
    }

    #[test]
    fn test_frequency_ordering() {
        let codes = codes_for(b"AAABBC");
        let a = codes.get(b'A').unwrap().bit_len();
        let b = codes.get(b'B').unwrap().bit_len();
        let c = codes.get(b'C').unwrap().bit_len();
        assert!(a <= b);
        assert!(b <= c);
    }

    #[test]
    fn test_leaf_beats_parent_of_equal_weight() {
        // C(1) and B(2) merge into a parent of weight 3, which ties with A(3).
        // A is a leaf, so it pops first and takes the zero branch.
        let codes = codes_for(b"AAABBC");
        assert_eq!(code_text(&codes, b'A'), "0");
        assert_eq!(code_text(&codes, b'C'), "10");
        assert_eq!(code_text(&codes, b'B'), "11");
    }

    #[test]
    fn test_equal_leaves_pop_in_symbol_order() {
        let codes = codes_for(b"dcba");
        assert_eq!(code_text(&codes, b'a'), "00");
        assert_eq!(code_text(&codes, b'b'), "01");
        assert_eq!(code_text(&codes, b'c'), "10");
        assert_eq!(code_text(&codes, b'd'), "11");
    }

    #[test]
    fn test_parents_pop_in_creation_order() {
        // a+b, c+d and e+f all weigh 2. The first two created merge first,
        // leaving e+f to pop ahead of their heavier parent at the root.
        let codes = codes_for(b"abcdef");
        assert_eq!(code_text(&codes, b'a'), "100");
        assert_eq!(code_text(&codes, b'b'), "101");
        assert_eq!(code_text(&codes, b'c'), "110");
        assert_eq!(code_text(&codes, b'd'), "111");
        assert_eq!(code_text(&codes, b'e'), "00");
        assert_eq!(code_text(&codes, b'f'), "01");
    }

    #[test]
    fn test_full_alphabet_prefix_free() {
        let input: Vec<u8> = (0..=255u8).flat_map(|b| vec![b; 1 + b as usize % 7]).collect();
        let codes = codes_for(&input);
        assert_eq!(codes.iter().count(), 256);
        assert_prefix_free(&codes);
    }

    #[test]
    fn test_uniform_full_alphabet_is_eight_bits() {
        let input: Vec<u8> = (0..=255u8).collect();
        let codes = codes_for(&input);
        assert!(codes.iter().all(|(_, code)| code.bit_len() == 8));
    }

    #[test]
    fn test_skewed_tree_depth() {
        let mut counts = SymbolCounts::new();
        let (mut a, mut b) = (1u64, 1u64);
        for sym in 0..40u8 {
            counts.set(sym, a);
            let next = a + b;
            a = b;
            b = next;
        }
        let codes = codes_from_tree(&build_tree(&counts).unwrap());
        assert_eq!(codes.get(0).unwrap().bit_len(), 39);
        assert_eq!(codes.get(39).unwrap().bit_len(), 1);
        assert_prefix_free(&codes);
    }

    #[test]
    fn test_build_is_deterministic() {
        let counts = count_symbols(b"the quick brown fox jumps over the lazy dog".iter().copied());
        assert_eq!(build_tree(&counts).unwrap(), build_tree(&counts).unwrap());
    }

    #[test]
    fn test_root_weight_is_total() {
        let counts = count_symbols(b"mississippi".iter().copied());
        assert_eq!(build_tree(&counts).unwrap().weight(), 11);
    }

    #[test]
    fn test_code_listing() {
        let input = b"AAABBC\n";
        let counts = count_symbols(input.iter().copied());
        let codes = codes_from_tree(&build_tree(&counts).unwrap());
        let listing = code_listing(&counts, &codes);
        assert_eq!(listing.len(), 4);
        assert!(listing[0].starts_with("10\t.\t1\t"));
        assert!(listing[1].starts_with("65\tA\t3\t"));
    }
}
