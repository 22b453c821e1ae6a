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

/// Stores the probability (in the form of a raw count) of each possible input
/// symbol. In this case, a symbol is any byte.
///
/// Symbols with a zero count are absent: they get no leaf, no code and no
/// entry in a serialized frame.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SymbolCounts {
    counts: [u64; 256],
}

impl SymbolCounts {
    pub fn new() -> SymbolCounts {
        SymbolCounts { counts: [0; 256] }
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn set(&mut self, symbol: u8, count: u64) {
        self.counts[symbol as usize] = count;
    }

    /// Number of distinct symbols present.
    pub fn len(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Sum of all counts, i.e. the length of the input they were taken from.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Present symbols and their counts in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }
}

impl Default for SymbolCounts {
    fn default() -> SymbolCounts {
        SymbolCounts::new()
    }
}

impl std::fmt::Debug for SymbolCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub fn count_symbols<I: IntoIterator<Item = u8>>(input: I) -> SymbolCounts {
    let mut counts = [0; 256];
    for b in input {
        counts[b as usize] += 1;
    }

    SymbolCounts { counts }
}
