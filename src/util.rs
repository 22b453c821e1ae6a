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

use std::cmp;

/// `Prioritized` stores a value together with the `(weight, rank)` pair that
/// decides when it leaves a heap.
///
/// Comparisons look only at the key, and are reversed: the entry with the
/// smaller weight is the greater one, and on equal weight the smaller rank
/// is. This lets `std::collections::BinaryHeap`, which is a max-heap, hand
/// out the lightest entry first without wrapping everything in
/// `cmp::Reverse`. Ranks must be unique within one heap so that the order
/// is total and pops are deterministic.
#[derive(Clone, Copy, Debug)]
pub struct Prioritized<T> {
    pub weight: u64,
    pub rank: u32,
    pub value: T,
}

impl<T> Prioritized<T> {
    fn key(&self) -> (u64, u32) {
        (self.weight, self.rank)
    }
}

impl<T> PartialEq for Prioritized<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Prioritized<T> {}

impl<T> Ord for Prioritized<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        other.key().cmp(&self.key())
    }
}

impl<T> PartialOrd for Prioritized<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}
