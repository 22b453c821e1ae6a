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

//! Error type shared by every stage of the compressor.

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file could not be opened or read.
    #[error("cannot read {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// There is nothing to compress.
    #[error("input is empty")]
    EmptyInput,

    /// A tree needs at least one leaf.
    #[error("cannot build a Huffman tree from an empty frequency table")]
    EmptyTable,

    /// The artifact does not describe a valid encoding.
    #[error("corrupt artifact ({field}): {reason}")]
    Corrupt { field: &'static str, reason: String },

    /// The input holds a byte the code table has no code for.
    #[error("byte {symbol} has no code")]
    Uncoded { symbol: u8 },

    /// A value does not fit the width the container reserves for it.
    #[error("{field} value {value} does not fit in the container format")]
    Oversized { field: &'static str, value: u64 },

    /// The original name cannot be stored and later used as a file name.
    #[error("{name:?} is not a plain file name")]
    InvalidName { name: String },

    /// The output file could not be created or written.
    #[error("cannot write {}", .path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn corrupt(field: &'static str, reason: impl Into<String>) -> Error {
        Error::Corrupt {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }
}
