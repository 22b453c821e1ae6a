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

//! Whole-file compression and restoration.
//!
//! Inputs are read fully into memory, and outputs are written in one piece
//! through a temporary file in the destination directory that is renamed
//! into place, so a failed run leaves nothing at the destination.

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use log::info;
use log::warn;
use tempfile::NamedTempFile;

use crate::error::Error;
use crate::error::Result;

/// Appended to the input's stem to name its artifact.
pub const ARTIFACT_SUFFIX: &str = "_compressed";
/// Extension of every artifact.
pub const ARTIFACT_EXTENSION: &str = "fcm";

/// Where `compress_file` puts the artifact for `input`: beside it, named
/// `<stem>_compressed.fcm`.
pub fn artifact_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(ARTIFACT_SUFFIX);
    name.push(".");
    name.push(ARTIFACT_EXTENSION);
    input.with_file_name(name)
}

pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `contents` to `path`, replacing any existing file, such that
/// `path` either keeps its old state or holds all of `contents`.
pub fn write_sink(path: &Path, contents: &[u8]) -> Result<()> {
    let sink_error = |source: io::Error| Error::SinkUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(sink_error)?;
    tmp.write_all(contents).map_err(sink_error)?;
    tmp.as_file().sync_all().map_err(sink_error)?;
    tmp.persist(path).map_err(|e| sink_error(e.error))?;
    Ok(())
}

/// Compresses the file at `input` and returns the artifact's path.
pub fn compress_file(input: &Path) -> Result<PathBuf> {
    let data = read_source(input)?;
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidName {
            name: input.display().to_string(),
        })?;

    let artifact = crate::compress(&name, &data)?;
    let output = artifact_path(input);
    write_sink(&output, &artifact)?;

    info!(
        "compressed {} -> {} ({} -> {} bytes)",
        input.display(),
        output.display(),
        data.len(),
        artifact.len()
    );
    Ok(output)
}

/// Restores the file held in the artifact at `artifact`, under its original
/// name in the artifact's directory, and returns the restored path.
pub fn decompress_file(artifact: &Path) -> Result<PathBuf> {
    let bytes = read_source(artifact)?;
    let restored = crate::decompress(&bytes)?;

    let output = artifact.with_file_name(&restored.name);
    if output.exists() {
        warn!("replacing existing file {}", output.display());
    }
    write_sink(&output, &restored.data)?;

    info!(
        "decompressed {} -> {} ({} -> {} bytes)",
        artifact.display(),
        output.display(),
        bytes.len(),
        restored.data.len()
    );
    Ok(output)
}
