// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use execn_types::EncodableSnapshot;
use std::io;
use std::path::Path;

pub fn root_snapshot_exists(path: &Path) -> bool {
    path.is_file()
}

/// Writes `snapshot` to `path` as JSON, atomically and without clobbering an
/// existing file: the snapshot is written to a temporary file in the same
/// directory first, then renamed into place, so a crash mid-write never
/// leaves a partial bootstrap file for the next startup to trip over.
pub fn write_root_snapshot_atomically(path: &Path, snapshot: &EncodableSnapshot) -> io::Result<()> {
    if root_snapshot_exists(path) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("root snapshot already exists at {}", path.display()),
        ));
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, snapshot)?;
    tmp.persist_noclobber(path)
        .map_err(|e| e.error)?;
    Ok(())
}
