//! Atomic file replacement
//!
//! Content is written to a temporary file in the target directory, synced and
//! then renamed over the target. Readers see either the previous file or the
//! complete new one, never a partial write. If the writer fails or the process
//! dies before the rename, the temporary file is discarded and the target is
//! untouched.

use crate::storage::{StorageError, StorageResult};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Prefix of in-flight temporary files
pub const TEMP_PREFIX: &str = ".tmp_";

/// Atomically replaces `path` with `bytes`
pub fn atomic_write(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    atomic_write_with(path, |writer| writer.write_all(bytes))
}

/// Atomically replaces `path` with whatever `write` produces
///
/// Parent directories are created as needed.
pub fn atomic_write_with<F>(path: &Path, write: F) -> StorageResult<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer as &mut dyn Write)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| StorageError::Replace {
        path: path.display().to_string(),
        source: e.error,
    })?;

    Ok(())
}
