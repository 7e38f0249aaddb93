//! Shared file I/O for the splitter
//!
//! Inputs are read whole; outputs are written whole through a temporary file
//! in the destination directory and renamed into place, so a failed write
//! never leaves a half-written file behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::diagnostics::SplitError;

/// Extensions tried, in order, when looking for a declarations file beside the input.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx"];

/// Decoded contents of an input file.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub text: String,
    /// True when invalid UTF-8 had to be replaced.
    pub lossy: bool,
}

/// What happened when a file was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Written,
    /// On-disk content already matched; the file was left alone.
    Unchanged,
}

/// Read a whole file, decoding invalid UTF-8 lossily instead of failing.
pub fn read_source_text(path: &Path) -> Result<SourceText, SplitError> {
    let bytes = fs::read(path).map_err(|source| SplitError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, lossy) = match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(err) => (
            String::from_utf8_lossy(err.as_bytes()).into_owned(),
            true,
        ),
    };

    Ok(SourceText {
        path: path.to_path_buf(),
        text,
        lossy,
    })
}

/// Find the declarations file for `input`: same stem, header extension.
pub fn infer_declarations_path(input: &Path) -> Option<PathBuf> {
    HEADER_EXTENSIONS
        .iter()
        .map(|ext| input.with_extension(ext))
        .find(|candidate| candidate != input && candidate.is_file())
}

/// Mode given to files that did not exist before.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with `contents` atomically, creating parent directories.
///
/// Returns `Unchanged` without touching the file when it already holds
/// exactly `contents`. A replaced file keeps its permissions; a new file gets
/// the usual `0644` instead of the temporary file's `0600`.
pub fn write_atomically(path: &Path, contents: &str) -> io::Result<WriteStatus> {
    if let Ok(existing) = fs::read(path) {
        if existing == contents.as_bytes() {
            return Ok(WriteStatus::Unchanged);
        }
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(_) => set_new_file_permissions(tmp.as_file())?,
    }
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(WriteStatus::Written)
}

#[cfg(unix)]
fn set_new_file_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn set_new_file_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
