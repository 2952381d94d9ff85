//! Input resolution: turn a user-supplied path into an [`UploadedFile`].
//!
//! The whole file is read into memory; every converter works on a byte
//! slice. Only the file name (not the directory) travels with the bytes,
//! since that is all an upload form would see.

use crate::error::ConvertError;
use crate::output::UploadedFile;
use std::path::Path;
use tracing::debug;

/// Read a local file as an upload named after its final path component.
pub fn read_upload(path: &Path) -> Result<UploadedFile, ConvertError> {
    let read_failed = |source: std::io::Error| ConvertError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    if path.is_dir() {
        return Err(read_failed(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "is a directory",
        )));
    }

    let bytes = std::fs::read(path).map_err(read_failed)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!("Read upload {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedFile::new(name, bytes))
}
