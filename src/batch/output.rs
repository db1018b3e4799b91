use std::ffi::OsString;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::BatchError;

/// Suffix appended to the file stem of output documents.
pub const OUTPUT_SUFFIX: &str = "-local-app";

/// Returns the final destination of `input`.
///
/// # Errors
///
/// Returns an error if `input` has no file name.
pub fn output_path(input: &Path, overwrite: bool) -> Result<PathBuf, BatchError> {
    if overwrite {
        if input.file_name().is_none() {
            return Err(BatchError::InvalidPath(input.to_path_buf()));
        }
        Ok(input.to_path_buf())
    } else {
        add_file_name_suffix(input, OUTPUT_SUFFIX)
    }
}

/// Inserts `suffix` between the file stem and the extension.
///
/// # Errors
///
/// Returns an error if `path` has no file name.
pub fn add_file_name_suffix(path: &Path, suffix: &str) -> Result<PathBuf, BatchError> {
    let stem = path
        .file_stem()
        .ok_or_else(|| BatchError::InvalidPath(path.to_path_buf()))?;

    let mut name = OsString::from(stem);
    name.push(suffix);
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    Ok(path.with_file_name(name))
}

/// Returns a fresh temporary sibling of `input`.
#[must_use]
pub fn temporary_path(input: &Path) -> PathBuf {
    input.with_file_name(format!("tmp-{}", Uuid::new_v4()))
}
