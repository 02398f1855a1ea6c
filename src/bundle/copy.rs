use super::error::{io_error, BuildError};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    UpToDate,
}

/// Copies `source` over `target` when forced, when `target` is missing, or
/// when `source` was modified after `target`.
pub fn copy_if_newer(source: &Path, target: &Path, force: bool) -> Result<CopyOutcome, BuildError> {
    if !needs_copy(source, target, force)? {
        return Ok(CopyOutcome::UpToDate);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
    }
    fs::copy(source, target).map_err(|err| io_error(source, err))?;
    Ok(CopyOutcome::Copied)
}

fn needs_copy(source: &Path, target: &Path, force: bool) -> Result<bool, BuildError> {
    if force {
        return Ok(true);
    }
    let target_meta = match fs::metadata(target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(io_error(target, err)),
    };
    let source_meta = fs::metadata(source).map_err(|err| io_error(source, err))?;
    let source_mtime = source_meta.modified().map_err(|err| io_error(source, err))?;
    let target_mtime = target_meta.modified().map_err(|err| io_error(target, err))?;
    Ok(source_mtime > target_mtime)
}
