//! Path confinement.
//!
//! Every path the crate reads from the embedded store or writes into a caller
//! workspace goes through [`confine`]. Normalization is lexical: `.` and `..`
//! components are folded before the prefix check and symlinks are not
//! followed.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("path `{path}` resolves outside `{root}`")]
    PathEscape { root: String, path: String },
    #[error("path validation failed for `{path}`: {reason}")]
    Invalid { path: String, reason: String },
}

/// Resolves `candidate` against `root` and returns the absolute result, or
/// fails when it does not lie strictly beneath `root`.
pub fn confine(root: &Path, candidate: &Path) -> Result<PathBuf, SandboxError> {
    let root = normalize_root(root)?;
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    // `joined` is absolute, so the only failure left is climbing above `/`.
    let resolved = normalize_absolute_path(&joined).map_err(|_| SandboxError::PathEscape {
        root: root.display().to_string(),
        path: joined.display().to_string(),
    })?;
    if has_root_prefix(&root, &resolved) {
        Ok(resolved)
    } else {
        Err(SandboxError::PathEscape {
            root: root.display().to_string(),
            path: resolved.display().to_string(),
        })
    }
}

/// Absolute, lexically normalized form of a sandbox root.
pub fn normalize_root(root: &Path) -> Result<PathBuf, SandboxError> {
    let absolute = std::path::absolute(root).map_err(|err| SandboxError::Invalid {
        path: root.display().to_string(),
        reason: err.to_string(),
    })?;
    normalize_absolute_path(&absolute)
}

pub fn normalize_absolute_path(path: &Path) -> Result<PathBuf, SandboxError> {
    if !path.is_absolute() {
        return Err(SandboxError::Invalid {
            path: path.display().to_string(),
            reason: "path must be absolute".to_string(),
        });
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Normal(v) => normalized.push(v),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(SandboxError::Invalid {
                        path: path.display().to_string(),
                        reason: "path escapes filesystem root".to_string(),
                    });
                }
            }
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
        }
    }
    Ok(normalized)
}

// `/a/bc` must not pass for root `/a/b`, so the comparison is done against the
// root with a trailing separator appended.
fn has_root_prefix(root: &Path, resolved: &Path) -> bool {
    let mut prefix = OsString::from(root.as_os_str());
    if !root.as_os_str().to_string_lossy().ends_with(MAIN_SEPARATOR) {
        prefix.push(MAIN_SEPARATOR.to_string());
    }
    resolved
        .as_os_str()
        .to_string_lossy()
        .starts_with(prefix.to_string_lossy().as_ref())
}
