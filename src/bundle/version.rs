use super::error::BuildError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Reads the repository version from `package.json` (`version`) or a Cargo
/// manifest (`[package].version`, falling back to `[workspace.package]`).
pub fn read_source_version(path: &Path) -> Result<String, BuildError> {
    let failure = |reason: String| BuildError::SourceVersion {
        path: path.display().to_string(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|err| failure(err.to_string()))?;

    let version = if path.file_name().is_some_and(|name| name == "Cargo.toml") {
        let manifest: toml::Value = toml::from_str(&raw).map_err(|err| failure(err.to_string()))?;
        manifest
            .get("package")
            .and_then(|package| package.get("version"))
            .or_else(|| {
                manifest
                    .get("workspace")
                    .and_then(|workspace| workspace.get("package"))
                    .and_then(|package| package.get("version"))
            })
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    } else {
        let manifest: Value = serde_json::from_str(&raw).map_err(|err| failure(err.to_string()))?;
        manifest
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| failure("no version field".to_string()))
}
