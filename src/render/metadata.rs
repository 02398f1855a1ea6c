use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const PACKAGE_JSON: &str = "package.json";
const CARGO_TOML: &str = "Cargo.toml";
const README: &str = "README.md";
const CONTEXT_FIELDS: [&str; 3] = ["name", "version", "description"];

/// Project identity found in the working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetadata {
    pub source: &'static str,
    pub fields: Map<String, Value>,
}

/// `package.json` wins; `Cargo.toml` `[package]` is consulted only when there
/// is no `package.json`. Unreadable or malformed files yield `None`.
pub fn read_project_metadata(working_dir: &Path) -> Option<ProjectMetadata> {
    let package_json = working_dir.join(PACKAGE_JSON);
    if package_json.is_file() {
        return read_package_json(&package_json);
    }
    let cargo_toml = working_dir.join(CARGO_TOML);
    if cargo_toml.is_file() {
        return read_cargo_toml(&cargo_toml);
    }
    None
}

fn read_package_json(path: &Path) -> Option<ProjectMetadata> {
    let raw = fs::read_to_string(path).ok()?;
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "skipping invalid package.json");
            return None;
        }
    };
    let object = value.as_object()?;
    let fields = CONTEXT_FIELDS
        .iter()
        .filter_map(|field| {
            object
                .get(*field)
                .filter(|v| !v.is_null())
                .map(|v| (field.to_string(), v.clone()))
        })
        .collect();
    Some(ProjectMetadata {
        source: PACKAGE_JSON,
        fields,
    })
}

fn read_cargo_toml(path: &Path) -> Option<ProjectMetadata> {
    let raw = fs::read_to_string(path).ok()?;
    let document: toml::Table = match raw.parse() {
        Ok(document) => document,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "skipping invalid Cargo.toml");
            return None;
        }
    };
    let package = document.get("package")?.as_table()?;
    // `version.workspace = true` and similar inherited values are not strings
    // and are left out.
    let fields = CONTEXT_FIELDS
        .iter()
        .filter_map(|field| {
            package
                .get(*field)
                .and_then(|v| v.as_str())
                .map(|v| (field.to_string(), Value::String(v.to_string())))
        })
        .collect();
    Some(ProjectMetadata {
        source: CARGO_TOML,
        fields,
    })
}

/// First `lines` lines of `README.md`, if present.
pub fn read_readme_excerpt(working_dir: &Path, lines: usize) -> Option<String> {
    let raw = fs::read_to_string(working_dir.join(README)).ok()?;
    Some(raw.split('\n').take(lines).collect::<Vec<_>>().join("\n"))
}
