use super::error::CatalogError;
use super::index::{IndexedWorkflow, WorkflowIndex};
use crate::bundle::manifest::{missing_fields, Manifest, DISCOVERY_REQUIRED_FIELDS};
use crate::config::{manifest_path, INSTRUCTIONS_FILE_NAME, WORKFLOW_DESCRIPTOR_FILE_NAME};
use crate::shared::sandbox::{confine, normalize_root};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `manifest.json` under `store_root` and resolves every workflow
/// directory inside the store.
pub fn load(store_root: &Path) -> Result<WorkflowIndex, CatalogError> {
    let store_root = normalize_root(store_root)?;
    let path = manifest_path(&store_root);
    let display_path = path.display().to_string();
    if !path.is_file() {
        return Err(CatalogError::ManifestMissing { path: display_path });
    }
    let raw = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: display_path.clone(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| CatalogError::ManifestParse {
        path: display_path.clone(),
        source,
    })?;
    if let Some(field) = missing_fields(&value, DISCOVERY_REQUIRED_FIELDS).first() {
        return Err(CatalogError::ManifestSchema {
            path: display_path,
            field: field.to_string(),
        });
    }
    let manifest: Manifest =
        serde_json::from_value(value).map_err(|source| CatalogError::ManifestParse {
            path: display_path.clone(),
            source,
        })?;

    let mut workflows = Vec::with_capacity(manifest.workflows.len());
    for entry in manifest.workflows {
        let dir = confine(&store_root, Path::new(&entry.embedded_path))?;
        let descriptor_path = existing_file(dir.join(WORKFLOW_DESCRIPTOR_FILE_NAME));
        let instructions_path = existing_file(dir.join(INSTRUCTIONS_FILE_NAME));
        workflows.push(IndexedWorkflow {
            title: if entry.title.trim().is_empty() {
                entry.slug.to_string()
            } else {
                entry.title
            },
            module: entry.module,
            slug: entry.slug,
            dir,
            descriptor_path,
            instructions_path,
        });
    }

    tracing::info!(
        manifest = %display_path,
        schema_version = %manifest.schema_version,
        workflows = workflows.len(),
        agents = manifest.agents.len(),
        "loaded embedded manifest"
    );
    Ok(WorkflowIndex {
        store_root,
        schema_version: manifest.schema_version,
        source_version: manifest.source_version,
        workflows,
        agents: manifest.agents,
    })
}

fn existing_file(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}
