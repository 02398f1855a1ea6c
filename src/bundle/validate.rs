use super::error::BuildError;
use super::manifest::{missing_fields, Manifest, BUILD_REQUIRED_FIELDS};
use crate::config::{manifest_path, RequiredWorkflow, WORKFLOW_DESCRIPTOR_FILE_NAME};
use crate::shared::sandbox::confine;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct ValidationRules<'a> {
    pub min_agents: usize,
    pub required_workflow: &'a RequiredWorkflow,
}

/// Re-reads the manifest under `store_root` and checks it against the bundle
/// on disk. Every violation is collected before failing.
pub fn validate_bundle(store_root: &Path, rules: ValidationRules<'_>) -> Result<Manifest, BuildError> {
    let path = manifest_path(store_root);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            return Err(BuildError::Validation(vec![format!(
                "manifest.json not readable at {}: {err}",
                path.display()
            )]))
        }
    };
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| BuildError::Validation(vec![format!("manifest.json is not valid json: {err}")]))?;

    let missing = missing_fields(&value, BUILD_REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(BuildError::Validation(
            missing
                .into_iter()
                .map(|field| format!("manifest missing `{field}`"))
                .collect(),
        ));
    }
    let manifest: Manifest = serde_json::from_value(value)
        .map_err(|err| BuildError::Validation(vec![format!("manifest entries malformed: {err}")]))?;

    let errors = check_manifest(store_root, &manifest, rules);
    if errors.is_empty() {
        Ok(manifest)
    } else {
        Err(BuildError::Validation(errors))
    }
}

fn check_manifest(store_root: &Path, manifest: &Manifest, rules: ValidationRules<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if manifest.agents.len() < rules.min_agents {
        errors.push(format!(
            "agents below minimum: found {}, expected at least {}",
            manifest.agents.len(),
            rules.min_agents
        ));
    }

    let required = rules.required_workflow;
    if !manifest
        .workflows
        .iter()
        .any(|w| w.module == required.module && w.slug == required.slug)
    {
        errors.push(format!(
            "required workflow `{}/{}` not found in manifest",
            required.module, required.slug
        ));
    }

    let mut embedded_paths = HashSet::new();
    for agent in &manifest.agents {
        if !embedded_paths.insert(agent.embedded_path.as_str()) {
            errors.push(format!(
                "agent `{}` shares embedded path {} with another agent",
                agent.name, agent.embedded_path
            ));
        }
        check_file(store_root, &agent.embedded_path, "agent file", &mut errors);
    }

    for workflow in &manifest.workflows {
        match confine(store_root, Path::new(&workflow.embedded_path)) {
            Ok(dir) if dir.is_dir() => {
                if !dir.join(WORKFLOW_DESCRIPTOR_FILE_NAME).is_file() {
                    errors.push(format!(
                        "workflow file missing: {}/{WORKFLOW_DESCRIPTOR_FILE_NAME}",
                        workflow.embedded_path
                    ));
                }
            }
            Ok(_) => errors.push(format!(
                "workflow directory missing: {}",
                workflow.embedded_path
            )),
            Err(err) => errors.push(err.to_string()),
        }
        if let Some(instructions) = &workflow.instructions_path {
            check_file(store_root, instructions, "workflow file", &mut errors);
        }
    }

    errors
}

fn check_file(store_root: &Path, relative: &str, label: &str, errors: &mut Vec<String>) {
    match confine(store_root, Path::new(relative)) {
        Ok(path) if path.is_file() => {}
        Ok(_) => errors.push(format!("{label} missing: {relative}")),
        Err(err) => errors.push(err.to_string()),
    }
}
