use super::copy::copy_if_newer;
use super::error::{io_error, BuildError, BuildWarning};
use super::manifest::WorkflowEntry;
use super::BuildState;
use crate::config::{
    PackLayout, WorkflowRoot, INSTRUCTIONS_FILE_NAME, WORKFLOWS_DIR, WORKFLOW_DESCRIPTOR_FILE_NAME,
};
use crate::shared::ids::{ModuleName, WorkflowSlug};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];
const SIBLING_EXTENSIONS: &[&str] = &["md", "yaml", "yml", "txt"];

/// The subset of a `workflow.yaml` the packager reads. Everything else in the
/// descriptor is opaque and copied verbatim.
#[derive(Debug, Default, Deserialize)]
pub struct WorkflowDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkflowDescriptor {
    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let descriptor: Option<Self> = serde_yaml::from_str(raw)?;
        Ok(descriptor.unwrap_or_default())
    }

    pub fn display_title(&self) -> Option<String> {
        [&self.title, &self.description, &self.name]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

pub(crate) fn copy_workflows(
    layout: &PackLayout,
    force: bool,
    state: &mut BuildState,
) -> Result<(), BuildError> {
    let mut seen = HashSet::new();
    for root in &layout.workflow_roots {
        if !root.path.is_dir() {
            state.warn(BuildWarning::MissingWorkflowRoot {
                path: root.path.display().to_string(),
            });
            continue;
        }
        let descriptors = find_descriptors(&root.path, state);
        tracing::info!(
            root = %root.path.display(),
            descriptors = descriptors.len(),
            "scanned workflow root"
        );
        for descriptor_path in descriptors {
            bundle_workflow(layout, root, &descriptor_path, force, &mut seen, state)?;
        }
    }
    tracing::info!(workflows = state.workflows.len(), "bundled workflows");
    Ok(())
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Every `workflow.yaml` beneath `root`, in file-name order.
fn find_descriptors(root: &Path, state: &mut BuildState) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry));
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.file_name() == WORKFLOW_DESCRIPTOR_FILE_NAME
                {
                    found.push(entry.into_path());
                }
            }
            Err(err) => state.warn(BuildWarning::WalkFailed {
                path: err
                    .path()
                    .unwrap_or(root)
                    .display()
                    .to_string(),
                reason: err.to_string(),
            }),
        }
    }
    found
}

/// Fixed module for the root if configured, else the first directory beneath
/// the root.
pub fn infer_module(root: &WorkflowRoot, descriptor_path: &Path) -> Option<ModuleName> {
    if let Some(module) = &root.module {
        return Some(module.clone());
    }
    let relative = descriptor_path.parent()?.strip_prefix(&root.path).ok()?;
    match relative.components().next()? {
        Component::Normal(segment) => ModuleName::parse(segment.to_str()?).ok(),
        _ => None,
    }
}

fn bundle_workflow(
    layout: &PackLayout,
    root: &WorkflowRoot,
    descriptor_path: &Path,
    force: bool,
    seen: &mut HashSet<(ModuleName, WorkflowSlug)>,
    state: &mut BuildState,
) -> Result<(), BuildError> {
    let display_path = descriptor_path.display().to_string();
    let descriptor = match fs::read_to_string(descriptor_path)
        .map_err(|err| err.to_string())
        .and_then(|raw| WorkflowDescriptor::parse(&raw).map_err(|err| err.to_string()))
    {
        Ok(descriptor) => descriptor,
        Err(reason) => {
            state.warn(BuildWarning::UnreadableDescriptor {
                path: display_path,
                reason,
            });
            return Ok(());
        }
    };
    let Some(name) = descriptor
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    else {
        state.warn(BuildWarning::DescriptorWithoutName { path: display_path });
        return Ok(());
    };
    let Ok(slug) = WorkflowSlug::parse(name) else {
        state.warn(BuildWarning::InvalidWorkflowSlug {
            name: name.to_string(),
            path: display_path,
        });
        return Ok(());
    };
    let Some(module) = infer_module(root, descriptor_path) else {
        state.warn(BuildWarning::UnresolvedModule { path: display_path });
        return Ok(());
    };
    if !seen.insert((module.clone(), slug.clone())) {
        state.warn(BuildWarning::DuplicateWorkflow {
            module: module.to_string(),
            slug: slug.to_string(),
            path: display_path,
        });
        return Ok(());
    }

    let embedded_path = format!("{WORKFLOWS_DIR}/{module}/{slug}");
    let target_dir = layout.store_root.join(&embedded_path);
    let source_dir = descriptor_path
        .parent()
        .ok_or_else(|| io_error(descriptor_path, std::io::Error::other("no parent")))?;

    state.record_copy(copy_if_newer(
        descriptor_path,
        &target_dir.join(WORKFLOW_DESCRIPTOR_FILE_NAME),
        force,
    )?);

    let instructions_source = source_dir.join(INSTRUCTIONS_FILE_NAME);
    let instructions_path = if instructions_source.is_file() {
        state.record_copy(copy_if_newer(
            &instructions_source,
            &target_dir.join(INSTRUCTIONS_FILE_NAME),
            force,
        )?);
        Some(format!("{embedded_path}/{INSTRUCTIONS_FILE_NAME}"))
    } else {
        None
    };

    for sibling in sibling_files(source_dir)? {
        let Some(file_name) = sibling.file_name() else {
            continue;
        };
        state.record_copy(copy_if_newer(&sibling, &target_dir.join(file_name), force)?);
    }

    state.workflows.push(WorkflowEntry {
        title: descriptor
            .display_title()
            .unwrap_or_else(|| slug.to_string()),
        workflow_descriptor_path: Some(format!("{embedded_path}/{WORKFLOW_DESCRIPTOR_FILE_NAME}")),
        instructions_path,
        embedded_path,
        module,
        slug,
    });
    Ok(())
}

/// Template and note files next to the descriptor, excluding the descriptor and
/// instructions themselves. Not recursive.
fn sibling_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|err| io_error(dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| io_error(dir, err))?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        if file_name == WORKFLOW_DESCRIPTOR_FILE_NAME || file_name == INSTRUCTIONS_FILE_NAME {
            continue;
        }
        let extension = path
            .extension()
            .and_then(|v| v.to_str())
            .map(str::to_ascii_lowercase);
        if extension.is_some_and(|ext| SIBLING_EXTENSIONS.contains(&ext.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
