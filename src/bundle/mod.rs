//! Packaging of agents and workflows into the embedded store.
//!
//! A build reads the agent index and every workflow descriptor under the
//! configured roots, copies the referenced files into the store, writes
//! `manifest.json`, and then validates the result against the files on disk.
//! File-level problems become [`BuildWarning`]s; anything that makes the
//! bundle unusable is a [`BuildError`].

pub mod agents;
pub mod copy;
pub mod error;
pub mod manifest;
pub mod validate;
pub mod version;
pub mod workflows;

pub use copy::CopyOutcome;
pub use error::{BuildError, BuildWarning};
pub use manifest::{AgentEntry, Manifest, ManifestStats, WorkflowEntry, MANIFEST_SCHEMA_VERSION};
pub use validate::{validate_bundle, ValidationRules};

use crate::config::{manifest_path, PackConfig, PackLayout, AGENTS_DIR, WORKFLOWS_DIR};
use crate::shared::clock::{iso_timestamp, Clock};
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::sandbox::normalize_root;
use error::io_error;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Delete the store before building.
    pub clean: bool,
    /// Copy every file regardless of modification times.
    pub force: bool,
}

/// Accumulator for one build invocation.
#[derive(Debug, Default)]
pub struct BuildState {
    pub agents: Vec<AgentEntry>,
    pub workflows: Vec<WorkflowEntry>,
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub warnings: Vec<BuildWarning>,
}

impl BuildState {
    pub(crate) fn record_copy(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.files_copied += 1,
            CopyOutcome::UpToDate => self.files_unchanged += 1,
        }
    }

    pub(crate) fn warn(&mut self, warning: BuildWarning) {
        tracing::warn!(%warning, "build warning");
        self.warnings.push(warning);
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub warnings: Vec<BuildWarning>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Build summary:".to_string(),
            format!("  duration: {:.2}s", self.duration.as_secs_f64()),
            format!("  files copied: {}", self.files_copied),
            format!("  files up to date: {}", self.files_unchanged),
            format!("  agents: {}", self.manifest.agents.len()),
            format!("  workflows: {}", self.manifest.workflows.len()),
        ];
        if !self.warnings.is_empty() {
            lines.push(format!("  warnings: {}", self.warnings.len()));
            lines.extend(self.warnings.iter().map(|w| format!("    - {w}")));
        }
        lines
    }
}

/// The store is wiped by `--clean` and overwritten by every build, so it must
/// not be, or contain, any of the inputs.
fn check_store_root(layout: &PackLayout) -> Result<(), BuildError> {
    let unsafe_root = || BuildError::UnsafeStoreRoot {
        store_root: layout.store_root.display().to_string(),
    };
    let store_root = normalize_root(&layout.store_root).map_err(|_| unsafe_root())?;
    let inputs = [&layout.source_root, &layout.agent_index, &layout.version_file]
        .into_iter()
        .chain(layout.workflow_roots.iter().map(|root| &root.path));
    for input in inputs {
        let input = normalize_root(input).map_err(|_| unsafe_root())?;
        if input.starts_with(&store_root) {
            return Err(unsafe_root());
        }
    }
    Ok(())
}

/// Runs a full build: clean, copy agents, copy workflows, write the manifest,
/// validate. The store is left as-is on failure; rebuilding is the recovery.
pub fn build_bundle(
    config: &PackConfig,
    layout: &PackLayout,
    options: BuildOptions,
    clock: &dyn Clock,
) -> Result<BuildReport, BuildError> {
    let started = Instant::now();
    tracing::info!(
        source_root = %layout.source_root.display(),
        store_root = %layout.store_root.display(),
        clean = options.clean,
        force = options.force,
        "starting bundle build"
    );

    check_store_root(layout)?;
    if options.clean && layout.store_root.exists() {
        fs::remove_dir_all(&layout.store_root).map_err(|err| io_error(&layout.store_root, err))?;
        tracing::info!("cleaned embedded store");
    }
    for dir in [
        layout.store_root.clone(),
        layout.store_root.join(AGENTS_DIR),
        layout.store_root.join(WORKFLOWS_DIR),
    ] {
        fs::create_dir_all(&dir).map_err(|err| io_error(&dir, err))?;
    }

    let mut state = BuildState::default();
    agents::copy_agents(layout, options.force, &mut state)?;
    workflows::copy_workflows(layout, options.force, &mut state)?;

    let source_version = version::read_source_version(&layout.version_file)?;
    let mut manifest = Manifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        build_timestamp: iso_timestamp(clock.now()),
        source_version,
        stats: ManifestStats {
            total_agents: state.agents.len(),
            total_workflows: state.workflows.len(),
            total_files: state.files_copied + state.files_unchanged,
        },
        agents: std::mem::take(&mut state.agents),
        workflows: std::mem::take(&mut state.workflows),
    };
    manifest.sort_entries();

    let path = manifest_path(&layout.store_root);
    let text = manifest
        .to_pretty_json()
        .map_err(|source| BuildError::ManifestEncode {
            path: path.display().to_string(),
            source,
        })?;
    atomic_write_file(&path, text.as_bytes())
        .map_err(|err| io_error(&path, err))?;
    tracing::info!(
        agents = manifest.stats.total_agents,
        workflows = manifest.stats.total_workflows,
        files = manifest.stats.total_files,
        "wrote manifest"
    );

    let manifest = validate_bundle(
        &layout.store_root,
        ValidationRules {
            min_agents: config.min_agents,
            required_workflow: &config.required_workflow,
        },
    )?;
    tracing::info!("bundle validation passed");

    Ok(BuildReport {
        manifest_path: path,
        manifest,
        files_copied: state.files_copied,
        files_unchanged: state.files_unchanged,
        warnings: state.warnings,
        duration: started.elapsed(),
    })
}
