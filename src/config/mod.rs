pub mod error;
pub mod paths;

pub use error::ConfigError;
pub use paths::{
    manifest_path, pack_config_path, AGENTS_DIR, CORE_MODULE, BUNDLED_AGENT_INDEX_NAME, INSTRUCTIONS_FILE_NAME,
    MANIFEST_FILE_NAME, PACK_CONFIG_FILE_NAME, STORE_DIR_ENV, WORKFLOWS_DIR,
    WORKFLOW_DESCRIPTOR_FILE_NAME,
};

use crate::shared::ids::{ModuleName, WorkflowSlug};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A directory scanned for workflow descriptors. With `module` unset the
/// first path segment beneath `path` names the owning module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowRootConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub module: Option<ModuleName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredWorkflow {
    pub module: ModuleName,
    pub slug: WorkflowSlug,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PackConfig {
    pub store_dir: PathBuf,
    pub agent_index: PathBuf,
    pub version_file: PathBuf,
    pub workflow_roots: Vec<WorkflowRootConfig>,
    pub min_agents: usize,
    pub required_workflow: RequiredWorkflow,
    pub output_dir: PathBuf,
    pub readme_excerpt_lines: usize,
    pub default_agent: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(paths::DEFAULT_STORE_DIR),
            agent_index: PathBuf::from(paths::DEFAULT_AGENT_INDEX),
            version_file: PathBuf::from(paths::DEFAULT_VERSION_FILE),
            workflow_roots: vec![
                WorkflowRootConfig {
                    path: PathBuf::from(paths::DEFAULT_CORE_WORKFLOWS_ROOT),
                    module: Some(ModuleName::from_static(CORE_MODULE)),
                },
                WorkflowRootConfig {
                    path: PathBuf::from(paths::DEFAULT_MODULES_ROOT),
                    module: None,
                },
            ],
            min_agents: 10,
            required_workflow: RequiredWorkflow {
                module: ModuleName::from_static(CORE_MODULE),
                slug: WorkflowSlug::from_static(paths::DEFAULT_REQUIRED_WORKFLOW),
            },
            output_dir: PathBuf::from(paths::DEFAULT_OUTPUT_DIR),
            readme_excerpt_lines: 30,
            default_agent: "bmad-master".to_string(),
        }
    }
}

impl PackConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("store_dir", &self.store_dir),
            ("agent_index", &self.agent_index),
            ("version_file", &self.version_file),
            ("output_dir", &self.output_dir),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("`{field}` must be non-empty")));
            }
        }
        if !is_plain_relative(&self.output_dir) {
            return Err(ConfigError::Invalid(
                "`output_dir` must be relative and must not contain `..`".to_string(),
            ));
        }
        if self
            .store_dir
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(ConfigError::Invalid(
                "`store_dir` must not contain `..`".to_string(),
            ));
        }
        if self.workflow_roots.is_empty() {
            return Err(ConfigError::Invalid(
                "`workflow_roots` must list at least one directory".to_string(),
            ));
        }
        for root in &self.workflow_roots {
            if root.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "`workflow_roots[].path` must be non-empty".to_string(),
                ));
            }
        }
        if self.default_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "`default_agent` must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads `<source_root>/agentpack.yaml` when present, defaults otherwise.
    pub fn load_for_source(source_root: &Path) -> Result<Self, ConfigError> {
        let path = pack_config_path(source_root);
        let config = if path.is_file() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn layout(&self, source_root: &Path) -> Result<PackLayout, ConfigError> {
        let source_root =
            std::path::absolute(source_root).map_err(|source| ConfigError::SourceRoot {
                path: source_root.display().to_string(),
                source,
            })?;
        let store_dir = std::env::var_os(STORE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.store_dir.clone());
        Ok(PackLayout {
            store_root: source_root.join(store_dir),
            agent_index: source_root.join(&self.agent_index),
            version_file: source_root.join(&self.version_file),
            workflow_roots: self
                .workflow_roots
                .iter()
                .map(|root| WorkflowRoot {
                    path: source_root.join(&root.path),
                    module: root.module.clone(),
                })
                .collect(),
            source_root,
        })
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRoot {
    pub path: PathBuf,
    pub module: Option<ModuleName>,
}

/// Absolute locations derived from a [`PackConfig`] and a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLayout {
    pub source_root: PathBuf,
    pub store_root: PathBuf,
    pub agent_index: PathBuf,
    pub version_file: PathBuf,
    pub workflow_roots: Vec<WorkflowRoot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_when_no_config_file_exists() {
        let dir = tempdir().expect("tempdir");
        let config = PackConfig::load_for_source(dir.path()).expect("load");
        assert_eq!(config, PackConfig::default());
        assert_eq!(config.min_agents, 10);
        assert_eq!(config.required_workflow.slug.as_str(), "party-mode");
    }

    #[test]
    fn builtin_defaults_are_valid_identifiers() {
        let config = PackConfig::default();
        let required = &config.required_workflow;
        assert_eq!(ModuleName::parse(CORE_MODULE).as_ref(), Ok(&required.module));
        assert_eq!(
            WorkflowSlug::parse(paths::DEFAULT_REQUIRED_WORKFLOW).as_ref(),
            Ok(&required.slug)
        );
        assert_eq!(
            config.workflow_roots[0].module.as_ref().map(ModuleName::as_str),
            Some(CORE_MODULE)
        );
    }

    #[test]
    fn partial_yaml_overrides_merge_with_defaults() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            pack_config_path(dir.path()),
            "min_agents: 2\nworkflow_roots:\n  - path: flows\n    module: core\n",
        )
        .expect("write config");

        let config = PackConfig::load_for_source(dir.path()).expect("load");
        assert_eq!(config.min_agents, 2);
        assert_eq!(config.workflow_roots.len(), 1);
        assert_eq!(config.store_dir, PathBuf::from("embedded"));
    }

    #[test]
    fn output_dir_must_stay_relative() {
        let config = PackConfig {
            output_dir: PathBuf::from("../docs"),
            ..PackConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn store_dir_must_not_climb_out_of_the_source_root() {
        let dir = tempdir().expect("tempdir");
        fs::write(pack_config_path(dir.path()), "store_dir: ..\n").expect("write config");
        assert!(matches!(
            PackConfig::load_for_source(dir.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn invalid_module_in_yaml_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            pack_config_path(dir.path()),
            "workflow_roots:\n  - path: flows\n    module: ../evil\n",
        )
        .expect("write config");
        assert!(matches!(
            PackConfig::load_for_source(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
