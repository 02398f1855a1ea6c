use std::path::{Path, PathBuf};

pub const PACK_CONFIG_FILE_NAME: &str = "agentpack.yaml";
pub const STORE_DIR_ENV: &str = "AGENTPACK_STORE";

pub const DEFAULT_STORE_DIR: &str = "embedded";
pub const DEFAULT_AGENT_INDEX: &str = "bmad/_cfg/agent-manifest.csv";
pub const DEFAULT_VERSION_FILE: &str = "package.json";
pub const DEFAULT_CORE_WORKFLOWS_ROOT: &str = "src/core/workflows";
pub const DEFAULT_MODULES_ROOT: &str = "src/modules";
pub const DEFAULT_OUTPUT_DIR: &str = "docs";
pub const CORE_MODULE: &str = "core";
pub const DEFAULT_REQUIRED_WORKFLOW: &str = "party-mode";

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const AGENTS_DIR: &str = "agents";
pub const WORKFLOWS_DIR: &str = "workflows";
pub const BUNDLED_AGENT_INDEX_NAME: &str = "agent-manifest.csv";
pub const WORKFLOW_DESCRIPTOR_FILE_NAME: &str = "workflow.yaml";
pub const INSTRUCTIONS_FILE_NAME: &str = "instructions.md";

pub fn pack_config_path(source_root: &Path) -> PathBuf {
    source_root.join(PACK_CONFIG_FILE_NAME)
}

pub fn manifest_path(store_root: &Path) -> PathBuf {
    store_root.join(MANIFEST_FILE_NAME)
}
