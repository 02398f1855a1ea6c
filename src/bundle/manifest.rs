use crate::shared::ids::{AgentName, ModuleName, WorkflowSlug};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MANIFEST_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEntry {
    pub name: AgentName,
    pub display_name: String,
    pub module: ModuleName,
    /// Relative to the store root, always `/`-separated.
    pub embedded_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEntry {
    pub module: ModuleName,
    pub slug: WorkflowSlug,
    pub title: String,
    pub embedded_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_descriptor_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStats {
    pub total_agents: usize,
    pub total_workflows: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: String,
    #[serde(default)]
    pub build_timestamp: String,
    #[serde(default)]
    pub source_version: String,
    pub agents: Vec<AgentEntry>,
    pub workflows: Vec<WorkflowEntry>,
    #[serde(default)]
    pub stats: ManifestStats,
}

impl Manifest {
    /// Agents by name, workflows by `(module, slug)`. Listing order downstream
    /// depends on this.
    pub fn sort_entries(&mut self) {
        self.agents.sort_by(|a, b| a.name.cmp(&b.name));
        self.workflows
            .sort_by(|a, b| (&a.module, &a.slug).cmp(&(&b.module, &b.slug)));
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self).map(|mut text| {
            text.push('\n');
            text
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Array,
}

/// Fields a runtime reader cannot do without.
pub const DISCOVERY_REQUIRED_FIELDS: &[(&str, FieldKind)] = &[
    ("workflows", FieldKind::Array),
    ("agents", FieldKind::Array),
    ("schemaVersion", FieldKind::String),
];

/// Fields a freshly built manifest must carry.
pub const BUILD_REQUIRED_FIELDS: &[(&str, FieldKind)] = &[
    ("schemaVersion", FieldKind::String),
    ("buildTimestamp", FieldKind::String),
    ("sourceVersion", FieldKind::String),
    ("agents", FieldKind::Array),
    ("workflows", FieldKind::Array),
];

/// Returns the fields from `required` that are absent, empty, or of the wrong
/// JSON type, in the order given.
pub fn missing_fields(value: &Value, required: &[(&'static str, FieldKind)]) -> Vec<&'static str> {
    required
        .iter()
        .filter(|(field, kind)| {
            let present = match (value.get(field), kind) {
                (Some(Value::String(text)), FieldKind::String) => !text.trim().is_empty(),
                (Some(Value::Array(_)), FieldKind::Array) => true,
                _ => false,
            };
            !present
        })
        .map(|(field, _)| *field)
        .collect()
}
