use crate::bundle::AgentEntry;
use crate::shared::ids::{ModuleName, WorkflowSlug};
use std::path::PathBuf;

/// A manifest workflow with its files resolved against the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedWorkflow {
    pub module: ModuleName,
    pub slug: WorkflowSlug,
    pub title: String,
    pub dir: PathBuf,
    pub descriptor_path: Option<PathBuf>,
    pub instructions_path: Option<PathBuf>,
}

impl IndexedWorkflow {
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.module, self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowIndex {
    pub store_root: PathBuf,
    pub schema_version: String,
    pub source_version: String,
    pub workflows: Vec<IndexedWorkflow>,
    pub agents: Vec<AgentEntry>,
}

impl WorkflowIndex {
    pub fn find(&self, module: &str, slug: &str) -> Option<&IndexedWorkflow> {
        let slug = slug.trim().to_ascii_lowercase();
        self.workflows
            .iter()
            .find(|wf| wf.module.as_str() == module.trim() && wf.slug.as_str() == slug)
    }

    /// First workflow in manifest order whose slug matches, regardless of module.
    pub fn find_by_slug(&self, slug: &str) -> Option<&IndexedWorkflow> {
        let slug = slug.trim().to_ascii_lowercase();
        self.workflows.iter().find(|wf| wf.slug.as_str() == slug)
    }

    pub fn list<'a>(
        &'a self,
        module: Option<&'a str>,
    ) -> impl Iterator<Item = &'a IndexedWorkflow> + 'a {
        let module = module.map(str::trim).filter(|value| !value.is_empty());
        self.workflows
            .iter()
            .filter(move |wf| module.is_none_or(|m| wf.module.as_str() == m))
    }

    /// Case-insensitive match on the agent name or its display name.
    pub fn find_agent(&self, requested: &str) -> Option<&AgentEntry> {
        let needle = requested.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.agents.iter().find(|agent| {
            agent.name.as_str() == needle || agent.display_name.to_lowercase() == needle
        })
    }
}

/// Entry point advertised for one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub title: String,
    pub description: String,
    pub module: ModuleName,
    pub slug: WorkflowSlug,
}

/// One `run-{module}-{slug}` descriptor per indexed workflow, in index order.
pub fn operation_descriptors(index: &WorkflowIndex) -> Vec<OperationDescriptor> {
    index
        .workflows
        .iter()
        .map(|wf| OperationDescriptor {
            name: operation_name(&wf.module, &wf.slug),
            title: if wf.title.trim().is_empty() {
                format!("Run {}", wf.qualified_name())
            } else {
                wf.title.clone()
            },
            description: format!("{} prompt pack", wf.qualified_name()),
            module: wf.module.clone(),
            slug: wf.slug.clone(),
        })
        .collect()
}

pub fn operation_name(module: &ModuleName, slug: &WorkflowSlug) -> String {
    format!("run-{module}-{slug}")
        .chars()
        .map(|ch| {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect()
}
