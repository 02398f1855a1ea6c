//! Operation surface over the catalog, the renderer and the output registry.
//!
//! [`PackService`] is what a host embeds: it resolves workflow and agent
//! references, runs workflows into prompt packs, and routes free-form
//! requests through the intent table.

pub mod error;
pub mod routing;

pub use error::ServiceError;
pub use routing::{default_intent_rules, master_trigger, match_intent, IntentRule, IntentTarget};

use crate::catalog::{operation_descriptors, Catalog, IndexedWorkflow, OperationDescriptor, WorkflowIndex};
use crate::config::{PackConfig, CORE_MODULE};
use crate::render::{OutputId, OutputRegistry, PromptPackRenderer, RenderRequest};
use crate::shared::clock::Clock;
use crate::shared::ids::{AgentName, ModuleName, WorkflowSlug};
use crate::shared::sandbox::confine;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_AGENT: &str = "bmad-master";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSummary {
    pub module: ModuleName,
    pub slug: WorkflowSlug,
    pub title: String,
    pub has_instructions: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunWorkflowRequest {
    /// `slug`, `module:slug` or `module/slug`.
    pub workflow: String,
    pub inputs: Option<Value>,
    pub working_dir: PathBuf,
    pub target_path: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkflowOutcome {
    pub path: Option<PathBuf>,
    pub bytes: usize,
    pub summary: String,
    pub module: ModuleName,
    pub slug: WorkflowSlug,
    /// Set only when a document was written.
    pub output_id: Option<OutputId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAgent {
    pub name: AgentName,
    pub display_name: String,
    pub module: ModuleName,
    pub path: PathBuf,
    pub markdown: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchRequest {
    pub message: Option<String>,
    pub agent: Option<String>,
    pub workflow: Option<String>,
    pub inputs: Option<Value>,
    pub working_dir: PathBuf,
    pub target_path: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Workflow(RunWorkflowOutcome),
    Agent(LoadedAgent),
    /// Nothing matched; the default agent is loaded with the request echoed.
    Fallback { message: String, agent: LoadedAgent },
}

pub struct PackService {
    catalog: Catalog,
    renderer: PromptPackRenderer,
    outputs: OutputRegistry,
    intents: Vec<IntentRule>,
    default_agent: String,
}

impl PackService {
    pub fn new(catalog: Catalog, renderer: PromptPackRenderer, outputs: OutputRegistry) -> Self {
        Self {
            catalog,
            renderer,
            outputs,
            intents: default_intent_rules(),
            default_agent: DEFAULT_AGENT.to_string(),
        }
    }

    /// Opens the catalog at `store_root` and wires a renderer from `config`.
    pub fn open(
        config: &PackConfig,
        store_root: &Path,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        let catalog = Catalog::open(store_root)?;
        let renderer = PromptPackRenderer::new(
            clock,
            config.output_dir.clone(),
            config.readme_excerpt_lines,
        );
        Ok(Self::new(catalog, renderer, OutputRegistry::new())
            .with_default_agent(&config.default_agent))
    }

    pub fn with_intent_rules(mut self, rules: Vec<IntentRule>) -> Self {
        self.intents = rules;
        self
    }

    pub fn with_default_agent(mut self, name: &str) -> Self {
        self.default_agent = name.trim().to_string();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    pub fn list_workflows(&self, module: Option<&str>) -> Vec<WorkflowSummary> {
        self.catalog
            .current()
            .list(module)
            .map(|wf| WorkflowSummary {
                module: wf.module.clone(),
                slug: wf.slug.clone(),
                title: wf.title.clone(),
                has_instructions: wf.instructions_path.is_some(),
            })
            .collect()
    }

    /// Per-workflow entry points for the current index.
    pub fn operations(&self) -> Vec<OperationDescriptor> {
        operation_descriptors(&self.catalog.current())
    }

    pub fn run_workflow(
        &self,
        request: RunWorkflowRequest,
    ) -> Result<RunWorkflowOutcome, ServiceError> {
        let index = self.catalog.current();
        let workflow = resolve_workflow(&index, &request.workflow)?;
        let outcome = self.renderer.render(RenderRequest {
            workflow,
            inputs: request.inputs.as_ref(),
            working_dir: &request.working_dir,
            target_path: request.target_path.as_deref(),
            dry_run: request.dry_run,
        })?;
        let output_id = outcome.path.as_deref().map(|path| self.outputs.register(path));
        Ok(RunWorkflowOutcome {
            path: outcome.path,
            bytes: outcome.bytes,
            summary: outcome.summary,
            module: workflow.module.clone(),
            slug: workflow.slug.clone(),
            output_id,
        })
    }

    pub fn load_agent(&self, requested: &str) -> Result<LoadedAgent, ServiceError> {
        let index = self.catalog.current();
        let Some(entry) = index.find_agent(requested) else {
            return Err(ServiceError::AgentNotFound {
                requested: requested.to_string(),
                available: index
                    .agents
                    .iter()
                    .map(|agent| format!("{} ({})", agent.name, agent.display_name))
                    .collect(),
            });
        };
        let path = confine(&index.store_root, Path::new(&entry.embedded_path))?;
        let markdown = fs::read_to_string(&path).map_err(|source| ServiceError::AgentRead {
            agent: entry.name.to_string(),
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(agent = %entry.name, path = %path.display(), "loaded agent");
        Ok(LoadedAgent {
            name: entry.name.clone(),
            display_name: entry.display_name.clone(),
            module: entry.module.clone(),
            path,
            markdown,
        })
    }

    pub fn reload(&self) -> Result<usize, ServiceError> {
        Ok(self.catalog.reload()?)
    }

    /// Accepts a bare id or an `agentpack://output/{id}` URI.
    pub fn read_output(&self, id: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.outputs.read(id)?)
    }

    /// Explicit workflow, then explicit agent, then intent routing of the
    /// message, then the default agent.
    pub fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, ServiceError> {
        let DispatchRequest {
            message,
            agent,
            workflow,
            inputs,
            working_dir,
            target_path,
            dry_run,
        } = request;
        let run = |workflow: &str, inputs: Option<Value>| {
            self.run_workflow(RunWorkflowRequest {
                workflow: workflow.to_string(),
                inputs,
                working_dir: working_dir.clone(),
                target_path: target_path.clone(),
                dry_run,
            })
            .map(DispatchOutcome::Workflow)
        };

        if let Some(workflow) = non_blank(workflow.as_deref()) {
            return run(workflow, inputs);
        }
        if let Some(agent) = non_blank(agent.as_deref()) {
            return self.load_agent(agent).map(DispatchOutcome::Agent);
        }
        let message = non_blank(message.as_deref()).map(str::to_string);
        if let Some(message) = &message {
            if let Some(slug) = master_trigger(message) {
                tracing::debug!(slug, "master command");
                return run(&format!("{CORE_MODULE}:{slug}"), inputs);
            }
            if let Some(rule) = match_intent(&self.intents, message) {
                tracing::debug!(keyword = %rule.keyword, "matched intent rule");
                match rule.target(inputs.is_some()) {
                    Some(IntentTarget::RunWorkflow(workflow)) => return run(workflow, inputs),
                    Some(IntentTarget::LoadAgent(agent)) => {
                        return self.load_agent(agent).map(DispatchOutcome::Agent)
                    }
                    None => {}
                }
            }
        }

        let agent = self.load_agent(&self.default_agent)?;
        Ok(match message {
            Some(message) => DispatchOutcome::Fallback { message, agent },
            None => DispatchOutcome::Agent(agent),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Slug first across all modules, then `module:slug` or `module/slug`.
pub fn resolve_workflow<'a>(
    index: &'a WorkflowIndex,
    requested: &str,
) -> Result<&'a IndexedWorkflow, ServiceError> {
    let requested = requested.trim();
    let found = index.find_by_slug(requested).or_else(|| {
        let (module, slug) = requested.split_once([':', '/'])?;
        index.find(module, slug)
    });
    found.ok_or_else(|| ServiceError::WorkflowNotFound {
        requested: requested.to_string(),
        available: index
            .workflows
            .iter()
            .map(|wf| format!("{}:{}", wf.module, wf.slug))
            .collect(),
    })
}
