use super::error::{io_error, RenderError};
use super::metadata::{read_project_metadata, read_readme_excerpt};
use crate::catalog::IndexedWorkflow;
use crate::shared::clock::{file_stamp, Clock};
use crate::shared::fs_atomic::{atomic_write_file, ensure_parent_dir};
use crate::shared::sandbox::{confine, normalize_root};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PROMPT_PACK_MARKER: &str = "<!-- agentpack.prompt.v1 -->";

const NEXT_STEPS: [&str; 4] = [
    "---",
    "Next Steps:",
    "- Use this file as the working canvas and draft the output here.",
    "- If the instructions recommend another workflow, run it next with `agentpack run`.",
];

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub workflow: &'a IndexedWorkflow,
    pub inputs: Option<&'a Value>,
    pub working_dir: &'a Path,
    /// Absolute, or relative to `working_dir`.
    pub target_path: Option<&'a Path>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    /// `None` for dry runs.
    pub path: Option<PathBuf>,
    pub resolved_path: PathBuf,
    pub bytes: usize,
    pub summary: String,
}

/// Assembles prompt-pack documents and writes them into a caller's workspace.
pub struct PromptPackRenderer {
    clock: Arc<dyn Clock>,
    output_dir: PathBuf,
    readme_lines: usize,
}

impl PromptPackRenderer {
    pub fn new(clock: Arc<dyn Clock>, output_dir: impl Into<PathBuf>, readme_lines: usize) -> Self {
        Self {
            clock,
            output_dir: output_dir.into(),
            readme_lines,
        }
    }

    pub fn render(&self, request: RenderRequest<'_>) -> Result<RenderOutcome, RenderError> {
        let working_dir = normalize_root(request.working_dir)?;
        let workflow = request.workflow;
        let candidate = match request.target_path {
            Some(target) => target.to_path_buf(),
            None => self
                .output_dir
                .join(workflow.module.as_str())
                .join(format!("{}-{}.md", workflow.slug, file_stamp(self.clock.now()))),
        };
        let resolved = confine(&working_dir, &candidate)?;

        let content = self.assemble(workflow, request.inputs, &working_dir)?;
        let bytes = content.len();
        let label = workflow.qualified_name();

        if request.dry_run {
            tracing::info!(workflow = %label, path = %resolved.display(), bytes, "prepared prompt pack (dry-run)");
            return Ok(RenderOutcome {
                path: None,
                summary: format!("{label} prepared (dry-run) at {}", resolved.display()),
                resolved_path: resolved,
                bytes,
            });
        }

        ensure_parent_dir(&resolved).map_err(|err| io_error(&resolved, err))?;
        atomic_write_file(&resolved, content.as_bytes()).map_err(|err| io_error(&resolved, err))?;
        tracing::info!(workflow = %label, path = %resolved.display(), bytes, "wrote prompt pack");
        Ok(RenderOutcome {
            path: Some(resolved.clone()),
            summary: format!("{label} written at {}", resolved.display()),
            resolved_path: resolved,
            bytes,
        })
    }

    /// Document body. Optional context sources that are missing or invalid are
    /// left out.
    pub fn assemble(
        &self,
        workflow: &IndexedWorkflow,
        inputs: Option<&Value>,
        working_dir: &Path,
    ) -> Result<String, RenderError> {
        let title = if workflow.title.trim().is_empty() {
            workflow.qualified_name()
        } else {
            workflow.title.clone()
        };
        let mut lines = vec![PROMPT_PACK_MARKER.to_string(), format!("# {title}"), String::new()];

        if let Some(metadata) = read_project_metadata(working_dir) {
            let json = serde_json::to_string_pretty(&metadata.fields).map_err(RenderError::Inputs)?;
            lines.push(format!("## Context: {}", metadata.source));
            lines.push("```json".to_string());
            lines.push(json);
            lines.push("```".to_string());
            lines.push(String::new());
        }

        if let Some(excerpt) = read_readme_excerpt(working_dir, self.readme_lines) {
            lines.push("## Context: README excerpt".to_string());
            lines.push("```md".to_string());
            lines.push(excerpt);
            lines.push("```".to_string());
            lines.push(String::new());
        }

        let empty = Value::Object(Default::default());
        let inputs_json = serde_json::to_string_pretty(inputs.unwrap_or(&empty))
            .map_err(RenderError::Inputs)?;
        lines.push("## Inputs".to_string());
        lines.push("```json".to_string());
        lines.push(inputs_json);
        lines.push("```".to_string());
        lines.push(String::new());

        if let Some(path) = &workflow.instructions_path {
            let instructions = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
            lines.push("## Instructions".to_string());
            lines.push(instructions.trim().to_string());
            lines.push(String::new());
        }

        lines.extend(NEXT_STEPS.iter().map(|line| line.to_string()));
        lines.push(String::new());
        Ok(lines.join("\n"))
    }
}
