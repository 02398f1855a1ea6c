use super::{open_service, parse_inputs};
use crate::app::cli::{OutputArgs, StoreArgs};
use crate::service::RunWorkflowRequest;
use serde_json::json;

pub fn cmd_list(store: &StoreArgs, module: Option<&str>, as_json: bool) -> Result<String, String> {
    let service = open_service(store)?;
    let workflows = service.list_workflows(module);
    if as_json {
        let items: Vec<_> = workflows
            .iter()
            .map(|wf| {
                json!({
                    "module": wf.module,
                    "slug": wf.slug,
                    "title": wf.title,
                    "hasInstructions": wf.has_instructions,
                })
            })
            .collect();
        return serde_json::to_string_pretty(&items).map_err(|err| err.to_string());
    }
    if workflows.is_empty() {
        return Ok("no workflows".to_string());
    }
    Ok(workflows
        .iter()
        .map(|wf| format!("{}/{}\t{}", wf.module, wf.slug, wf.title))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn cmd_run(store: &StoreArgs, workflow: &str, output: &OutputArgs) -> Result<String, String> {
    let service = open_service(store)?;
    let outcome = service
        .run_workflow(RunWorkflowRequest {
            workflow: workflow.to_string(),
            inputs: parse_inputs(output.inputs.as_deref())?,
            working_dir: output.cwd.clone(),
            target_path: output.target.clone(),
            dry_run: output.dry_run,
        })
        .map_err(|err| err.to_string())?;
    Ok(super::agents::describe_run(&outcome))
}

pub fn cmd_tools(store: &StoreArgs) -> Result<String, String> {
    let service = open_service(store)?;
    let operations = service.operations();
    if operations.is_empty() {
        return Ok("no operations".to_string());
    }
    Ok(operations
        .iter()
        .map(|op| format!("{}\t{}\t{}", op.name, op.title, op.description))
        .collect::<Vec<_>>()
        .join("\n"))
}
