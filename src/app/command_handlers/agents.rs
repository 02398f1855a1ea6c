use super::{open_service, parse_inputs};
use crate::app::cli::{OutputArgs, StoreArgs};
use crate::service::{DispatchOutcome, DispatchRequest, LoadedAgent, RunWorkflowOutcome};

pub fn cmd_agent(store: &StoreArgs, name: &str) -> Result<String, String> {
    let service = open_service(store)?;
    let agent = service.load_agent(name).map_err(|err| err.to_string())?;
    Ok(describe_agent(&agent))
}

pub fn cmd_route(
    store: &StoreArgs,
    message: Option<String>,
    agent: Option<String>,
    workflow: Option<String>,
    output: &OutputArgs,
) -> Result<String, String> {
    let service = open_service(store)?;
    let outcome = service
        .dispatch(DispatchRequest {
            message,
            agent,
            workflow,
            inputs: parse_inputs(output.inputs.as_deref())?,
            working_dir: output.cwd.clone(),
            target_path: output.target.clone(),
            dry_run: output.dry_run,
        })
        .map_err(|err| err.to_string())?;
    Ok(match outcome {
        DispatchOutcome::Workflow(run) => describe_run(&run),
        DispatchOutcome::Agent(agent) => describe_agent(&agent),
        DispatchOutcome::Fallback { message, agent } => format!(
            "User request: \"{message}\"\n\n{}\n\n---\n\nI can help you with this request. What would you like to know?",
            describe_agent(&agent)
        ),
    })
}

fn describe_agent(agent: &LoadedAgent) -> String {
    format!("Loaded agent: {}\n\n{}", agent.display_name, agent.markdown)
}

pub(super) fn describe_run(outcome: &RunWorkflowOutcome) -> String {
    let mut text = format!("{} ({} bytes)", outcome.summary, outcome.bytes);
    if let Some(path) = &outcome.path {
        text.push_str(&format!("\npath: {}", path.display()));
    }
    if let Some(id) = &outcome.output_id {
        text.push_str(&format!("\nuri: {}", id.uri()));
    }
    text
}
