use agentpack::config::PackConfig;
use agentpack::service::{DispatchOutcome, DispatchRequest, IntentRule, PackService, ServiceError};
use agentpack::shared::clock::SystemClock;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write fixture");
}

fn seed_store(store: &Path) {
    let agents = [
        ("bmad-master", "BMad Master", "core"),
        ("pm", "John", "bmm"),
        ("analyst", "Mary", "bmm"),
    ];
    let workflows = [("bmm", "prd"), ("cis", "brainstorming"), ("core", "party-mode")];
    for (name, _, module) in agents {
        write(&store.join(format!("agents/{module}/{name}.md")), &format!("# {name}\n"));
    }
    for (module, slug) in workflows {
        write(
            &store.join(format!("workflows/{module}/{slug}/workflow.yaml")),
            &format!("name: {slug}\n"),
        );
    }
    let manifest = json!({
        "schemaVersion": "1.0.0",
        "agents": agents.iter().map(|(name, display, module)| json!({
            "name": name,
            "displayName": display,
            "module": module,
            "embeddedPath": format!("agents/{module}/{name}.md"),
        })).collect::<Vec<_>>(),
        "workflows": workflows.iter().map(|(module, slug)| json!({
            "module": module,
            "slug": slug,
            "title": slug,
            "embeddedPath": format!("workflows/{module}/{slug}"),
        })).collect::<Vec<_>>(),
    });
    write(&store.join("manifest.json"), &manifest.to_string());
}

fn service(store: &Path) -> PackService {
    PackService::open(&PackConfig::default(), store, Arc::new(SystemClock)).expect("open")
}

fn request(work: &Path) -> DispatchRequest {
    DispatchRequest {
        working_dir: work.to_path_buf(),
        dry_run: true,
        ..DispatchRequest::default()
    }
}

fn agent_name(outcome: &DispatchOutcome) -> &str {
    match outcome {
        DispatchOutcome::Agent(agent) => agent.name.as_str(),
        other => panic!("expected agent, got {other:?}"),
    }
}

#[test]
fn explicit_workflow_wins_over_agent_and_message() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            workflow: Some("party-mode".to_string()),
            agent: Some("pm".to_string()),
            message: Some("research the market".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    match outcome {
        DispatchOutcome::Workflow(run) => assert_eq!(run.slug.as_str(), "party-mode"),
        other => panic!("expected workflow, got {other:?}"),
    }
}

#[test]
fn explicit_agent_is_loaded() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            agent: Some("Mary".to_string()),
            message: Some("write a prd".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert_eq!(agent_name(&outcome), "analyst");
}

#[test]
fn intent_runs_workflow_only_when_inputs_are_supplied() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let service = service(dir.path());

    let guidance = service
        .dispatch(DispatchRequest {
            message: Some("Write a PRD for checkout".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert_eq!(agent_name(&guidance), "pm");

    let run = service
        .dispatch(DispatchRequest {
            message: Some("Write a PRD for checkout".to_string()),
            inputs: Some(json!({"feature": "checkout"})),
            ..request(dir.path())
        })
        .expect("dispatch");
    match run {
        DispatchOutcome::Workflow(run) => {
            assert_eq!(run.slug.as_str(), "prd");
            assert!(run.path.is_none());
        }
        other => panic!("expected workflow, got {other:?}"),
    }
}

#[test]
fn workflow_only_rules_run_the_workflow() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            message: Some("let's brainstorm".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert!(matches!(
        outcome,
        DispatchOutcome::Workflow(ref run) if run.slug.as_str() == "brainstorming"
    ));
}

#[test]
fn unmatched_message_falls_back_to_the_default_agent() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            message: Some("hello there".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    match outcome {
        DispatchOutcome::Fallback { message, agent } => {
            assert_eq!(message, "hello there");
            assert_eq!(agent.name.as_str(), "bmad-master");
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[test]
fn empty_request_loads_the_default_agent() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            message: Some("   ".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert_eq!(agent_name(&outcome), "bmad-master");
}

#[test]
fn routed_agent_missing_from_the_store_is_an_error() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let err = service(dir.path())
        .dispatch(DispatchRequest {
            message: Some("run the tests".to_string()),
            ..request(dir.path())
        })
        .expect_err("tea is not bundled");
    assert!(matches!(err, ServiceError::AgentNotFound { ref requested, .. } if requested == "tea"));
}

#[test]
fn custom_rules_and_default_agent_replace_the_builtin_table() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let service = service(dir.path())
        .with_intent_rules(vec![IntentRule::new("party", None, Some("core:party-mode"))])
        .with_default_agent("pm");

    let party = service
        .dispatch(DispatchRequest {
            message: Some("throw a PARTY".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert!(matches!(party, DispatchOutcome::Workflow(_)));

    let fallback = service
        .dispatch(DispatchRequest {
            message: Some("write a prd".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert!(matches!(
        fallback,
        DispatchOutcome::Fallback { ref agent, .. } if agent.name.as_str() == "pm"
    ));
}

#[test]
fn master_command_runs_the_named_core_workflow() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let service = service(dir.path());

    let outcome = service
        .dispatch(DispatchRequest {
            message: Some("/bmad:master *party-mode".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    match outcome {
        DispatchOutcome::Workflow(run) => {
            assert_eq!(run.module.as_str(), "core");
            assert_eq!(run.slug.as_str(), "party-mode");
        }
        other => panic!("expected workflow, got {other:?}"),
    }

    // Only core workflows are reachable, even when a keyword rule would match.
    let err = service
        .dispatch(DispatchRequest {
            message: Some("/bmad:master *brainstorming".to_string()),
            ..request(dir.path())
        })
        .expect_err("brainstorming is not a core workflow");
    assert!(matches!(
        err,
        ServiceError::WorkflowNotFound { ref requested, .. } if requested == "core:brainstorming"
    ));
}

#[test]
fn bare_master_command_loads_the_default_agent() {
    let dir = tempdir().expect("tempdir");
    seed_store(dir.path());
    let outcome = service(dir.path())
        .dispatch(DispatchRequest {
            message: Some("/bmad:master".to_string()),
            ..request(dir.path())
        })
        .expect("dispatch");
    assert!(matches!(
        outcome,
        DispatchOutcome::Fallback { ref agent, .. } if agent.name.as_str() == "bmad-master"
    ));
}
