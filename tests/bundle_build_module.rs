use agentpack::bundle::{build_bundle, BuildError, BuildOptions, BuildWarning, Manifest};
use agentpack::config::{PackConfig, PackLayout};
use agentpack::shared::clock::FixedClock;
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write fixture");
}

fn clock() -> FixedClock {
    FixedClock(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .expect("valid instant")
            + chrono::Duration::milliseconds(250),
    )
}

/// Source tree with `agents` agents, `core/party-mode` and `bmm/prd`.
fn seed_source(root: &Path, agents: usize) {
    write(&root.join("package.json"), r#"{"name":"bmad","version":"6.0.0-alpha.0"}"#);
    let mut index = String::from("name,displayName,title,module,path\n");
    for n in 0..agents {
        let name = format!("agent-{n:02}");
        let path = format!("bmad/bmm/agents/{name}.md");
        index.push_str(&format!("{name},Agent {n},\"Role {n}, senior\",bmm,{path}\n"));
        write(&root.join(&path), &format!("# {name}\n"));
    }
    write(&root.join("bmad/_cfg/agent-manifest.csv"), &index);

    let party = root.join("src/core/workflows/party-mode");
    write(&party.join("workflow.yaml"), "name: party-mode\ndescription: Group discussion\n");
    write(&party.join("instructions.md"), "Gather everyone.\n");

    let prd = root.join("src/modules/bmm/workflows/prd");
    write(&prd.join("workflow.yaml"), "name: prd\ntitle: Product Requirements\n");
    write(&prd.join("instructions.md"), "Write the PRD.\n");
    write(&prd.join("template.md"), "# PRD template\n");
    write(&prd.join("checklist.txt"), "- [ ] done\n");
    write(&prd.join("data.json"), "{}\n");
}

fn layout_for(root: &Path) -> (PackConfig, PackLayout) {
    let config = PackConfig::load_for_source(root).expect("config");
    let layout = config.layout(root).expect("layout");
    (config, layout)
}

fn read_manifest(layout: &PackLayout) -> Manifest {
    let raw = fs::read_to_string(layout.store_root.join("manifest.json")).expect("read manifest");
    serde_json::from_str(&raw).expect("parse manifest")
}

#[test]
fn twelve_agents_with_party_mode_build_and_validate() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let (config, layout) = layout_for(dir.path());

    let report =
        build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("build succeeds");

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let manifest = read_manifest(&layout);
    assert_eq!(manifest, report.manifest);
    assert_eq!(manifest.schema_version, "1.0.0");
    assert_eq!(manifest.build_timestamp, "2024-05-01T09:30:00.250Z");
    assert_eq!(manifest.source_version, "6.0.0-alpha.0");
    assert_eq!(manifest.agents.len(), 12);
    assert_eq!(manifest.stats.total_agents, 12);
    assert_eq!(manifest.stats.total_workflows, 2);
    for agent in &manifest.agents {
        assert!(layout.store_root.join(&agent.embedded_path).is_file());
    }
    assert_eq!(manifest.agents[0].display_name, "Agent 0");
    assert!(layout.store_root.join("agents/agent-manifest.csv").is_file());

    let slugs: Vec<String> = manifest
        .workflows
        .iter()
        .map(|wf| format!("{}/{}", wf.module, wf.slug))
        .collect();
    assert_eq!(slugs, vec!["bmm/prd", "core/party-mode"]);
    assert_eq!(manifest.workflows[0].title, "Product Requirements");
    assert_eq!(manifest.workflows[1].title, "Group discussion");
    assert_eq!(
        manifest.workflows[0].instructions_path.as_deref(),
        Some("workflows/bmm/prd/instructions.md")
    );

    let prd = layout.store_root.join("workflows/bmm/prd");
    assert!(prd.join("template.md").is_file());
    assert!(prd.join("checklist.txt").is_file());
    assert!(!prd.join("data.json").exists());
    // 1 index + 12 agents + party-mode (2) + prd (4)
    assert_eq!(manifest.stats.total_files, 19);
}

#[test]
fn nine_agents_fail_the_minimum_check() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 9);
    let (config, layout) = layout_for(dir.path());

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("validation fails");
    let BuildError::Validation(messages) = err else {
        panic!("expected validation error, got {err}");
    };
    assert!(
        messages.iter().any(|m| m.contains("agents below minimum")),
        "{messages:?}"
    );
    assert!(layout.store_root.join("manifest.json").is_file());
}

#[test]
fn missing_party_mode_fails_validation() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    fs::remove_dir_all(dir.path().join("src/core/workflows/party-mode")).expect("remove");
    let (config, layout) = layout_for(dir.path());

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("validation fails");
    assert!(err.to_string().contains("core/party-mode"), "{err}");
}

#[test]
fn second_build_copies_nothing_and_force_rewrites_everything() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let (config, layout) = layout_for(dir.path());

    let first = build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("first");
    assert_eq!(first.files_copied, 19);
    let agent_path = layout.store_root.join("agents/bmm/agent-00.md");
    let before = fs::read(&agent_path).expect("read");

    let second = build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("second");
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.files_unchanged, 19);
    assert_eq!(fs::read(&agent_path).expect("read"), before);

    let forced = build_bundle(
        &config,
        &layout,
        BuildOptions {
            clean: false,
            force: true,
        },
        &clock(),
    )
    .expect("forced");
    assert_eq!(forced.files_copied, 19);
    assert_eq!(forced.files_unchanged, 0);
}

#[test]
fn clean_build_removes_stale_store_files() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let (config, layout) = layout_for(dir.path());
    write(&layout.store_root.join("workflows/old/gone/workflow.yaml"), "name: gone\n");

    build_bundle(
        &config,
        &layout,
        BuildOptions {
            clean: true,
            force: false,
        },
        &clock(),
    )
    .expect("build");
    assert!(!layout.store_root.join("workflows/old").exists());
}

#[test]
fn duplicate_and_invalid_workflows_are_warnings() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let modules = dir.path().join("src/modules/bmm/workflows");
    write(&modules.join("prd-copy/workflow.yaml"), "name: PRD\n");
    write(&modules.join("template/workflow.yaml"), "name: '{WORKFLOW_CODE}'\n");
    write(&modules.join("nameless/workflow.yaml"), "title: No name\n");
    write(&modules.join("broken/workflow.yaml"), "name: [unclosed\n");
    write(
        &modules.join("node_modules/pkg/workflow.yaml"),
        "name: vendored\n",
    );
    let (config, layout) = layout_for(dir.path());

    let report = build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("build");

    let mut pairs = HashSet::new();
    for wf in &report.manifest.workflows {
        assert!(pairs.insert((wf.module.clone(), wf.slug.clone())));
    }
    assert_eq!(report.manifest.workflows.len(), 2);
    assert_eq!(
        report.manifest.workflows[0].embedded_path,
        "workflows/bmm/prd"
    );
    let has = |pred: fn(&BuildWarning) -> bool| report.warnings.iter().any(pred);
    assert!(has(|w| matches!(w, BuildWarning::DuplicateWorkflow { slug, .. } if slug == "prd")));
    assert!(has(|w| matches!(w, BuildWarning::InvalidWorkflowSlug { .. })));
    assert!(has(|w| matches!(w, BuildWarning::DescriptorWithoutName { .. })));
    assert!(has(|w| matches!(w, BuildWarning::UnreadableDescriptor { .. })));
    assert!(!layout.store_root.join("workflows/bmm/vendored").exists());
}

#[test]
fn missing_agent_file_is_a_warning() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let index_path = dir.path().join("bmad/_cfg/agent-manifest.csv");
    let mut index = fs::read_to_string(&index_path).expect("read index");
    index.push_str("ghost,Ghost,Nobody,bmm,bmad/bmm/agents/ghost.md\n");
    index.push_str("agent-00,Again,Dup,bmm,bmad/bmm/agents/agent-00.md\n");
    index.push_str("escape,Escape,Bad,bmm,../outside.md\n");
    fs::write(&index_path, index).expect("write index");
    let (config, layout) = layout_for(dir.path());

    let report = build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("build");

    assert_eq!(report.manifest.agents.len(), 12);
    assert!(report.warnings.iter().any(
        |w| matches!(w, BuildWarning::MissingAgentSource { agent, .. } if agent == "ghost")
    ));
    assert!(report.warnings.iter().any(
        |w| matches!(w, BuildWarning::DuplicateAgent { name } if name == "agent-00")
    ));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, BuildWarning::InvalidAgentRow { row: 15, .. })));
}

#[test]
fn missing_agent_index_is_fatal() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    fs::remove_file(dir.path().join("bmad/_cfg/agent-manifest.csv")).expect("remove");
    let (config, layout) = layout_for(dir.path());

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("missing index");
    assert!(matches!(err, BuildError::AgentIndexMissing { .. }));
}

#[test]
fn missing_version_metadata_is_fatal() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    fs::remove_file(dir.path().join("package.json")).expect("remove");
    let (config, layout) = layout_for(dir.path());

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("missing version");
    assert!(matches!(err, BuildError::SourceVersion { .. }));
}

#[test]
fn store_root_enclosing_the_source_is_refused() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let config = PackConfig {
        store_dir: ".".into(),
        ..PackConfig::default()
    };
    let layout = config.layout(dir.path()).expect("layout");

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("unsafe store");
    assert!(matches!(err, BuildError::UnsafeStoreRoot { .. }));
}

#[test]
fn store_root_above_the_source_is_refused_before_cleaning() {
    let dir = tempdir().expect("tempdir");
    let repo = dir.path().join("repo");
    seed_source(&repo, 12);
    write(&dir.path().join("precious.txt"), "keep me\n");
    let config = PackConfig {
        store_dir: "..".into(),
        ..PackConfig::default()
    };
    let layout = config.layout(&repo).expect("layout");

    let err = build_bundle(
        &config,
        &layout,
        BuildOptions {
            clean: true,
            force: false,
        },
        &clock(),
    )
    .expect_err("unsafe store");
    assert!(matches!(err, BuildError::UnsafeStoreRoot { .. }));
    assert!(dir.path().join("precious.txt").is_file());
    assert!(repo.join("bmad/_cfg/agent-manifest.csv").is_file());
}

#[test]
fn store_root_enclosing_a_workflow_root_is_refused() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    let config = PackConfig {
        store_dir: "src".into(),
        ..PackConfig::default()
    };
    let layout = config.layout(dir.path()).expect("layout");

    let err = build_bundle(&config, &layout, BuildOptions::default(), &clock())
        .expect_err("unsafe store");
    assert!(matches!(err, BuildError::UnsafeStoreRoot { .. }));
    assert!(dir.path().join("src/core/workflows/party-mode/workflow.yaml").is_file());
}

#[test]
fn agents_with_the_same_basename_in_one_module_do_not_share_a_file() {
    let dir = tempdir().expect("tempdir");
    seed_source(dir.path(), 12);
    write(&dir.path().join("bmad/x/agent.md"), "# clash a\n");
    write(&dir.path().join("bmad/y/agent.md"), "# clash b\n");
    let index_path = dir.path().join("bmad/_cfg/agent-manifest.csv");
    let mut index = fs::read_to_string(&index_path).expect("read index");
    index.push_str("clash-a,Clash A,,bmm,bmad/x/agent.md\n");
    index.push_str("clash-b,Clash B,,bmm,bmad/y/agent.md\n");
    fs::write(&index_path, index).expect("write index");
    let (config, layout) = layout_for(dir.path());

    let report = build_bundle(&config, &layout, BuildOptions::default(), &clock()).expect("build");

    let paths: HashSet<&str> = report
        .manifest
        .agents
        .iter()
        .map(|agent| agent.embedded_path.as_str())
        .collect();
    assert_eq!(paths.len(), report.manifest.agents.len());
    assert_eq!(report.manifest.agents.len(), 13);
    assert!(report
        .manifest
        .agents
        .iter()
        .all(|agent| agent.name.as_str() != "clash-b"));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        BuildWarning::EmbeddedPathCollision { agent, .. } if agent == "clash-b"
    )));
    assert_eq!(
        fs::read_to_string(layout.store_root.join("agents/bmm/agent.md")).expect("read"),
        "# clash a\n"
    );
}
