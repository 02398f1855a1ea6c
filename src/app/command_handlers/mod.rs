use crate::app::cli::{Cli, Command, StoreArgs};
use crate::config::PackConfig;
use crate::service::PackService;
use crate::shared::clock::SystemClock;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

pub mod agents;
pub mod build;
pub mod workflows;

/// Parses `args` (without the program name) and executes the command.
/// Logging is left to the caller.
pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let cli = Cli::try_parse_from(std::iter::once("agentpack".to_string()).chain(args))
        .map_err(|err| err.to_string())?;
    execute(cli.command)
}

pub fn execute(command: Command) -> Result<String, String> {
    match command {
        Command::Build {
            source,
            clean,
            force,
        } => build::cmd_build(&source.source_root, clean, force),
        Command::List {
            store,
            module,
            json,
        } => workflows::cmd_list(&store, module.as_deref(), json),
        Command::Run {
            workflow,
            store,
            output,
        } => workflows::cmd_run(&store, &workflow, &output),
        Command::Agent { name, store } => agents::cmd_agent(&store, &name),
        Command::Route {
            message,
            agent,
            workflow,
            store,
            output,
        } => agents::cmd_route(&store, message, agent, workflow, &output),
        Command::Tools { store } => workflows::cmd_tools(&store),
    }
}

pub(crate) fn load_config(source_root: &std::path::Path) -> Result<PackConfig, String> {
    PackConfig::load_for_source(source_root).map_err(|err| err.to_string())
}

pub(crate) fn store_root(args: &StoreArgs, config: &PackConfig) -> Result<PathBuf, String> {
    if let Some(store) = &args.store {
        return Ok(store.clone());
    }
    config
        .layout(&args.source.source_root)
        .map(|layout| layout.store_root)
        .map_err(|err| err.to_string())
}

pub(crate) fn open_service(args: &StoreArgs) -> Result<PackService, String> {
    let config = load_config(&args.source.source_root)?;
    let store_root = store_root(args, &config)?;
    PackService::open(&config, &store_root, Arc::new(SystemClock)).map_err(|err| err.to_string())
}

pub(crate) fn parse_inputs(raw: Option<&str>) -> Result<Option<serde_json::Value>, String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| format!("invalid --inputs JSON: {err}"))?;
    if !value.is_object() {
        return Err("--inputs must be a JSON object".to_string());
    }
    Ok(Some(value))
}
