use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "agentpack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bundles agents and workflows into an embedded store and renders prompt packs"
)]
pub struct Cli {
    /// Default log filter when AGENTPACK_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    /// Log output format: 'text' or 'json'.
    #[arg(long, global = true, default_value = "text")]
    pub log_format: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Repository holding agentpack.yaml and the asset sources.
    #[arg(long, default_value = ".")]
    pub source_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Embedded store to read; defaults to the configured store under the source root.
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Workspace the prompt pack is written into.
    #[arg(long, default_value = ".")]
    pub cwd: PathBuf,
    /// Output file, absolute or relative to --cwd. Must stay inside --cwd.
    #[arg(long)]
    pub target: Option<PathBuf>,
    /// Workflow inputs as a JSON object.
    #[arg(long)]
    pub inputs: Option<String>,
    /// Assemble without writing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package agents and workflows into the embedded store.
    Build {
        #[command(flatten)]
        source: SourceArgs,
        /// Delete the store before building.
        #[arg(long)]
        clean: bool,
        /// Copy every file even when the destination is up to date.
        #[arg(long)]
        force: bool,
    },
    /// List bundled workflows.
    List {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Render a workflow into a prompt pack.
    Run {
        /// `slug`, `module:slug` or `module/slug`.
        workflow: String,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print a bundled agent definition.
    Agent {
        name: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Route a request to a workflow, an agent or the default agent.
    Route {
        /// Free-form request text.
        message: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        workflow: Option<String>,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the per-workflow operations.
    Tools {
        #[command(flatten)]
        store: StoreArgs,
    },
}
