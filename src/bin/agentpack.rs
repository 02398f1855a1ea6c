use agentpack::app::cli::Cli;
use agentpack::app::command_handlers;
use agentpack::shared::logging::{init_logging, LogFormat};
use clap::Parser;

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, LogFormat::parse(&cli.log_format)?)?;
    let output = command_handlers::execute(cli.command)?;
    println!("{output}");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
