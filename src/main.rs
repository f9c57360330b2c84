use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use mapagent::agent::{Agent, AgentConfig};
use mapagent::config::Config;
use mapagent::llm::HuggingFaceClient;
use mapagent::server::Server;
use mapagent::tools::{ToolDescriptor, catalog, standard_registry};

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("mapagent.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_agent(config: &Config) -> Result<Agent> {
    let llm = HuggingFaceClient::new(config.llm.to_huggingface()).context("Failed to create model client")?;
    let registry = standard_registry(&config.services).context("Failed to create map-service clients")?;

    Ok(Agent::new(Arc::new(llm), Arc::new(registry)).with_config(AgentConfig::from(&config.llm)))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None | Some(Commands::Chat) => run_chat(config).await,
        Some(command @ Commands::Ask { .. }) => {
            let message = command.ask_message().unwrap_or_default();
            run_ask(&message, config).await
        }
        Some(Commands::Serve { bind }) => run_serve(bind.as_deref(), config).await,
        Some(Commands::Tools) => {
            print_tools(&catalog::descriptors());
            Ok(())
        }
    }
}

async fn run_chat(config: &Config) -> Result<()> {
    let agent = build_agent(config)?;
    info!("Launching chat with model {}", agent.model());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    mapagent::repl::run(&agent, stdin, &mut stdout)
        .await
        .context("Chat session failed")
}

async fn run_ask(message: &str, config: &Config) -> Result<()> {
    let agent = build_agent(config)?;
    info!("Answering one-shot message");

    let answer = agent.handle_turn(message).await?;
    println!("{}", answer);
    Ok(())
}

async fn run_serve(bind: Option<&str>, config: &Config) -> Result<()> {
    let agent = Arc::new(build_agent(config)?);
    let bind = bind.unwrap_or(&config.server.bind);

    let server = Server::start(agent, bind)
        .await
        .context(format!("Failed to bind {}", bind))?;
    println!("{} http://{} (Ctrl-C to stop)", "Serving on".green(), server.addr());

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    println!("{}", "Shutting down...".cyan());
    server.stop().await;
    Ok(())
}

fn print_tools(descriptors: &[ToolDescriptor]) {
    for descriptor in descriptors {
        println!("{}", descriptor.name.green().bold());
        println!("  {}", descriptor.description);
        for param in &descriptor.params {
            println!("    {}: {}", param.name.cyan(), param.summary());
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
