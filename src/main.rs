//! watsonx-tools — function-calling demo for watsonx.ai.
//!
//! Usage:
//!   watsonx-tools                 Run the weather and finance examples
//!   watsonx-tools weather         Run only the weather example
//!   watsonx-tools finance         Run only the finance example
//!   watsonx-tools tools           Print the tool catalog as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use watsonx_tools::config::{self, AppConfig};
use watsonx_tools::dispatch::{DispatchReport, Dispatcher, Scenario};
use watsonx_tools::tools::ToolCatalog;
use watsonx_tools::watsonx::{ToolAwareChat, WatsonxChat};
use watsonx_tools::weather::WttrClient;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "watsonx-tools")]
#[command(version)]
#[command(about = "Function calling with watsonx.ai chat models")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional TOML config file; environment variables override it.
    #[arg(long, default_value = "watsonx-tools.toml")]
    config: String,

    /// `.env` file loaded before reading the environment.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the weather and finance examples (default).
    Run,

    /// Run the weather example.
    Weather {
        /// Ask this instead of the scripted question.
        #[arg(long)]
        question: Option<String>,
    },

    /// Run the finance example.
    Finance {
        /// Ask this instead of the scripted question.
        #[arg(long)]
        question: Option<String>,
    },

    /// Print the tool catalog offered to the model.
    Tools,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&cli, None, true, true).await,
        Some(Commands::Weather { ref question }) => {
            cmd_run(&cli, question.as_deref(), true, false).await
        }
        Some(Commands::Finance { ref question }) => {
            cmd_run(&cli, question.as_deref(), false, true).await
        }
        Some(Commands::Tools) => cmd_tools(),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_run(cli: &Cli, question: Option<&str>, weather: bool, finance: bool) -> Result<()> {
    let cfg = load_config(cli)?;
    step(1, "Load environment variables");
    println!("{:#?}\n", cfg.watsonx);

    step(2, "Prepare model parameters");
    println!("{:#?}\n", cfg.decoding);

    step(3, "Create a watsonx chat client");
    let chat = WatsonxChat::new(&cfg.watsonx, cfg.decoding.clone())
        .context("Failed to create watsonx chat client")?;

    step(4, "Bind tools to chat");
    let chat = chat.bind_tools(ToolCatalog::builtin()?);
    let weather_client = WttrClient::new(&cfg.weather)?;
    let dispatcher = Dispatcher::new(&chat, &weather_client);

    println!(
        "{} Using model {} with {} tools",
        ">>>".green().bold(),
        chat.model_id(),
        chat.tools().len(),
    );

    let mut next_step = 5;
    if weather {
        let scenario = with_question(Scenario::weather(), question);
        step(next_step, "Run the weather example");
        run_scenario(
            &dispatcher,
            &chat,
            &scenario,
            "Invoke real weather endpoint",
        )
        .await?;
        next_step += 1;
    }
    if finance {
        let scenario = with_question(Scenario::finance()?, question);
        step(next_step, "Run the finance example");
        run_scenario(
            &dispatcher,
            &chat,
            &scenario,
            "Invoke example finance endpoint",
        )
        .await?;
    }

    info!("All examples completed");
    Ok(())
}

fn cmd_tools() -> Result<()> {
    let catalog = ToolCatalog::builtin()?;
    let json = serde_json::to_string_pretty(catalog.specs())
        .context("Failed to render tools")?;
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load `.env`, the optional TOML file and the process environment.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let env_file = PathBuf::from(shellexpand::tilde(&cli.env_file).into_owned());
    if env_file.exists() {
        dotenv::from_path(&env_file)
            .with_context(|| format!("Failed to load {}", env_file.display()))?;
    }

    let config_path = PathBuf::from(shellexpand::tilde(&cli.config).into_owned());
    config::load_from_env(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

async fn run_scenario(
    dispatcher: &Dispatcher<'_>,
    chat: &ToolAwareChat,
    scenario: &Scenario,
    endpoint_label: &str,
) -> Result<()> {
    let report: DispatchReport = dispatcher
        .run(scenario)
        .await
        .with_context(|| {
            format!(
                "The {} example failed (model {})",
                scenario.label,
                chat.model_id()
            )
        })?;

    println!("- {} messages:", scenario.label);
    for message in &report.messages {
        println!(
            "  [{}] {}",
            message.role.to_string().cyan(),
            message.content
        );
    }
    println!();
    println!(
        "- {} model reply:\n{:#?}\n",
        scenario.label, report.response.content
    );
    println!(
        "- {} tool calls:\n{:#?}\n",
        scenario.label, report.response.tool_calls
    );
    println!(
        "- {}:\n{}\n",
        endpoint_label,
        report.outcome.to_string().green()
    );
    Ok(())
}

fn with_question(scenario: Scenario, question: Option<&str>) -> Scenario {
    match question {
        Some(q) => scenario.with_question(q),
        None => scenario,
    }
}

fn step(n: u32, title: &str) {
    println!("{} {}\n", format!("{n}.").bold(), title.bold());
}
