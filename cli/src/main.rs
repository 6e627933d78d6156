use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use ratchet_core::{
    AgentConfig, AgentLoop, FnTool, Outcome, ToolArgs, config, providers, tools,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod calc;
mod observer;
mod onboard;

#[derive(Parser)]
#[command(name = "ratchet")]
#[command(about = "ratchet - a schema-constrained tool-calling agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configuration wizard
    Onboard,
    /// Talk to the agent, one-shot or interactively
    Chat {
        #[arg(short, long)]
        message: Option<String>,

        /// Built-in agent profile to use instead of the configured one
        #[arg(short, long)]
        agent: Option<String>,

        /// Print turn-by-turn progress
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the built-in agent profiles
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat {
                message: None,
                agent: None,
                verbose: false,
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Agents => {
            let config = config::Config::load_or_init()?;
            for name in AgentConfig::builtin_names() {
                if *name == config.agent {
                    println!("{} {}", style("*").green(), style(name).bold());
                } else {
                    println!("  {name}");
                }
            }
        }
        Commands::Chat {
            message,
            agent,
            verbose,
        } => run_chat(message, agent, verbose).await?,
    }

    Ok(())
}

async fn run_chat(message: Option<String>, agent: Option<String>, verbose: bool) -> Result<()> {
    let config = config::load_config()?;
    let provider = providers::create_provider(&config)?;

    let profile_name = agent.unwrap_or_else(|| config.agent.clone());
    let profile = AgentConfig::builtin(&profile_name)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "unknown agent profile '{}'; run 'ratchet agents' to list them",
                profile_name
            )
        })?
        .with_max_iterations(config.max_iterations);

    if !config.workspace_dir.exists() {
        std::fs::create_dir_all(&config.workspace_dir)?;
    }

    let mut agent_loop = AgentLoop::new(profile)
        .with_provider(provider)
        .with_turn_timeout(Duration::from_secs(config.turn_timeout_secs));
    if verbose {
        agent_loop = agent_loop.with_observer(Arc::new(observer::ConsoleObserver));
    }
    register_tools(&agent_loop, &config.workspace_dir)?;

    if let Some(msg) = message {
        run_once(&agent_loop, &msg).await;
        return Ok(());
    }

    println!("⚙️  ratchet ({profile_name})");
    println!("Type your message (Ctrl-D to exit):\n");

    let mut rl = rustyline::DefaultEditor::new()?;
    let history_path = config::get_ratchet_dir().join("history");
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);
                run_once(&agent_loop, input).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => {
                println!("\n👋 Goodbye!");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

async fn run_once(agent_loop: &AgentLoop, input: &str) {
    match agent_loop.invoke(input).await {
        Ok(Outcome::Answer { text, .. }) => {
            println!("{text}\n");
        }
        Ok(Outcome::BudgetExhausted { trace }) => {
            eprintln!(
                "{} Turn budget exhausted after {} tool calls.",
                style("⚠").yellow(),
                trace.len()
            );
            for (tool, result) in trace.tool_calls().zip(trace.tool_results()) {
                eprintln!("  {tool}: {result}");
            }
        }
        Err(e) => {
            eprintln!("{} {}\n", style("❌ Error:").red(), e);
        }
    }
}

fn register_tools(agent_loop: &AgentLoop, workspace: &Path) -> Result<()> {
    let registry = agent_loop.tools();

    registry.register(Arc::new(tools::ShellTool::new(workspace)))?;
    registry.register(Arc::new(tools::FileReadTool::new(workspace)))?;
    registry.register(Arc::new(tools::FileWriteTool::new(workspace)))?;

    registry.register(Arc::new(
        FnTool::new(
            "calculator",
            "Evaluates arithmetic expressions like '125 * 48' or '(10 + 5) * 3'",
            |args: ToolArgs| {
                let expression = args.require("expression", 0)?;
                calc::eval(&expression).map(calc::format_result)
            },
        )
        .with_contract(["expression"]),
    ))?;

    registry.register(Arc::new(FnTool::new(
        "word_count",
        "Counts the number of words in a text",
        |args: ToolArgs| {
            let text = args.require("text", 0)?;
            Ok(text.split_whitespace().count().to_string())
        },
    )))?;

    registry.register(Arc::new(
        FnTool::new(
            "convert_temperature",
            "Converts a temperature between Celsius and Fahrenheit; takes value, from_unit ('c' or 'f') and to_unit",
            |args: ToolArgs| {
                let value: f64 = args
                    .require("value", 0)?
                    .parse()
                    .map_err(|_| anyhow::anyhow!("value must be a number"))?;
                let from = args.require("from_unit", 1)?.to_lowercase();
                let to = args.require("to_unit", 2)?.to_lowercase();

                match (from.as_str(), to.as_str()) {
                    ("c", "f") => Ok(format!("{}°C = {}°F", value, value * 9.0 / 5.0 + 32.0)),
                    ("f", "c") => Ok(format!("{}°F = {}°C", value, (value - 32.0) * 5.0 / 9.0)),
                    _ => anyhow::bail!("invalid units, use 'c' or 'f'"),
                }
            },
        )
        .with_contract(["value", "from_unit", "to_unit"]),
    ))?;

    Ok(())
}
