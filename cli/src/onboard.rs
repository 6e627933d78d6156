use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use ratchet_core::config::Config;
use ratchet_core::profile::AgentConfig;

const BANNER: &str = r"
    -------------------------------------

              r a t c h e t

       turn-by-turn tool calling

    -------------------------------------
";

const PROVIDERS: &[(&str, &str)] = &[
    ("openai", "gpt-4o"),
    ("anthropic", "claude-sonnet-4-5"),
    ("groq", "llama-3.3-70b-versatile"),
    ("google", "gemini-2.0-flash"),
    ("ollama", "llama3.2"),
];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<(String, String)> {
    let names: Vec<&str> = PROVIDERS.iter().map(|(name, _)| *name).collect();
    let selection = Select::new()
        .with_prompt("Select your provider")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    let (provider, default_model) = PROVIDERS[selection];

    let model: String = Input::new()
        .with_prompt("Model")
        .default(default_model.to_string())
        .interact_text()
        .context("Failed to read model")?;

    Ok((provider.to_string(), model))
}

fn setup_api_key(provider: &str) -> Result<String> {
    if provider == "ollama" {
        return Ok(String::new());
    }

    let api_key: String = Input::new()
        .with_prompt("Enter your API key (blank to use the environment variable)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    Ok(api_key)
}

fn setup_agent() -> Result<String> {
    let names = AgentConfig::builtin_names();
    let selection = Select::new()
        .with_prompt("Select an agent profile")
        .items(names)
        .default(0)
        .interact()
        .context("Failed to select agent profile")?;

    Ok(names[selection].to_string())
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to ratchet!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your agent in under 30 seconds.").dim()
    );

    print_step(1, 3, "Provider and Model");
    let (provider, model) = setup_provider()?;

    print_step(2, 3, "API Key");
    let api_key = setup_api_key(&provider)?;

    print_step(3, 3, "Agent Profile");
    let agent = setup_agent()?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        agent,
        ..Default::default()
    };

    if let Err(e) = std::fs::create_dir_all(&config.workspace_dir) {
        eprintln!(
            "  {} Warning: Could not create workspace at {}: {}",
            style("!").yellow(),
            config.workspace_dir.display(),
            e
        );
    }

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(ratchet_core::config::get_config_path().display()).cyan()
    );
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("ratchet chat").cyan().bold()
    );
    println!();

    Ok(config)
}
