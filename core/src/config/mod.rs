use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const RATCHET_DIR: &str = ".ratchet";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    /// Built-in agent profile used when the CLI does not override it.
    pub agent: String,
    pub max_iterations: usize,
    pub temperature: Option<f64>,
    pub turn_timeout_secs: u64,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o".to_string(),
            agent: "tool-call".to_string(),
            max_iterations: 10,
            temperature: None,
            turn_timeout_secs: 300,
            workspace_dir: get_ratchet_dir().join("workspace"),
        }
    }
}

pub fn get_ratchet_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(RATCHET_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_ratchet_dir().join("config.toml")
}

pub fn ensure_ratchet_dir() -> Result<PathBuf> {
    let dir = get_ratchet_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create ratchet directory at {}", dir.display()))?;
    }

    Ok(dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'ratchet onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.workspace_dir = get_ratchet_dir().join("workspace");

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_ratchet_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trip_preserves_fields() {
        let mut config = Config::default();
        config.provider = Some("anthropic".to_string());
        config.model = "claude-sonnet-4-5".to_string();
        config.agent = "react".to_string();
        config.max_iterations = 5;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.provider.as_deref(), Some("anthropic"));
        assert_eq!(parsed.model, "claude-sonnet-4-5");
        assert_eq!(parsed.agent, "react");
        assert_eq!(parsed.max_iterations, 5);
        assert_eq!(parsed.turn_timeout_secs, 300);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("model = \"gpt-4o-mini\"").unwrap();
        assert_eq!(parsed.model, "gpt-4o-mini");
        assert_eq!(parsed.agent, "tool-call");
        assert_eq!(parsed.max_iterations, 10);
    }
}
