use crate::config::Config;
use crate::providers::{
    AnthropicProvider, GoogleProvider, GroqProvider, OllamaProvider, OpenAIProvider,
};
use crate::traits::Provider;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    match provider_name.to_lowercase().as_str() {
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "RATCHET_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Ok(Arc::new(provider))
        }
        "anthropic" | "claude" => {
            let api_key = resolve_api_key_with_fallback(
                &["ANTHROPIC_API_KEY", "RATCHET_ANTHROPIC_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = AnthropicProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Ok(Arc::new(provider))
        }
        "groq" => {
            let api_key = resolve_api_key_with_fallback(
                &["GROQ_API_KEY", "RATCHET_GROQ_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = GroqProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Ok(Arc::new(provider))
        }
        "google" | "gemini" => {
            let api_key = resolve_api_key_with_fallback(
                &["GOOGLE_API_KEY", "RATCHET_GOOGLE_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = GoogleProvider::new(api_key).with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Ok(Arc::new(provider))
        }
        "ollama" => {
            let mut provider = OllamaProvider::new().with_model(config.model.clone());
            let base_url = config
                .base_url
                .clone()
                .or_else(|| std::env::var("OLLAMA_BASE_URL").ok());
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Ok(Arc::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: openai, anthropic, groq, google, ollama",
            provider_name
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found; set one of {} or add api_key to the config file",
            env_vars.join(", ")
        ))
    }
}
