use crate::providers::OpenAIProvider;
use crate::traits::Provider;
use async_trait::async_trait;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq speaks the OpenAI chat-completions dialect; only the endpoint and
/// default model differ.
pub struct GroqProvider {
    inner: OpenAIProvider,
}

impl GroqProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            inner: OpenAIProvider::new(api_key)
                .with_base_url(GROQ_BASE_URL)
                .with_model("llama-3.3-70b-versatile"),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner = self.inner.with_base_url(base_url);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.inner = self.inner.with_model(model);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.inner = self.inner.with_temperature(temperature);
        self
    }
}

#[async_trait]
impl Provider for GroqProvider {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.inner.generate(prompt).await
    }
}
