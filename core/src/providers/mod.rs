pub mod anthropic;
pub mod factory;
pub mod google;
pub mod groq;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use factory::create_provider;
pub use google::GoogleProvider;
pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
