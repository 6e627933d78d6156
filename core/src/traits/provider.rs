use async_trait::async_trait;

/// A text-generation backend: one prompt in, one complete reply out. The
/// loop treats every provider failure uniformly as "model call failed".
///
/// Not streaming: the loop only acts on complete replies.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
