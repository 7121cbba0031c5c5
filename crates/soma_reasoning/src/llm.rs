use anyhow::Result;
use async_trait::async_trait;
use soma_core::config::LlmConfig;

/// Sampling parameters for one generation call
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 1.0 for Anthropic)
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.9,
        }
    }
}

impl From<&LlmConfig> for GenerationParams {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}

/// The generative component that turns a prompt into inner speech.
#[async_trait]
pub trait ThoughtGenerator: Send + Sync {
    /// Complete `user` under the `system` framing and return the raw text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
