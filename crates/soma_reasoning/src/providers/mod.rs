pub mod anthropic;
pub mod mock;

pub use anthropic::AnthropicClient;
pub use mock::MockProvider;

use crate::llm::{GenerationParams, ThoughtGenerator};
use anyhow::Result;
use soma_core::config::LlmConfig;
use std::sync::Arc;
use std::time::Duration;

/// Build the generator named by `cfg.provider`.
pub fn create_generator(cfg: &LlmConfig) -> Result<Arc<dyn ThoughtGenerator>> {
    match cfg.provider.as_str() {
        "anthropic" => {
            let client = AnthropicClient::new(
                &cfg.model,
                cfg.base_url.as_deref(),
                GenerationParams::from(cfg),
                Duration::from_secs(cfg.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockProvider::new(&cfg.model))),
        other => anyhow::bail!("Unknown LLM provider: {} (expected \"anthropic\" or \"mock\")", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_and_unknown() {
        let cfg = LlmConfig {
            provider: "mock".into(),
            ..Default::default()
        };
        assert_eq!(create_generator(&cfg).unwrap().name(), "mock");

        let cfg = LlmConfig {
            provider: "carrier-pigeon".into(),
            ..Default::default()
        };
        let err = create_generator(&cfg).err().unwrap().to_string();
        assert!(err.contains("carrier-pigeon"));
    }
}
