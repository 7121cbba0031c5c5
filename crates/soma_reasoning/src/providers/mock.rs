//! Mock provider: deterministic inner speech for running without an API key.

use crate::llm::ThoughtGenerator;
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    reply: Option<String>,
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            reply: None,
            fail: false,
            delay: Duration::from_millis(200),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answer with `reply`.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    /// Every call fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter; clones of the provider count together.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl ThoughtGenerator for MockProvider {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("Mock {} failure", self.model);
        }
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }

        let text = if user.contains("Someone says to you") {
            "Someone is talking to me. I should answer. [STATE: arousal=0.4, valence=0.2]"
        } else if user.contains("Something just shifted") {
            "Something in my body changed. I notice it. [STATE: arousal=0.5, valence=-0.2]"
        } else {
            "My mind drifts for a moment. [STATE: arousal=0.2, valence=0.1]"
        };
        Ok(format!("(Mock {}) {}", self.model, text))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
