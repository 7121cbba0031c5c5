//! Thought engine: turns the felt state into generated first-person thoughts.
//!
//! Every path shares one rate limit: at most one generation call per
//! `min_interval` of wall time, whether the call is reactive, spontaneous or
//! conversational. The limit is stamped when a call starts, so a slow or
//! failed call still holds the slot.

use crate::llm::ThoughtGenerator;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use soma_core::SomaConfig;
use soma_mind::{
    parse_feedback, ExternalInput, Priority, PromptBuilder, SalienceCalculator, ThoughtQueue, Thought, ThoughtType,
};
use soma_psyche::PsychologicalState;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Absorption depth after answering someone.
const CONVERSATION_ABSORPTION: f64 = 0.5;

pub struct ThoughtEngine {
    generator: Arc<dyn ThoughtGenerator>,
    prompts: PromptBuilder,
    system_prompt: String,
    salience: SalienceCalculator,
    queue: ThoughtQueue,
    min_interval: Duration,
    spontaneous_interval: Duration,
    call_timeout: Duration,
    last_call: Option<Instant>,
    last_spontaneous: Option<Instant>,
    /// Most recent thoughts, oldest first
    recent: VecDeque<Thought>,
}

impl ThoughtEngine {
    pub fn new(generator: Arc<dyn ThoughtGenerator>, config: &SomaConfig) -> Self {
        let prompts = PromptBuilder::new(config.llm.max_tokens);
        let system_prompt = prompts.system_prompt(&config.identity);
        Self {
            generator,
            prompts,
            system_prompt,
            salience: SalienceCalculator::new(),
            queue: ThoughtQueue::new(),
            min_interval: Duration::from_secs(config.simulation.min_call_interval_secs),
            spontaneous_interval: Duration::from_secs(config.simulation.spontaneous_interval_secs),
            call_timeout: Duration::from_secs(config.llm.timeout_secs),
            last_call: None,
            // the first idle thought waits one full interval
            last_spontaneous: Some(Instant::now()),
            recent: VecDeque::new(),
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_spontaneous_interval(mut self, interval: Duration) -> Self {
        self.spontaneous_interval = interval;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn queue(&self) -> &ThoughtQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut ThoughtQueue {
        &mut self.queue
    }

    pub fn salience(&self) -> &SalienceCalculator {
        &self.salience
    }

    pub fn recent_thoughts(&self) -> impl Iterator<Item = &Thought> {
        self.recent.iter()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Whether the shared rate limit would allow a call right now.
    pub fn can_call(&self) -> bool {
        self.last_call
            .map_or(true, |last| last.elapsed() >= self.min_interval)
    }

    /// Generate a thought if a change in `psych` broke through salience.
    ///
    /// Salience is updated on every call, including rate-limited ones.
    pub async fn react(&mut self, psych: &PsychologicalState, dt: f64, now: DateTime<Utc>) -> Result<Option<Thought>> {
        let result = self.salience.compute(psych, dt);
        let (true, Some(dimension)) = (result.exceeded, result.trigger) else {
            return Ok(None);
        };
        if !self.can_call() {
            tracing::debug!(dimension = %dimension, "Reactive thought suppressed by rate limit");
            return Ok(None);
        }

        // something broke through: attention snaps back to neutral
        self.queue.exit_absorption();
        self.salience.set_attention_direction(0.0);

        let trigger = format!("{} changed significantly", dimension);
        let prompt = self.prompts.reactive(psych, &trigger, self.recent.make_contiguous());
        let thought = self
            .generate(ThoughtType::Reactive, Some(Priority::PredictionError), trigger, prompt, now)
            .await
            .context("reactive thought")?;
        Ok(Some(thought))
    }

    /// Generate an idle thought from the queue once `spontaneous_interval`
    /// has passed.
    pub async fn spontaneous(&mut self, psych: &PsychologicalState, now: DateTime<Utc>) -> Result<Option<Thought>> {
        if self
            .last_spontaneous
            .is_some_and(|last| last.elapsed() < self.spontaneous_interval)
        {
            return Ok(None);
        }
        if !self.can_call() {
            return Ok(None);
        }

        self.queue.update_needs(psych);
        let candidate = self.queue.select(psych);
        if candidate.priority == Priority::AssociativeDrift {
            // the mind wandered off: whatever chain it was in has let go
            self.queue.exit_absorption();
        }
        self.last_spontaneous = Some(Instant::now());

        let prompt = self.prompts.spontaneous(psych, &candidate, self.recent.make_contiguous());
        let thought = self
            .generate(
                ThoughtType::Spontaneous,
                Some(candidate.priority),
                candidate.label.to_string(),
                prompt,
                now,
            )
            .await
            .context("spontaneous thought")?;
        Ok(Some(thought))
    }

    /// Answer speech or an action. Attention turns outward and the mind
    /// becomes absorbed in the exchange.
    pub async fn respond(
        &mut self,
        psych: &PsychologicalState,
        input: &ExternalInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Thought>> {
        if !self.can_call() {
            tracing::debug!(kind = %input.kind, "Response suppressed by rate limit");
            return Ok(None);
        }

        self.queue.enter_absorption(CONVERSATION_ABSORPTION);
        self.salience.set_attention_direction(-0.5);

        let trigger = format!("{}: {}", input.kind, input.content);
        let prompt = self.prompts.conversational(psych, input, self.recent.make_contiguous());
        let thought = self
            .generate(ThoughtType::Conversational, None, trigger, prompt, now)
            .await
            .context("conversational thought")?;
        Ok(Some(thought))
    }

    async fn generate(
        &mut self,
        kind: ThoughtType,
        priority: Option<Priority>,
        trigger: String,
        prompt: String,
        now: DateTime<Utc>,
    ) -> Result<Thought> {
        self.last_call = Some(Instant::now());
        tracing::debug!(kind = %kind, trigger = %trigger, generator = self.generator.name(), "Generating thought");

        let raw = tokio::time::timeout(self.call_timeout, self.generator.complete(&self.system_prompt, &prompt))
            .await
            .with_context(|| format!("generation timed out after {:?}", self.call_timeout))??;

        let (feedback, content) = parse_feedback(&raw);
        let thought = Thought {
            kind,
            priority,
            content,
            trigger,
            timestamp: now,
            feedback,
        };

        self.recent.push_back(thought.clone());
        while self.recent.len() > self.prompts.stream_capacity() {
            self.recent.pop_front();
        }
        Ok(thought)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use std::sync::atomic::Ordering;

    fn config() -> SomaConfig {
        let mut cfg = SomaConfig::default();
        cfg.simulation.min_call_interval_secs = 3600;
        cfg.simulation.spontaneous_interval_secs = 0;
        cfg
    }

    fn engine(provider: MockProvider) -> ThoughtEngine {
        ThoughtEngine::new(Arc::new(provider.with_delay(Duration::ZERO)), &config())
    }

    fn calm() -> PsychologicalState {
        PsychologicalState {
            arousal: 0.2,
            valence: 0.2,
            energy: 0.7,
            ..Default::default()
        }
    }

    fn spiked() -> PsychologicalState {
        PsychologicalState {
            arousal: 0.7,
            ..calm()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_one_hour() {
        let provider = MockProvider::new("m").with_reply("Hello. [STATE: arousal=0.3, valence=0.1]");
        let calls = provider.calls();
        let mut engine = engine(provider);
        let now = Utc::now();

        let first = engine.respond(&calm(), &ExternalInput::speech("hi"), now).await.unwrap();
        let thought = first.expect("first call goes through");
        assert_eq!(thought.content, "Hello.");
        assert!(thought.feedback.emotional_state.is_some());

        // within the hour: suppressed without calling the generator
        tokio::time::advance(Duration::from_secs(1800)).await;
        let second = engine.respond(&calm(), &ExternalInput::speech("hi"), now).await.unwrap();
        assert!(second.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1800)).await;
        assert!(engine.can_call());
        let third = engine.respond(&calm(), &ExternalInput::speech("hi"), now).await.unwrap();
        assert!(third.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_react_needs_salience() {
        let provider = MockProvider::new("m");
        let calls = provider.calls();
        let mut engine = engine(provider);
        let now = Utc::now();

        // baseline, then no change
        assert!(engine.react(&calm(), 1.0, now).await.unwrap().is_none());
        assert!(engine.react(&calm(), 1.0, now).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let thought = engine.react(&spiked(), 1.0, now).await.unwrap().unwrap();
        assert_eq!(thought.kind, ThoughtType::Reactive);
        assert_eq!(thought.trigger, "arousal changed significantly");
        assert_eq!(engine.salience().attention_direction(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_still_holds_slot() {
        let provider = MockProvider::new("m").failing();
        let calls = provider.calls();
        let mut engine = engine(provider);

        let err = engine
            .respond(&calm(), &ExternalInput::action("taps your shoulder"), Utc::now())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("conversational thought"));
        assert!(!engine.can_call());
        assert!(engine.spontaneous(&calm(), Utc::now()).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout() {
        let provider = MockProvider::new("m").with_delay(Duration::from_secs(120));
        let mut engine =
            ThoughtEngine::new(Arc::new(provider), &config()).with_call_timeout(Duration::from_secs(5));
        let err = engine.spontaneous(&calm(), Utc::now()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_absorbs_and_spontaneous_releases() {
        let mut engine = engine(MockProvider::new("m")).with_min_interval(Duration::ZERO);
        engine.respond(&calm(), &ExternalInput::speech("hey"), Utc::now()).await.unwrap();
        assert!(engine.queue().is_absorbed());
        assert_eq!(engine.salience().attention_direction(), -0.5);

        // absorbed with nothing pending: drift still comes, and ends the chain
        let drift = engine.spontaneous(&calm(), Utc::now()).await.unwrap().unwrap();
        assert_eq!(drift.kind, ThoughtType::Spontaneous);
        assert_eq!(drift.priority, Some(Priority::AssociativeDrift));
        assert_eq!(drift.trigger, "associative_drift");
        assert!(!engine.queue().is_absorbed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_thoughts_bounded() {
        let mut engine = engine(MockProvider::new("m")).with_min_interval(Duration::ZERO);
        for i in 0..6 {
            engine
                .respond(&calm(), &ExternalInput::speech(format!("line {}", i)), Utc::now())
                .await
                .unwrap();
        }
        // 300 max tokens keeps three
        let triggers: Vec<&str> = engine.recent_thoughts().map(|t| t.trigger.as_str()).collect();
        assert_eq!(triggers, ["speech: line 3", "speech: line 4", "speech: line 5"]);
    }
}
