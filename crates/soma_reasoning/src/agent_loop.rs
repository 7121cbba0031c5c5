use crate::clock::SimClock;
use crate::engine::ThoughtEngine;
use crate::input::{classify_input, InputEvent};
use crate::output::{Entry, Source};
use chrono::{DateTime, Utc};
use serde::Serialize;
use soma_core::change::{apply_changes, significant_changes};
use soma_core::{BioProcessor, BiologicalState, SenseParser, SomaConfig, TickResult};
use soma_mind::{ExternalInput, Thought};
use soma_psyche::{Personality, PsychProcessor, PsychologicalState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Output queue between the tick task and whoever displays entries.
const ENTRY_CAPACITY: usize = 256;

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only view of the agent published after every tick.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub bio: BiologicalState,
    pub psych: PsychologicalState,
    pub sim_time: DateTime<Utc>,
    pub paused: bool,
}

/// Channels for talking to a running loop.
pub struct LoopHandles {
    /// Raw input lines; see [`classify_input`]
    pub input: mpsc::Sender<String>,
    pub entries: mpsc::Receiver<Entry>,
    pub snapshots: watch::Receiver<Snapshot>,
}

// ============================================================================
// SimulationLoop
// ============================================================================

/// Owns the agent state and advances it one tick at a time. Nothing else
/// writes to the state; readers see it through [`Snapshot`]s.
pub struct SimulationLoop {
    clock: Arc<SimClock>,
    bio: BiologicalState,
    psych: PsychologicalState,
    bio_processor: BioProcessor,
    psych_processor: PsychProcessor,
    senses: SenseParser,
    engine: ThoughtEngine,
    controllability: f64,
    tick_interval: Duration,
    last_mood: &'static str,
    input_rx: mpsc::Receiver<String>,
    entry_tx: mpsc::Sender<Entry>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl SimulationLoop {
    pub fn new(config: &SomaConfig, engine: ThoughtEngine, clock: Arc<SimClock>) -> (Self, LoopHandles) {
        let sim = &config.simulation;
        let now = clock.now();
        let bio = BiologicalState::new_at(now);
        let mut psych_processor = PsychProcessor::new(Personality::from(&config.personality));
        let psych = psych_processor.process(&bio, 0.0, sim.stressor_controllability, now);

        let (input_tx, input_rx) = mpsc::channel(sim.input_capacity.max(1));
        let (entry_tx, entry_rx) = mpsc::channel(ENTRY_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            bio: bio.clone(),
            psych: psych.clone(),
            sim_time: now,
            paused: clock.is_paused(),
        });

        let this = Self {
            bio_processor: BioProcessor::default().with_max_dt(sim.max_tick_secs),
            psych_processor,
            senses: SenseParser::new(),
            engine,
            controllability: sim.stressor_controllability,
            tick_interval: Duration::from_millis(sim.tick_interval_ms.max(1)),
            last_mood: psych.mood_label(),
            clock,
            bio,
            psych,
            input_rx,
            entry_tx,
            snapshot_tx,
        };
        let handles = LoopHandles {
            input: input_tx,
            entries: entry_rx,
            snapshots: snapshot_rx,
        };
        (this, handles)
    }

    pub fn bio(&self) -> &BiologicalState {
        &self.bio
    }

    pub fn bio_mut(&mut self) -> &mut BiologicalState {
        &mut self.bio
    }

    pub fn psych(&self) -> &PsychologicalState {
        &self.psych
    }

    pub fn engine_mut(&mut self) -> &mut ThoughtEngine {
        &mut self.engine
    }

    /// Spawn the loop. It runs until `shutdown` turns true, its sender is
    /// dropped, or the entry receiver goes away.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            generator = self.engine.generator_name(),
            "Simulation loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {}
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            // an in-flight generation call must not delay shutdown,
            // but only a real shutdown may cut a tick short
            let tick = self.tick();
            tokio::pin!(tick);
            let keep_going = loop {
                tokio::select! {
                    open = &mut tick => break open,
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            break false;
                        }
                    }
                }
            };
            if !keep_going {
                break;
            }
        }
        tracing::info!("Simulation loop stopped");
    }

    /// One full cycle. Returns `false` once nobody is listening for entries.
    pub async fn tick(&mut self) -> bool {
        let dt = self.clock.tick();
        if dt <= 0.0 {
            return !self.entry_tx.is_closed();
        }
        let now = self.clock.now();

        while let Ok(line) = self.input_rx.try_recv() {
            self.handle_input(&line, dt, now).await;
        }

        let result = self.bio_processor.tick(&mut self.bio, now);
        self.show_bio_tick(&result, now);
        let remembered = self.psych_processor.remember_crises(&result.thresholds, now);
        if remembered > 0 {
            tracing::info!(count = remembered, "Crisis memories stored");
        }

        self.psych = self
            .psych_processor
            .process(&self.bio, result.dt, self.controllability, now);
        self.show_mood_shift(now);

        let reactive = self.engine.react(&self.psych, result.dt, now).await;
        self.on_thought(reactive, result.dt);
        let spontaneous = self.engine.spontaneous(&self.psych, now).await;
        self.on_thought(spontaneous, result.dt);

        tracing::debug!(dt = result.dt, changes = result.changes.len(), "tick");
        self.publish(now);
        !self.entry_tx.is_closed()
    }

    async fn handle_input(&mut self, line: &str, dt: f64, now: DateTime<Utc>) {
        let Some(event) = classify_input(line) else {
            return;
        };
        tracing::debug!(?event, "Input received");
        match event {
            InputEvent::Speech(text) => {
                self.emit(Entry::new(Source::Sense, format!("speech: \"{}\"", text), now));
                self.psych_processor.record_social_contact();
                self.refresh_psych(now);
                let outcome = self.engine.respond(&self.psych, &ExternalInput::speech(text), now).await;
                self.on_thought(outcome, dt);
            }
            InputEvent::Action(text) => {
                self.apply_senses(&text, now);
                self.refresh_psych(now);
                let outcome = self.engine.respond(&self.psych, &ExternalInput::action(text), now).await;
                self.on_thought(outcome, dt);
            }
            InputEvent::Environment(text) => self.apply_senses(&text, now),
        }
    }

    /// Re-derive psychology after an input without advancing time.
    fn refresh_psych(&mut self, now: DateTime<Utc>) {
        self.psych = self.psych_processor.process(&self.bio, 0.0, self.controllability, now);
    }

    fn apply_senses(&mut self, text: &str, now: DateTime<Utc>) {
        for stimulus in self.senses.parse(text) {
            self.emit(Entry::new(
                Source::Sense,
                format!(
                    "{}: {} (intensity: {:.1})",
                    stimulus.channel, stimulus.description, stimulus.intensity
                ),
                now,
            ));
            let changes = self.bio_processor.process_stimulus(&mut self.bio, &stimulus);
            for c in significant_changes(&changes) {
                self.emit(Entry::new(
                    Source::Bio,
                    format!("{} {:+.2} ({})", c.variable, c.delta, c.source),
                    now,
                ));
            }
        }
    }

    fn show_bio_tick(&self, result: &TickResult, now: DateTime<Utc>) {
        for c in significant_changes(&result.changes) {
            self.emit(Entry::new(
                Source::Bio,
                format!("{} {:+.2} ({})", c.variable, c.delta, c.source),
                now,
            ));
        }
        for t in &result.thresholds {
            self.emit(Entry::new(
                Source::Bio,
                format!("THRESHOLD [{}] {}: {}", t.severity, t.system, t.description),
                now,
            ));
        }
    }

    fn show_mood_shift(&mut self, now: DateTime<Utc>) {
        let mood = self.psych.mood_label();
        if mood != self.last_mood {
            self.last_mood = mood;
            self.emit(Entry::new(Source::Psych, self.psych.summary(), now));
        }
    }

    fn on_thought(&mut self, outcome: anyhow::Result<Option<Thought>>, dt: f64) {
        match outcome {
            Ok(Some(thought)) => {
                let changes = thought.feedback.changes(dt);
                if !changes.is_empty() {
                    tracing::debug!(count = changes.len(), "Applying thought feedback");
                    apply_changes(&mut self.bio, &changes);
                }
                self.emit(Entry::thought(&thought));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Thought generation failed: {:#}", e),
        }
    }

    fn emit(&self, entry: Entry) {
        match self.entry_tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!("Entry channel full, dropping {} entry", entry.source);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Entry receiver dropped");
            }
        }
    }

    fn publish(&self, now: DateTime<Utc>) {
        self.snapshot_tx.send_replace(Snapshot {
            bio: self.bio.clone(),
            psych: self.psych.clone(),
            sim_time: now,
            paused: self.clock.is_paused(),
        });
    }
}
