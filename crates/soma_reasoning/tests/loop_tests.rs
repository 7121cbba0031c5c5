//! Integration tests for the SimulationLoop.
//!
//! A scripted generator returns pre-configured responses so the whole
//! pipeline (input, body, mind, generation, feedback) runs without a network.

use anyhow::Result;
use async_trait::async_trait;
use soma_core::SomaConfig;
use soma_reasoning::{Entry, SimClock, SimulationLoop, Source, ThoughtEngine, ThoughtGenerator};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

// ============================================================================
// Scripted generator
// ============================================================================

/// Pops the next response on every call; `Err` once the script runs out.
struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            call_count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThoughtGenerator for ScriptedGenerator {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().await.pop() {
            Some(text) => Ok(text),
            None => anyhow::bail!("script exhausted"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn config(min_call_secs: u64) -> SomaConfig {
    let mut cfg = SomaConfig::default();
    cfg.simulation.min_call_interval_secs = min_call_secs;
    cfg.simulation.spontaneous_interval_secs = 3600;
    cfg
}

async fn next_mind(rx: &mut mpsc::Receiver<Entry>) -> Entry {
    loop {
        let entry = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for a thought")
            .expect("entry channel closed");
        if entry.source == Source::Mind {
            return entry;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_conversation_round_trip() {
    let generator = Arc::new(ScriptedGenerator::new(&[
        "Who's there? [STATE: arousal=0.5, valence=-0.1]",
    ]));
    let cfg = config(0);
    let clock = Arc::new(SimClock::default());
    let engine = ThoughtEngine::new(generator.clone(), &cfg);
    let (sim, mut handles) = SimulationLoop::new(&cfg, engine, clock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = sim.spawn(shutdown_rx);

    handles.input.send("hello?".into()).await.unwrap();
    let thought = next_mind(&mut handles.entries).await;
    assert_eq!(thought.message, "Who's there?");
    assert_eq!(thought.trigger.as_deref(), Some("speech: hello?"));
    assert_eq!(generator.calls(), 1);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_holds_across_inputs() {
    let generator = Arc::new(ScriptedGenerator::new(&["First.", "Second."]));
    let cfg = config(3600);
    let clock = Arc::new(SimClock::default());
    let engine = ThoughtEngine::new(generator.clone(), &cfg);
    let (sim, mut handles) = SimulationLoop::new(&cfg, engine, clock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = sim.spawn(shutdown_rx);

    handles.input.send("one".into()).await.unwrap();
    assert_eq!(next_mind(&mut handles.entries).await.message, "First.");

    handles.input.send("two".into()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(generator.calls(), 1);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_generator_failure_is_not_fatal() {
    let generator = Arc::new(ScriptedGenerator::new(&[]));
    let cfg = config(3600);
    let clock = Arc::new(SimClock::default());
    let engine = ThoughtEngine::new(generator.clone(), &cfg);
    let (sim, mut handles) = SimulationLoop::new(&cfg, engine, clock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = sim.spawn(shutdown_rx);

    handles.input.send("anyone?".into()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    // the failed call still holds the rate-limit slot
    assert_eq!(generator.calls(), 1);

    // the loop keeps ticking and publishing
    handles.snapshots.borrow_and_update();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(handles.snapshots.has_changed().unwrap());
    assert!(!task.is_finished());

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_simulated_time() {
    let generator = Arc::new(ScriptedGenerator::new(&[]));
    let cfg = config(0);
    let clock = Arc::new(SimClock::default());
    let engine = ThoughtEngine::new(generator, &cfg);
    let (sim, handles) = SimulationLoop::new(&cfg, engine, Arc::clone(&clock));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = sim.spawn(shutdown_rx);

    tokio::time::sleep(Duration::from_secs(1)).await;
    clock.pause();
    let frozen = clock.now();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(clock.now(), frozen);
    assert!(handles.snapshots.borrow().sim_time <= frozen);

    clock.resume();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(handles.snapshots.borrow().sim_time > frozen);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}
