//! Simulation clock.
//!
//! Simulated time runs at wall-clock speed while the clock is running and
//! stands still while paused. Both the tick task and the input reader hold
//! the same clock, so the state sits behind a mutex.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct ClockState {
    started: Instant,
    last_tick: Instant,
    paused_at: Option<Instant>,
    /// Total wall time spent paused
    paused_total: Duration,
}

#[derive(Debug)]
pub struct SimClock {
    sim_start: DateTime<Utc>,
    state: Mutex<ClockState>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl SimClock {
    /// A running clock whose simulated time starts at `sim_start`.
    pub fn new(sim_start: DateTime<Utc>) -> Self {
        let now = Instant::now();
        Self {
            sim_start,
            state: Mutex::new(ClockState {
                started: now,
                last_tick: now,
                paused_at: None,
                paused_total: Duration::ZERO,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seconds since the previous tick; `0.0` while paused.
    pub fn tick(&self) -> f64 {
        let mut state = self.lock();
        if state.paused_at.is_some() {
            return 0.0;
        }
        let now = Instant::now();
        let dt = now.duration_since(state.last_tick).as_secs_f64();
        state.last_tick = now;
        dt
    }

    /// Current simulated time.
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed();
        self.sim_start + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }

    /// Simulated time elapsed since start, excluding pauses.
    pub fn elapsed(&self) -> Duration {
        let state = self.lock();
        let until = state.paused_at.unwrap_or_else(Instant::now);
        until
            .duration_since(state.started)
            .saturating_sub(state.paused_total)
    }

    pub fn pause(&self) {
        let mut state = self.lock();
        if state.paused_at.is_none() {
            state.paused_at = Some(Instant::now());
            tracing::info!("Simulation paused");
        }
    }

    /// Resume without counting the paused interval as a tick.
    pub fn resume(&self) {
        let mut state = self.lock();
        if let Some(paused_at) = state.paused_at.take() {
            let now = Instant::now();
            state.paused_total += now.duration_since(paused_at);
            state.last_tick = now;
            tracing::info!("Simulation resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_measures_elapsed() {
        let clock = SimClock::default();
        tokio::time::advance(Duration::from_millis(250)).await;
        assert!((clock.tick() - 0.25).abs() < 1e-6);
        assert_eq!(clock.tick(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_time() {
        let start = Utc::now();
        let clock = SimClock::new(start);
        tokio::time::advance(Duration::from_secs(2)).await;
        clock.pause();
        clock.pause();
        assert!(clock.is_paused());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.elapsed(), Duration::from_secs(2));

        clock.resume();
        assert!(!clock.is_paused());
        // paused interval is not handed out as dt
        assert_eq!(clock.tick(), 0.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!((clock.tick() - 1.0).abs() < 1e-6);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_without_pause_is_noop() {
        let clock = SimClock::default();
        tokio::time::advance(Duration::from_millis(500)).await;
        clock.resume();
        assert!((clock.tick() - 0.5).abs() < 1e-6);
    }
}
