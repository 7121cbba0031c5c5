//! Biological State Vector
//!
//! Twenty named continuous variables, each with a declared closed interval.
//! The vector itself has no behaviour beyond get/set/clamp; everything that
//! moves it lives in the processor.
//!
//! Units follow clinical convention where one exists (°C, bpm, mmHg, mg/dL, %),
//! everything else is a normalized level in `[0, 1]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Guard against NaN and Infinity in state values.
/// If the value is NaN or Inf, replace with the provided fallback (homeostatic default).
#[inline]
fn sanitize_f64(v: f64, fallback: f64, name: &str) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in {}, resetting to fallback {}", name, fallback);
        fallback
    }
}

/// Every variable of the biological state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    BodyTemp,
    HeartRate,
    BloodPressure,
    RespiratoryRate,
    Hunger,
    Thirst,
    Fatigue,
    Pain,
    MuscleTension,
    BloodSugar,
    Cortisol,
    Adrenaline,
    Serotonin,
    Dopamine,
    ImmuneResponse,
    CircadianPhase,
    Spo2,
    Hydration,
    Glycogen,
    Endorphins,
}

impl Variable {
    pub const ALL: [Variable; 20] = [
        Variable::BodyTemp,
        Variable::HeartRate,
        Variable::BloodPressure,
        Variable::RespiratoryRate,
        Variable::Hunger,
        Variable::Thirst,
        Variable::Fatigue,
        Variable::Pain,
        Variable::MuscleTension,
        Variable::BloodSugar,
        Variable::Cortisol,
        Variable::Adrenaline,
        Variable::Serotonin,
        Variable::Dopamine,
        Variable::ImmuneResponse,
        Variable::CircadianPhase,
        Variable::Spo2,
        Variable::Hydration,
        Variable::Glycogen,
        Variable::Endorphins,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variable::BodyTemp => "body_temp",
            Variable::HeartRate => "heart_rate",
            Variable::BloodPressure => "blood_pressure",
            Variable::RespiratoryRate => "respiratory_rate",
            Variable::Hunger => "hunger",
            Variable::Thirst => "thirst",
            Variable::Fatigue => "fatigue",
            Variable::Pain => "pain",
            Variable::MuscleTension => "muscle_tension",
            Variable::BloodSugar => "blood_sugar",
            Variable::Cortisol => "cortisol",
            Variable::Adrenaline => "adrenaline",
            Variable::Serotonin => "serotonin",
            Variable::Dopamine => "dopamine",
            Variable::ImmuneResponse => "immune_response",
            Variable::CircadianPhase => "circadian_phase",
            Variable::Spo2 => "spo2",
            Variable::Hydration => "hydration",
            Variable::Glycogen => "glycogen",
            Variable::Endorphins => "endorphins",
        }
    }

    /// Declared closed interval `(min, max)`.
    ///
    /// Circadian phase is the exception: it lives in `[0, 24)` and wraps
    /// instead of saturating.
    pub fn range(self) -> (f64, f64) {
        match self {
            Variable::BodyTemp => (25.0, 43.0),
            Variable::HeartRate => (30.0, 220.0),
            Variable::BloodPressure => (50.0, 220.0),
            Variable::RespiratoryRate => (4.0, 40.0),
            Variable::BloodSugar => (20.0, 400.0),
            Variable::CircadianPhase => (0.0, 24.0),
            Variable::Spo2 => (50.0, 100.0),
            _ => (0.0, 1.0),
        }
    }

    /// Resting value of a healthy adult at 08:00.
    pub fn default_value(self) -> f64 {
        match self {
            Variable::BodyTemp => 36.6,
            Variable::HeartRate => 70.0,
            Variable::BloodPressure => 120.0,
            Variable::RespiratoryRate => 15.0,
            Variable::Hunger
            | Variable::Thirst
            | Variable::Fatigue
            | Variable::Pain
            | Variable::MuscleTension
            | Variable::Adrenaline => 0.0,
            Variable::BloodSugar => 90.0,
            Variable::Cortisol => 0.1,
            Variable::Serotonin => 0.5,
            Variable::Dopamine => 0.3,
            Variable::ImmuneResponse => 0.1,
            Variable::CircadianPhase => 8.0,
            Variable::Spo2 => 98.0,
            Variable::Hydration => 0.8,
            Variable::Glycogen => 0.7,
            Variable::Endorphins => 0.1,
        }
    }

    /// Bring a raw value back into this variable's interval.
    /// Non-finite input falls back to the default value.
    pub fn clamp(self, v: f64) -> f64 {
        let v = sanitize_f64(v, self.default_value(), self.name());
        match self {
            Variable::CircadianPhase => wrap_phase(v),
            _ => {
                let (lo, hi) = self.range();
                v.clamp(lo, hi)
            }
        }
    }
}

/// Wrap an hour value into `[0, 24)`.
pub fn wrap_phase(hours: f64) -> f64 {
    let p = hours.rem_euclid(24.0);
    // rem_euclid can round up to exactly 24.0 for tiny negative inputs
    if p >= 24.0 {
        0.0
    } else {
        p
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown biological variable: {0:?}")]
pub struct ParseVariableError(pub String);

impl FromStr for Variable {
    type Err = ParseVariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| ParseVariableError(s.to_string()))
    }
}

/// Complete biological state of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiologicalState {
    pub body_temp: f64,
    pub heart_rate: f64,
    pub blood_pressure: f64,
    pub respiratory_rate: f64,
    pub hunger: f64,
    pub thirst: f64,
    pub fatigue: f64,
    pub pain: f64,
    pub muscle_tension: f64,
    pub blood_sugar: f64,
    pub cortisol: f64,
    pub adrenaline: f64,
    pub serotonin: f64,
    pub dopamine: f64,
    pub immune_response: f64,
    pub circadian_phase: f64,
    pub spo2: f64,
    pub hydration: f64,
    pub glycogen: f64,
    pub endorphins: f64,

    /// Time-integrated cortisol excess above the 0.3 floor (level·seconds).
    pub cortisol_load: f64,

    /// Simulation timestamp of the last completed tick
    pub last_update: DateTime<Utc>,
}

impl Default for BiologicalState {
    fn default() -> Self {
        Self::new_at(Utc::now())
    }
}

impl BiologicalState {
    /// Documented default state, last updated at `now`.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        let mut state = Self {
            body_temp: 0.0,
            heart_rate: 0.0,
            blood_pressure: 0.0,
            respiratory_rate: 0.0,
            hunger: 0.0,
            thirst: 0.0,
            fatigue: 0.0,
            pain: 0.0,
            muscle_tension: 0.0,
            blood_sugar: 0.0,
            cortisol: 0.0,
            adrenaline: 0.0,
            serotonin: 0.0,
            dopamine: 0.0,
            immune_response: 0.0,
            circadian_phase: 0.0,
            spo2: 0.0,
            hydration: 0.0,
            glycogen: 0.0,
            endorphins: 0.0,
            cortisol_load: 0.0,
            last_update: now,
        };
        for var in Variable::ALL {
            state.set(var, var.default_value());
        }
        state
    }

    pub fn get(&self, var: Variable) -> f64 {
        match var {
            Variable::BodyTemp => self.body_temp,
            Variable::HeartRate => self.heart_rate,
            Variable::BloodPressure => self.blood_pressure,
            Variable::RespiratoryRate => self.respiratory_rate,
            Variable::Hunger => self.hunger,
            Variable::Thirst => self.thirst,
            Variable::Fatigue => self.fatigue,
            Variable::Pain => self.pain,
            Variable::MuscleTension => self.muscle_tension,
            Variable::BloodSugar => self.blood_sugar,
            Variable::Cortisol => self.cortisol,
            Variable::Adrenaline => self.adrenaline,
            Variable::Serotonin => self.serotonin,
            Variable::Dopamine => self.dopamine,
            Variable::ImmuneResponse => self.immune_response,
            Variable::CircadianPhase => self.circadian_phase,
            Variable::Spo2 => self.spo2,
            Variable::Hydration => self.hydration,
            Variable::Glycogen => self.glycogen,
            Variable::Endorphins => self.endorphins,
        }
    }

    /// Raw setter. Does not clamp; see [`BiologicalState::clamp_all`].
    pub fn set(&mut self, var: Variable, value: f64) {
        let slot = match var {
            Variable::BodyTemp => &mut self.body_temp,
            Variable::HeartRate => &mut self.heart_rate,
            Variable::BloodPressure => &mut self.blood_pressure,
            Variable::RespiratoryRate => &mut self.respiratory_rate,
            Variable::Hunger => &mut self.hunger,
            Variable::Thirst => &mut self.thirst,
            Variable::Fatigue => &mut self.fatigue,
            Variable::Pain => &mut self.pain,
            Variable::MuscleTension => &mut self.muscle_tension,
            Variable::BloodSugar => &mut self.blood_sugar,
            Variable::Cortisol => &mut self.cortisol,
            Variable::Adrenaline => &mut self.adrenaline,
            Variable::Serotonin => &mut self.serotonin,
            Variable::Dopamine => &mut self.dopamine,
            Variable::ImmuneResponse => &mut self.immune_response,
            Variable::CircadianPhase => &mut self.circadian_phase,
            Variable::Spo2 => &mut self.spo2,
            Variable::Hydration => &mut self.hydration,
            Variable::Glycogen => &mut self.glycogen,
            Variable::Endorphins => &mut self.endorphins,
        };
        *slot = value;
    }

    /// Add `delta` to a variable without clamping.
    pub fn add(&mut self, var: Variable, delta: f64) {
        let current = self.get(var);
        self.set(var, current + delta);
    }

    /// Add `delta` and clamp the result into the variable's range.
    /// Returns the delta that actually landed.
    pub fn apply_clamped(&mut self, var: Variable, delta: f64) -> f64 {
        let before = self.get(var);
        let after = var.clamp(before + delta);
        self.set(var, after);
        after - before
    }

    /// Clamp every variable into its declared range, replacing non-finite
    /// values with defaults.
    pub fn clamp_all(&mut self) {
        for var in Variable::ALL {
            let v = self.get(var);
            self.set(var, var.clamp(v));
        }
        self.cortisol_load = sanitize_f64(self.cortisol_load, 0.0, "cortisol_load").max(0.0);
    }

    /// True when every variable is finite and inside its range.
    pub fn in_range(&self) -> bool {
        Variable::ALL.iter().all(|&var| {
            let v = self.get(var);
            let (lo, hi) = var.range();
            let upper_ok = if var == Variable::CircadianPhase { v < hi } else { v <= hi };
            v.is_finite() && v >= lo && upper_ok
        }) && self.cortisol_load.is_finite()
            && self.cortisol_load >= 0.0
    }
}
