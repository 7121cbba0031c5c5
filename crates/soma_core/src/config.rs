use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SomaConfig {
    pub llm: LlmConfig,
    pub simulation: SimulationConfig,
    pub personality: PersonalityConfig,
    pub gateway: GatewayConfig,
    pub identity: IdentityConfig,
}

impl SomaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SomaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SOMA_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("SOMA_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("SOMA_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SOMA_LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_TICK_MS") {
            if let Ok(n) = v.parse() {
                self.simulation.tick_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_MIN_CALL_SECS") {
            if let Ok(n) = v.parse() {
                self.simulation.min_call_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_SPONTANEOUS_SECS") {
            if let Ok(n) = v.parse() {
                self.simulation.spontaneous_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
                self.gateway.enabled = true;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "anthropic" or "mock"
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on a single generation call, including retries.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            base_url: None,
            max_tokens: 300,
            temperature: 0.9,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    /// Minimum wall time between any two generation calls.
    pub min_call_interval_secs: u64,
    /// Minimum wall time between spontaneous thoughts.
    pub spontaneous_interval_secs: u64,
    /// Ceiling on simulated seconds per biological tick.
    pub max_tick_secs: f64,
    /// Bounded input queue between the reader task and the tick task.
    pub input_capacity: usize,
    /// Controllability assumed for ambient stressors, `[0, 1]`.
    pub stressor_controllability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            min_call_interval_secs: 10,
            spontaneous_interval_secs: 60,
            max_tick_secs: 300.0,
            input_capacity: 16,
            stressor_controllability: 0.5,
        }
    }
}

/// Big Five trait levels, each `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersonalityConfig {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Outbound queue depth per connected listener; overflow is dropped.
    pub listener_queue: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 7878,
            listener_queue: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// First-person self description injected into the system prompt.
    pub self_narrative: String,
    pub traits: Vec<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SomaConfig::default();
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.simulation.tick_interval_ms, 100);
        assert_eq!(cfg.simulation.input_capacity, 16);
        assert_eq!(cfg.personality.neuroticism, 0.5);
        assert!(!cfg.gateway.enabled);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[llm]
provider = "mock"
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        // Defaults for unspecified fields
        assert_eq!(cfg.llm.max_tokens, 300);
        assert_eq!(cfg.simulation.spontaneous_interval_secs, 60);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[llm]
provider = "anthropic"
model = "claude-haiku-4-5"
base_url = "http://localhost:9000"
max_tokens = 512
temperature = 0.5
timeout_secs = 20

[simulation]
tick_interval_ms = 250
min_call_interval_secs = 30
spontaneous_interval_secs = 120
max_tick_secs = 60.0
input_capacity = 8
stressor_controllability = 0.2

[personality]
openness = 0.8
neuroticism = 0.9

[gateway]
enabled = true
port = 9000

[identity]
self_narrative = "I live alone in a cabin."
traits = ["stubborn", "curious"]
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.model, "claude-haiku-4-5");
        assert_eq!(cfg.llm.timeout_secs, 20);
        assert_eq!(cfg.simulation.tick_interval_ms, 250);
        assert_eq!(cfg.simulation.stressor_controllability, 0.2);
        assert_eq!(cfg.personality.openness, 0.8);
        assert_eq!(cfg.personality.agreeableness, 0.5);
        assert!(cfg.gateway.enabled);
        assert_eq!(cfg.gateway.host, "127.0.0.1");
        assert_eq!(cfg.identity.traits.len(), 2);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("SOMA_MODEL", "claude-opus-4-1");
        std::env::set_var("SOMA_TICK_MS", "50");

        let mut cfg = SomaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.llm.model, "claude-opus-4-1");
        assert_eq!(cfg.simulation.tick_interval_ms, 50);

        std::env::remove_var("SOMA_MODEL");
        std::env::remove_var("SOMA_TICK_MS");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = SomaConfig::load_or_default("/nonexistent/soma.toml");
        assert_eq!(cfg.simulation.tick_interval_ms, 100);
    }
}
