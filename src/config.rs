use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub jitter: JitterConfig,
    pub simulation: SimulationConfig,
}

/// Tuning of one jitter engine. All values are in stream time units
/// (milliseconds unless a clock divisor says otherwise).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JitterConfig {
    pub min_latency: i64,
    pub max_latency: i64,
    // retention horizon of the arrival statistics
    pub window: i64,
    pub tick_interval: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub packets: u32,
    pub ssrc: u32,
    pub initial_timestamp: u32,
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
    pub loss_rate: f64,
    pub seed: Option<u64>,
}

impl JitterConfig {
    pub fn new(min_latency: i64, max_latency: i64, window: i64, tick_interval: i64) -> Self {
        Self {
            min_latency,
            max_latency,
            window,
            tick_interval,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.tick_interval <= 0 {
            return Err(anyhow!("tick_interval must be positive: {}", self.tick_interval));
        }
        if self.window <= 0 {
            return Err(anyhow!("window must be positive: {}", self.window));
        }
        if self.min_latency < 0 || self.min_latency > self.max_latency {
            return Err(anyhow!(
                "latency bounds out of order: min {} max {}",
                self.min_latency,
                self.max_latency
            ));
        }
        Ok(())
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            min_latency: 200,
            max_latency: 400,
            window: 2000,
            tick_interval: 20,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            packets: 500,
            ssrc: 0x1234_5678,
            // close to the wrap so a default run crosses it
            initial_timestamp: u32::MAX - 2000,
            base_delay_ms: 30,
            jitter_ms: 60,
            loss_rate: 0.01,
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            log_file: None,
            jitter: JitterConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow!("{}: {}", e, path))?,
        )?;
        config
            .jitter
            .validate()
            .map_err(|e| anyhow!("{}: {}", path, e))?;
        Ok(config)
    }
}
