use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::metric::MetricKind;
use crate::analysis::tuning::StrategyKind;
use crate::error::FraError;

/// Timing of the response window around each stimulus onset, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub pre_ms: f64,
    pub duration_ms: f64,
    pub post_ms: f64,
    pub sample_interval_ms: f64,
    pub trim_ms: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        // 10 kHz rig: 20 ms baseline, 50 ms tone, 100 ms tail.
        Self {
            pre_ms: 20.0,
            duration_ms: 50.0,
            post_ms: 100.0,
            sample_interval_ms: 0.1,
            trim_ms: 0.0,
        }
    }
}

impl AcquisitionConfig {
    pub fn validate(&self) -> Result<(), FraError> {
        if !(self.sample_interval_ms > 0.0) {
            return Err(FraError::Config(format!(
                "sample interval must be positive, got {} ms",
                self.sample_interval_ms
            )));
        }
        for (name, value) in [
            ("pre_ms", self.pre_ms),
            ("duration_ms", self.duration_ms),
            ("post_ms", self.post_ms),
            ("trim_ms", self.trim_ms),
        ] {
            if !(value >= 0.0) {
                return Err(FraError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.window_len() == 0 {
            return Err(FraError::Config(format!(
                "trim of {} ms leaves an empty response window",
                self.trim_ms
            )));
        }
        let (start, end) = self.stimulus_window();
        if start >= end || end >= self.window_len() {
            return Err(FraError::Config(format!(
                "stimulus window [{start}, {end}) does not fit a {}-sample response window",
                self.window_len()
            )));
        }
        Ok(())
    }

    pub fn ms_to_samples(&self, ms: f64) -> usize {
        (ms / self.sample_interval_ms).round().max(0.0) as usize
    }

    pub fn pre_samples(&self) -> usize {
        self.ms_to_samples(self.pre_ms)
    }

    pub fn duration_samples(&self) -> usize {
        self.ms_to_samples(self.duration_ms)
    }

    /// Fixed length of every response window.
    pub fn window_len(&self) -> usize {
        let span = self.pre_ms + self.duration_ms + self.post_ms - self.trim_ms;
        if span <= 0.0 {
            return 0;
        }
        self.ms_to_samples(span)
    }

    /// Sub-window covering the tone itself, relative to the window start.
    pub fn stimulus_window(&self) -> (usize, usize) {
        let start = self.pre_samples();
        (start, start + self.duration_samples())
    }
}

/// Tolerances for turning the trigger channel into onsets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub threshold: f64,
    /// Active samples closer than this to the previous active sample are chatter.
    pub min_onset_gap: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_onset_gap: 300,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub acquisition: AcquisitionConfig,
    pub trigger: TriggerConfig,
    pub signal_channels: Vec<String>,
    pub trigger_channel: String,
    pub metric: MetricKind,
    pub strategies: Vec<StrategyKind>,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            trigger: TriggerConfig::default(),
            signal_channels: vec!["di0P".into(), "di2P".into()],
            trigger_channel: "di4P".into(),
            metric: MetricKind::BaselineVariance,
            strategies: StrategyKind::all().to_vec(),
            parallel: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), FraError> {
        self.acquisition.validate()?;
        if self.signal_channels.is_empty() {
            return Err(FraError::Config("no signal channel selected".into()));
        }
        if self.trigger_channel.is_empty() {
            return Err(FraError::Config("trigger channel is empty".into()));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, FraError> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| {
        FraError::Config(format!(
            "failed to read {}: {e}",
            path.as_ref().display()
        ))
    })?;
    let config: Config = serde_json::from_str(&text)
        .map_err(|e| FraError::Config(format!("failed to parse config: {e}")))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), FraError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| FraError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path.as_ref(), json).map_err(|e| {
        FraError::Config(format!(
            "failed to write {}: {e}",
            path.as_ref().display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_rig() {
        let acq = AcquisitionConfig::default();
        assert_eq!(acq.pre_samples(), 200);
        assert_eq!(acq.duration_samples(), 500);
        assert_eq!(acq.window_len(), 1700);
        assert_eq!(acq.stimulus_window(), (200, 700));
        assert!(acq.validate().is_ok());
    }

    #[test]
    fn trim_shortens_window() {
        let acq = AcquisitionConfig {
            trim_ms: 50.0,
            ..Default::default()
        };
        assert_eq!(acq.window_len(), 1200);
    }

    #[test]
    fn rejects_bad_timing() {
        let zero_dt = AcquisitionConfig {
            sample_interval_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(zero_dt.validate(), Err(FraError::Config(_))));

        let over_trim = AcquisitionConfig {
            trim_ms: 500.0,
            ..Default::default()
        };
        assert!(matches!(over_trim.validate(), Err(FraError::Config(_))));
    }

    #[test]
    fn rejects_window_without_room_for_the_tone() {
        let no_tail = AcquisitionConfig {
            post_ms: 0.0,
            ..Default::default()
        };
        assert_eq!(no_tail.window_len(), 700);
        assert!(matches!(no_tail.validate(), Err(FraError::Config(_))));

        // trim reaches back into the tone itself
        let deep_trim = AcquisitionConfig {
            trim_ms: 120.0,
            ..Default::default()
        };
        assert!(matches!(deep_trim.validate(), Err(FraError::Config(_))));

        let silent = AcquisitionConfig {
            duration_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(silent.validate(), Err(FraError::Config(_))));

        let short_tail = AcquisitionConfig {
            post_ms: 1.0,
            ..Default::default()
        };
        assert!(short_tail.validate().is_ok());
    }

    #[test]
    fn empty_json_is_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.acquisition, AcquisitionConfig::default());
        assert_eq!(config.trigger_channel, "di4P");
        assert_eq!(config.strategies.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("fra-config-{}.json", std::process::id()));
        let config = Config {
            parallel: false,
            metric: MetricKind::PeakToPeak,
            ..Default::default()
        };
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(!loaded.parallel);
        assert_eq!(loaded.metric, MetricKind::PeakToPeak);
    }
}
