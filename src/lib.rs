//! Frequency response area (FRA) analysis for multi-tone electrophysiology
//! recordings.
//!
//! A recording is a set of sampled channels plus a header listing the
//! `(frequency, level)` of every tone presentation. The pipeline cuts the
//! signal into stimulus-locked windows using a binary trigger channel,
//! measures the activity of each window, assembles a level x frequency
//! matrix and estimates best frequency and level threshold with five
//! independent strategies.
pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod recording;

pub use config::{load_config, save_config, AcquisitionConfig, Config, TriggerConfig};
pub use error::{ErrorCode, FraError};
pub use pipeline::{BatchReport, FraPipeline, RecordingReport, StrategyOutcome};
