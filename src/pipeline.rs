use log::{info, warn};
use serde::Serialize;

use crate::analysis::characteristic::characteristic_frequency;
use crate::analysis::matrix::{activity_table, ActivityMatrix};
use crate::analysis::metric::ActivityMetric;
use crate::analysis::smoothing::{median_filter_3x3, FraProfiles};
use crate::analysis::tuning::{TuningEstimate, TuningInput, TuningStrategy};
use crate::config::Config;
use crate::error::{ErrorCode, FraError};
use crate::recording::batch::{BatchLoader, ErrorRegistry};
use crate::recording::segment::{GridCheck, StimulusResponse};
use crate::recording::source::RecordingStore;
use crate::recording::summary::RecordingSummary;

/// Result of one strategy on one recording; exactly one side is set.
#[derive(Clone, Debug, Serialize)]
pub struct StrategyOutcome {
    pub strategy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<TuningEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StrategyFailure>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StrategyFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl StrategyOutcome {
    fn from_result(strategy: &'static str, result: Result<TuningEstimate, FraError>) -> Self {
        match result {
            Ok(estimate) => Self {
                strategy,
                estimate: Some(estimate),
                error: None,
            },
            Err(error) => Self {
                strategy,
                estimate: None,
                error: Some(StrategyFailure {
                    code: error.code(),
                    message: error.to_string(),
                }),
            },
        }
    }
}

/// Everything derived from one recording on one channel.
#[derive(Clone, Debug, Serialize)]
pub struct RecordingReport {
    pub stem: String,
    pub channel: String,
    pub summary: Option<RecordingSummary>,
    /// Descending.
    pub levels: Vec<f64>,
    /// Ascending.
    pub frequencies: Vec<f64>,
    pub raw_matrix: Vec<Vec<f64>>,
    pub filtered_matrix: Vec<Vec<f64>>,
    pub activity_frequency: Vec<f64>,
    pub activity_level: Vec<f64>,
    pub strategies: Vec<StrategyOutcome>,
    pub characteristic_frequency: Option<f64>,
}

impl RecordingReport {
    pub fn outcome(&self, strategy: &str) -> Option<&StrategyOutcome> {
        self.strategies.iter().find(|o| o.strategy == strategy)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub recordings: Vec<RecordingReport>,
    pub failures: ErrorRegistry,
}

/// Runs load, segmentation, matrix assembly and every configured strategy
/// over a set of recordings.
pub struct FraPipeline<S: RecordingStore> {
    store: S,
    config: Config,
    metric: Box<dyn ActivityMetric>,
    strategies: Vec<Box<dyn TuningStrategy>>,
}

impl<S: RecordingStore> FraPipeline<S> {
    pub fn new(store: S, config: Config) -> Result<Self, FraError> {
        config.validate()?;
        let metric = config.metric.build();
        let strategies = config.strategies.iter().map(|kind| kind.build()).collect();
        Ok(Self {
            store,
            config,
            metric,
            strategies,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Never fails as a whole: per-file problems end up in `failures`.
    pub fn run<T: AsRef<str> + Sync>(&self, stems: &[T]) -> BatchReport {
        let loader = BatchLoader::new(&self.store, &self.config);
        let mut report = BatchReport::default();
        for channel in &self.config.signal_channels {
            let batch = loader.load(stems, channel);
            for recording in &batch.recordings {
                if recording.flagged {
                    info!("{} [{channel}]: flagged, tuning skipped", recording.stem);
                    continue;
                }
                let responses = batch.responses_for(&recording.stem);
                match self.analyse(&recording.stem, channel, &responses, &recording.grid) {
                    Ok(analysed) => report.recordings.push(analysed),
                    Err(error) => {
                        warn!("{} [{channel}]: {error}", recording.stem);
                        report.failures.record(&recording.stem, channel, &error);
                    }
                }
            }
            report.failures.extend(batch.errors);
        }
        info!(
            "{} recordings analysed, {} failures",
            report.recordings.len(),
            report.failures.len()
        );
        report
    }

    /// Matrix, smoothing, profiles and tuning for one segmented recording.
    pub fn analyse(
        &self,
        stem: &str,
        channel: &str,
        responses: &[&StimulusResponse],
        grid: &GridCheck,
    ) -> Result<RecordingReport, FraError> {
        let cells = activity_table(
            responses.iter().copied(),
            self.metric.as_ref(),
            &self.config.acquisition,
        )?;
        let matrix = ActivityMatrix::assemble(&cells);
        matrix.ensure_complete()?;

        let filtered = median_filter_3x3(&matrix.values);
        let profiles = FraProfiles::of(&filtered);
        let input = TuningInput {
            raw: &matrix.values,
            filtered: &filtered,
            profiles: &profiles,
            levels: &matrix.levels,
            frequencies: &matrix.frequencies,
        };

        let strategies = self
            .strategies
            .iter()
            .map(|strategy| {
                let result = strategy.estimate(&input);
                if let Err(error) = &result {
                    warn!("{stem} [{channel}]: {} failed, {error}", strategy.name());
                }
                StrategyOutcome::from_result(strategy.name(), result)
            })
            .collect();

        let characteristic_frequency = match characteristic_frequency(&cells) {
            Ok(cf) => Some(cf),
            Err(error) => {
                warn!("{stem} [{channel}]: characteristic frequency, {error}");
                None
            }
        };

        Ok(RecordingReport {
            stem: stem.to_string(),
            channel: channel.to_string(),
            summary: RecordingSummary::from_responses(responses.iter().copied(), grid),
            levels: matrix.levels.clone(),
            frequencies: matrix.frequencies.clone(),
            raw_matrix: matrix.to_rows(),
            filtered_matrix: filtered.rows().into_iter().map(|row| row.to_vec()).collect(),
            activity_frequency: profiles.activity_frequency.to_vec(),
            activity_level: profiles.activity_level.to_vec(),
            strategies,
            characteristic_frequency,
        })
    }
}
