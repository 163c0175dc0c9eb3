use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::error::{ErrorCode, FraError};
use crate::recording::segment::{GridCheck, Segmentation, Segmenter, StimulusResponse};
use crate::recording::source::RecordingStore;

/// One failed file and the reason it was set aside.
#[derive(Clone, Debug, Serialize)]
pub struct FileFailure {
    pub stem: String,
    pub channel: String,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ErrorRegistry {
    failures: Vec<FileFailure>,
}

impl ErrorRegistry {
    pub fn record(&mut self, stem: &str, channel: &str, error: &FraError) {
        self.failures.push(FileFailure {
            stem: stem.to_string(),
            channel: channel.to_string(),
            code: error.code(),
            message: error.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter()
    }

    pub fn code_for(&self, stem: &str) -> Option<ErrorCode> {
        self.failures
            .iter()
            .find(|failure| failure.stem == stem)
            .map(|failure| failure.code)
    }

    pub fn extend(&mut self, other: ErrorRegistry) {
        self.failures.extend(other.failures);
    }
}

/// A file that segmented; `flagged` when its stimulus grid failed validation.
#[derive(Clone, Debug)]
pub struct LoadedRecording {
    pub stem: String,
    pub grid: GridCheck,
    pub flagged: bool,
}

/// Merged windows of every file that segmented, keyed by `tone_id`.
#[derive(Debug, Default)]
pub struct Batch {
    pub channel: String,
    pub recordings: Vec<LoadedRecording>,
    pub responses: BTreeMap<String, StimulusResponse>,
    pub errors: ErrorRegistry,
}

impl Batch {
    /// Responses of one file in ordinal order.
    pub fn responses_for(&self, stem: &str) -> Vec<&StimulusResponse> {
        let prefix = format!("{stem}/");
        self.responses
            .range(prefix.clone()..)
            .take_while(|(tone_id, _)| tone_id.starts_with(&prefix))
            .map(|(_, response)| response)
            .collect()
    }

    pub fn is_flagged(&self, stem: &str) -> bool {
        self.recordings
            .iter()
            .any(|recording| recording.stem == stem && recording.flagged)
    }
}

pub struct BatchLoader<'a, S: RecordingStore> {
    store: &'a S,
    segmenter: Segmenter,
    trigger_channel: String,
    parallel: bool,
}

impl<'a, S: RecordingStore> BatchLoader<'a, S> {
    pub fn new(store: &'a S, config: &Config) -> Self {
        Self {
            store,
            segmenter: Segmenter::new(config.acquisition, config.trigger),
            trigger_channel: config.trigger_channel.clone(),
            parallel: config.parallel,
        }
    }

    fn load_one(&self, stem: &str, channel: &str) -> Result<Segmentation, FraError> {
        let (data, header) = self.store.open(stem)?;
        self.segmenter
            .segment(stem, &data, &header, channel, &self.trigger_channel)
    }

    /// Segment every stem; failures land in the registry, never abort the batch.
    pub fn load<T: AsRef<str> + Sync>(&self, stems: &[T], channel: &str) -> Batch {
        let outcomes: Vec<(&str, Result<Segmentation, FraError>)> = if self.parallel {
            stems
                .par_iter()
                .map(|stem| (stem.as_ref(), self.load_one(stem.as_ref(), channel)))
                .collect()
        } else {
            stems
                .iter()
                .map(|stem| (stem.as_ref(), self.load_one(stem.as_ref(), channel)))
                .collect()
        };

        let mut batch = Batch {
            channel: channel.to_string(),
            ..Default::default()
        };
        for (stem, outcome) in outcomes {
            match outcome {
                Ok(segmentation) => {
                    let flagged = !segmentation.grid.is_consistent();
                    if flagged {
                        let error = segmentation.grid.to_error();
                        warn!("{stem} [{channel}]: {error}");
                        batch.errors.record(stem, channel, &error);
                    }
                    info!(
                        "{stem} [{channel}]: {} responses",
                        segmentation.responses.len()
                    );
                    for response in segmentation.responses {
                        batch
                            .responses
                            .insert(response.tone_id().to_string(), response);
                    }
                    batch.recordings.push(LoadedRecording {
                        stem: stem.to_string(),
                        grid: segmentation.grid,
                        flagged,
                    });
                }
                Err(error) => {
                    warn!("{stem} [{channel}]: skipped, {error}");
                    batch.errors.record(stem, channel, &error);
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::segment::tests::pulse_train;
    use crate::recording::source::{DataResource, HeaderResource, MemoryStore};

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let tones = [(4_000.0, 60.0), (8_000.0, 60.0), (4_000.0, 40.0), (8_000.0, 40.0)];
        let onsets = [1_000, 4_000, 7_000, 10_000];
        store.insert(
            "A001",
            DataResource::from_channels([
                ("di0P", vec![0.5; 12_000]),
                ("di4P", pulse_train(12_000, &onsets, 50)),
            ]),
            HeaderResource::from_tones(&tones),
        );
        // one pulse lost
        store.insert(
            "A002",
            DataResource::from_channels([
                ("di0P", vec![0.5; 12_000]),
                ("di4P", pulse_train(12_000, &onsets[..3], 50)),
            ]),
            HeaderResource::from_tones(&tones),
        );
        // no trigger channel at all
        store.insert(
            "A003",
            DataResource::from_channels([("di0P", vec![0.5; 12_000])]),
            HeaderResource::from_tones(&tones),
        );
        // sparse grid
        store.insert(
            "A004",
            DataResource::from_channels([
                ("di0P", vec![0.5; 12_000]),
                ("di4P", pulse_train(12_000, &onsets[..2], 50)),
            ]),
            HeaderResource::from_tones(&tones[1..3]),
        );
        store
    }

    fn config(parallel: bool) -> Config {
        Config {
            parallel,
            ..Default::default()
        }
    }

    #[test]
    fn bad_files_are_isolated() {
        let store = store();
        let config = config(false);
        let batch = BatchLoader::new(&store, &config)
            .load(&["A001", "A002", "A003", "A004", "A005"], "di0P");

        assert_eq!(batch.recordings.len(), 2);
        assert_eq!(batch.responses_for("A001").len(), 4);
        assert_eq!(batch.responses_for("A004").len(), 2);
        assert!(batch.responses_for("A002").is_empty());
        assert_eq!(batch.errors.len(), 4);
        assert_eq!(batch.errors.code_for("A002"), Some(ErrorCode::ToneCountMismatch));
        assert_eq!(batch.errors.code_for("A003"), Some(ErrorCode::FormatError));
        assert_eq!(batch.errors.code_for("A004"), Some(ErrorCode::GridInconsistency));
        assert_eq!(batch.errors.code_for("A005"), Some(ErrorCode::ResourceUnavailable));
        assert!(batch.is_flagged("A004"));
        assert!(!batch.is_flagged("A001"));
    }

    #[test]
    fn parallel_and_serial_loads_agree() {
        let store = store();
        let stems = ["A004", "A001", "A002"];
        let serial = BatchLoader::new(&store, &config(false)).load(&stems, "di0P");
        let parallel = BatchLoader::new(&store, &config(true)).load(&stems, "di0P");

        let ids = |b: &Batch| b.responses.keys().cloned().collect::<Vec<_>>();
        assert_eq!(ids(&serial), ids(&parallel));
        let stems_of = |b: &Batch| b.recordings.iter().map(|r| r.stem.clone()).collect::<Vec<_>>();
        assert_eq!(stems_of(&serial), stems_of(&parallel));
        assert_eq!(serial.errors.len(), parallel.errors.len());
    }

    #[test]
    fn responses_for_does_not_bleed_into_longer_stems() {
        let mut store = MemoryStore::new();
        for stem in ["A1", "A10"] {
            store.insert(
                stem,
                DataResource::from_channels([
                    ("di0P", vec![0.0; 3_000]),
                    ("di4P", pulse_train(3_000, &[500], 10)),
                ]),
                HeaderResource::from_tones(&[(1_000.0, 20.0)]),
            );
        }
        let batch = BatchLoader::new(&store, &config(false)).load(&["A1", "A10"], "di0P");
        assert_eq!(batch.responses_for("A1").len(), 1);
        assert_eq!(batch.responses_for("A10").len(), 1);
    }
}
